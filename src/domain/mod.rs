//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. All types are serializable; configuration
//! types implement strict validation.

mod cohort;
mod keywords;
mod metrics;
mod ontology;
mod risk;
mod subject;

pub use cohort::{
    CohortConfig, ImbalanceStrategy, ModelType, MAX_TRAIN_TEST_SPLIT, MIN_TRAIN_TEST_SPLIT,
};
pub use keywords::{CanonicalField, ColumnKeywords};
pub use metrics::ValidationMetrics;
pub use ontology::OntologyMapping;
pub use risk::{RiskCategory, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};
pub use subject::{Demographics, FeatureTuple, Gender, Split, Subject, MIN_MONTHS_ON_THERAPY};

#[cfg(test)]
pub(crate) use subject::sample_subject;
