//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! ingestion, cohort construction, risk inference and validation.

pub mod analyst;
pub mod cohort;
pub mod ground_truth;
pub mod inference;
pub mod metrics;
pub mod normalize;
pub mod ontology;
pub mod pipeline;
pub mod schema;
pub mod scoring;
pub mod strategy;
pub mod summary;

pub use analyst::AnalystService;
pub use cohort::{split_cohort, CohortSplit};
pub use ground_truth::SimulatedOutcomes;
pub use inference::{Classification, InferenceMode, RiskInferenceService};
pub use metrics::compute_metrics;
pub use normalize::{Ingestion, RecordNormalizer};
pub use ontology::OntologyService;
pub use pipeline::{Pipeline, PipelineReport};
pub use schema::{resolve_columns, ColumnMapping, SchemaError};
pub use scoring::EngineRiskScorer;
pub use strategy::{strategy_for, ModelStrategy};
pub use summary::{summarize, CohortSummary};
