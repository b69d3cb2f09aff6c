//! Risk scorer port: Trait for batch risk scoring.
//!
//! The inference service only depends on this trait, so a trained
//! classifier can replace the prompted engine without touching it.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureTuple, ModelType};

use super::EngineError;

/// Everything a scorer needs to score one bounded batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringRequest {
    pub disease_name: String,
    pub target_line_transition: String,
    pub lookback_months: u32,
    pub prediction_window_months: u32,
    pub min_claims_count: u32,
    pub model_type: ModelType,

    /// Reasoning instructions produced by the selected model strategy
    pub strategy_script: String,

    pub subjects: Vec<FeatureTuple>,
}

/// One scored entry of a batch response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub id: String,
    pub risk_score: f64,
}

/// Trait for batch risk scoring.
pub trait RiskScorer: Send + Sync {
    /// Score a batch. The result may omit subjects; it must not contain
    /// scores outside [0, 1].
    ///
    /// # Errors
    /// Returns `EngineError` if the batch as a whole could not be scored.
    fn score_batch(&self, request: &ScoringRequest) -> Result<Vec<SubjectScore>, EngineError>;
}
