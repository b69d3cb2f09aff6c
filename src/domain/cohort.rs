//! Cohort configuration.

use serde::{Deserialize, Serialize};

/// How the risk scorer is asked to reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    /// Guideline-based clinical reasoning
    ReasoningEngine,
    /// Decision-tree style reasoning imitating a gradient-boosted ensemble
    TreeEnsembleSimulated,
}

/// Class-imbalance posture for tree-ensemble scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImbalanceStrategy {
    None,
    ClassWeights,
    Smote,
}

/// Bounds for the TEST share of eligible subjects.
pub const MIN_TRAIN_TEST_SPLIT: f64 = 0.1;
pub const MAX_TRAIN_TEST_SPLIT: f64 = 0.5;

/// Tunable parameters for a cohort run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CohortConfig {
    pub lookback_months: u32,
    pub prediction_window_months: u32,
    pub min_claims_count: u32,
    pub model_type: ModelType,
    pub imbalance_strategy: ImbalanceStrategy,

    /// Fraction of eligible subjects assigned to TEST, in [0.1, 0.5]
    pub train_test_split: f64,
}

impl Default for CohortConfig {
    fn default() -> Self {
        Self {
            lookback_months: 12,
            prediction_window_months: 6,
            min_claims_count: 3,
            model_type: ModelType::TreeEnsembleSimulated,
            imbalance_strategy: ImbalanceStrategy::ClassWeights,
            train_test_split: 0.2,
        }
    }
}

fn parse_positive_u32(name: &str) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|&v| v > 0)
}

impl CohortConfig {
    /// Load config overrides from environment (best-effort).
    ///
    /// Supported:
    /// - COHORTLENS_LOOKBACK_MONTHS
    /// - COHORTLENS_PREDICTION_WINDOW_MONTHS
    /// - COHORTLENS_MIN_CLAIMS
    /// - COHORTLENS_MODEL_TYPE="reasoning" | "tree"
    /// - COHORTLENS_IMBALANCE="none" | "class_weights" | "smote"
    /// - COHORTLENS_TRAIN_TEST_SPLIT
    ///
    /// Unparseable or out-of-range values are ignored.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = parse_positive_u32("COHORTLENS_LOOKBACK_MONTHS") {
            cfg.lookback_months = v;
        }
        if let Some(v) = parse_positive_u32("COHORTLENS_PREDICTION_WINDOW_MONTHS") {
            cfg.prediction_window_months = v;
        }
        if let Ok(v) = std::env::var("COHORTLENS_MIN_CLAIMS") {
            if let Ok(x) = v.trim().parse::<u32>() {
                cfg.min_claims_count = x;
            }
        }

        if let Ok(v) = std::env::var("COHORTLENS_MODEL_TYPE") {
            match v.trim().to_ascii_lowercase().as_str() {
                "reasoning" | "reasoning_engine" => cfg.model_type = ModelType::ReasoningEngine,
                "tree" | "tree_ensemble" | "xgboost" => {
                    cfg.model_type = ModelType::TreeEnsembleSimulated;
                }
                other => tracing::warn!("Ignoring unknown COHORTLENS_MODEL_TYPE={other}"),
            }
        }

        if let Ok(v) = std::env::var("COHORTLENS_IMBALANCE") {
            match v.trim().to_ascii_lowercase().as_str() {
                "none" => cfg.imbalance_strategy = ImbalanceStrategy::None,
                "class_weights" | "weights" => {
                    cfg.imbalance_strategy = ImbalanceStrategy::ClassWeights;
                }
                "smote" => cfg.imbalance_strategy = ImbalanceStrategy::Smote,
                other => tracing::warn!("Ignoring unknown COHORTLENS_IMBALANCE={other}"),
            }
        }

        if let Ok(v) = std::env::var("COHORTLENS_TRAIN_TEST_SPLIT") {
            if let Ok(x) = v.trim().parse::<f64>() {
                if (MIN_TRAIN_TEST_SPLIT..=MAX_TRAIN_TEST_SPLIT).contains(&x) {
                    cfg.train_test_split = x;
                }
            }
        }

        cfg
    }

    /// Validate that all parameters are within their allowed ranges.
    ///
    /// # Errors
    /// Returns every violation as a message.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.lookback_months == 0 {
            errors.push("Lookback months must be > 0".to_string());
        }
        if self.prediction_window_months == 0 {
            errors.push("Prediction window months must be > 0".to_string());
        }
        if !self.train_test_split.is_finite()
            || !(MIN_TRAIN_TEST_SPLIT..=MAX_TRAIN_TEST_SPLIT).contains(&self.train_test_split)
        {
            errors.push(format!(
                "Train/test split {} out of range [{MIN_TRAIN_TEST_SPLIT}, {MAX_TRAIN_TEST_SPLIT}]",
                self.train_test_split
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The TEST share, clamped into the allowed range.
    #[must_use]
    pub fn effective_test_share(&self) -> f64 {
        if self.train_test_split.is_finite() {
            self.train_test_split
                .clamp(MIN_TRAIN_TEST_SPLIT, MAX_TRAIN_TEST_SPLIT)
        } else {
            MIN_TRAIN_TEST_SPLIT
        }
    }
}
