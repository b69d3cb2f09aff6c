//! Risk categorization.
//!
//! The category is a pure function of the score so the two can never drift.

use serde::{Deserialize, Serialize};

/// Scores strictly above this are `High`.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Scores strictly above this (and at most `HIGH_RISK_THRESHOLD`) are `Medium`.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Risk bucket for a scored subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    /// Score ≤ 0.4
    Low,
    /// 0.4 < score ≤ 0.7
    Medium,
    /// Score > 0.7
    High,
}

impl RiskCategory {
    /// Categorize a risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            Self::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - line transition unlikely in window",
            Self::Medium => "Medium risk - monitor for progression",
            Self::High => "High risk - line transition likely in window",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_score() {
        assert_eq!(RiskCategory::from_score(0.05), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.55), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(0.95), RiskCategory::High);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(RiskCategory::from_score(0.7), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(0.4), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(0.700_001), RiskCategory::High);
        assert_eq!(RiskCategory::from_score(0.400_001), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_score(0.0), RiskCategory::Low);
        assert_eq!(RiskCategory::from_score(1.0), RiskCategory::High);
    }
}
