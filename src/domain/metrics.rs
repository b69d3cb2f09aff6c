//! Validation metric types.

use serde::{Deserialize, Serialize};

/// Confusion-matrix counts and derived rates over the TEST partition.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    #[serde(rename = "fn")]
    pub fn_: usize,
}

impl ValidationMetrics {
    /// Derive rates from confusion counts. All rates are 0 when undefined.
    #[must_use]
    pub fn from_counts(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        let total = tp + fp + tn + fn_;
        let ratio = |num: usize, den: usize| {
            if den == 0 {
                0.0
            } else {
                num as f64 / den as f64
            }
        };

        Self {
            accuracy: ratio(tp + tn, total),
            precision: ratio(tp, tp + fp),
            recall: ratio(tp, tp + fn_),
            tp,
            fp,
            tn,
            fn_,
        }
    }

    /// Number of subjects evaluated.
    #[must_use]
    pub fn evaluated(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Harmonic mean of precision and recall (0 when both are 0).
    #[must_use]
    pub fn f1(&self) -> f64 {
        let denom = self.precision + self.recall;
        if denom > 0.0 {
            2.0 * self.precision * self.recall / denom
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counts_yield_zero_rates() {
        let m = ValidationMetrics::from_counts(0, 0, 0, 0);
        assert_eq!(m, ValidationMetrics::default());
        assert_eq!(m.f1(), 0.0);
    }

    #[test]
    fn test_rates() {
        let m = ValidationMetrics::from_counts(3, 1, 4, 2);
        assert!((m.accuracy - 0.7).abs() < 1e-12);
        assert!((m.precision - 0.75).abs() < 1e-12);
        assert!((m.recall - 0.6).abs() < 1e-12);
        assert_eq!(m.evaluated(), 10);
    }

    #[test]
    fn test_serializes_fn_field_name() {
        let json = serde_json::to_value(ValidationMetrics::from_counts(1, 1, 1, 1)).expect("Should serialize");
        assert_eq!(json["fn"], 1);
    }
}
