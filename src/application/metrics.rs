//! Validation metrics over the TEST partition.

use crate::domain::{Split, Subject, ValidationMetrics};

/// Scores strictly above this count as a positive prediction.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Confusion-matrix metrics over subjects with `split == TEST`.
///
/// A missing score predicts negative; a missing outcome counts as negative.
/// An empty TEST set yields all-zero metrics.
#[must_use]
pub fn compute_metrics(subjects: &[Subject]) -> ValidationMetrics {
    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);

    for subject in subjects.iter().filter(|s| s.split == Some(Split::Test)) {
        let predicted = subject.risk_score.unwrap_or(0.0) > DECISION_THRESHOLD;
        let actual = subject.actual_outcome.unwrap_or(false);

        match (predicted, actual) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let metrics = ValidationMetrics::from_counts(tp, fp, tn, fn_);
    tracing::debug!(
        "Validation over {} TEST subject(s): accuracy={:.3}, precision={:.3}, recall={:.3}",
        metrics.evaluated(),
        metrics.accuracy,
        metrics.precision,
        metrics.recall
    );
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_subject;

    fn labelled(id: &str, score: f64, outcome: bool, split: Split) -> Subject {
        let mut subject = sample_subject(id, 3).with_score(score).with_split(split);
        subject.actual_outcome = Some(outcome);
        subject
    }

    #[test]
    fn test_balanced_confusion_matrix() {
        let subjects = vec![
            labelled("a", 0.8, true, Split::Test),
            labelled("b", 0.3, false, Split::Test),
            labelled("c", 0.9, false, Split::Test),
            labelled("d", 0.2, true, Split::Test),
        ];
        let m = compute_metrics(&subjects);

        assert_eq!((m.tp, m.fp, m.tn, m.fn_), (1, 1, 1, 1));
        assert!((m.accuracy - 0.5).abs() < f64::EPSILON);
        assert!((m.precision - 0.5).abs() < f64::EPSILON);
        assert!((m.recall - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_train_subjects_ignored() {
        let subjects = vec![
            labelled("a", 0.8, true, Split::Test),
            labelled("b", 0.9, false, Split::Train),
            labelled("c", 0.1, true, Split::Train),
        ];
        let m = compute_metrics(&subjects);
        assert_eq!(m.evaluated(), 1);
        assert_eq!(m.tp, 1);
        assert!((m.accuracy - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = compute_metrics(&[labelled("a", 0.5, true, Split::Test)]);
        assert_eq!(m.fn_, 1);
        assert_eq!(m.tp, 0);
    }

    #[test]
    fn test_empty_and_no_test_split() {
        assert_eq!(compute_metrics(&[]), ValidationMetrics::default());

        let train_only = vec![labelled("a", 0.8, true, Split::Train)];
        assert_eq!(compute_metrics(&train_only), ValidationMetrics::default());
    }

    #[test]
    fn test_no_positive_predictions_guard() {
        let subjects = vec![
            labelled("a", 0.1, true, Split::Test),
            labelled("b", 0.2, false, Split::Test),
        ];
        let m = compute_metrics(&subjects);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert!((m.accuracy - 0.5).abs() < f64::EPSILON);
    }
}
