//! Cohort risk summary: aggregate statistics over a classified cohort.

use serde::Serialize;

use crate::domain::{RiskCategory, Split, Subject};

/// Aggregate counts and per-bucket mean scores.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortSummary {
    pub total: usize,
    pub train: usize,
    pub test: usize,

    /// Subjects without a split (ineligible)
    pub unassigned: usize,

    pub high: usize,
    pub medium: usize,
    pub low: usize,

    pub mean_score_high: f64,
    pub mean_score_medium: f64,
    pub mean_score_low: f64,

    /// Share of labelled subjects with a positive outcome
    pub observed_positive_rate: f64,
}

#[derive(Default)]
struct Bucket {
    count: usize,
    score_sum: f64,
}

impl Bucket {
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.score_sum / self.count as f64
        }
    }
}

/// Summarize a cohort. Empty buckets report a mean of 0.
#[must_use]
pub fn summarize(subjects: &[Subject]) -> CohortSummary {
    let mut summary = CohortSummary {
        total: subjects.len(),
        ..Default::default()
    };
    let (mut high, mut medium, mut low) = (Bucket::default(), Bucket::default(), Bucket::default());
    let (mut labelled, mut positive) = (0usize, 0usize);

    for subject in subjects {
        match subject.split {
            Some(Split::Train) => summary.train += 1,
            Some(Split::Test) => summary.test += 1,
            None => summary.unassigned += 1,
        }

        if let (Some(category), Some(score)) = (subject.risk_category, subject.risk_score) {
            let bucket = match category {
                RiskCategory::High => &mut high,
                RiskCategory::Medium => &mut medium,
                RiskCategory::Low => &mut low,
            };
            bucket.count += 1;
            bucket.score_sum += score;
        }

        if let Some(outcome) = subject.actual_outcome {
            labelled += 1;
            positive += usize::from(outcome);
        }
    }

    summary.high = high.count;
    summary.medium = medium.count;
    summary.low = low.count;
    summary.mean_score_high = high.mean();
    summary.mean_score_medium = medium.mean();
    summary.mean_score_low = low.mean();
    summary.observed_positive_rate = if labelled > 0 {
        positive as f64 / labelled as f64
    } else {
        0.0
    };

    summary
}
