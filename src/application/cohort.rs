//! Cohort split & eligibility.
//!
//! Eligible subjects are shuffled with the caller's random source and cut
//! at `floor(N * (1 - test_share))`: the head is TRAIN, the tail TEST.
//! Ineligible subjects never receive a split.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{CohortConfig, Split, Subject};

/// Result of partitioning a cohort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortSplit {
    /// Shuffled eligible subjects, each with a split assigned
    pub eligible: Vec<Subject>,

    /// Subjects failing the eligibility gate, in input order
    pub ineligible: Vec<Subject>,

    /// First TEST index within `eligible`
    pub split_index: usize,
}

impl CohortSplit {
    pub fn train(&self) -> &[Subject] {
        &self.eligible[..self.split_index]
    }

    pub fn test(&self) -> &[Subject] {
        &self.eligible[self.split_index..]
    }
}

/// Index at which TEST begins for `n` eligible subjects.
#[must_use]
pub fn split_index(n: usize, test_share: f64) -> usize {
    ((n as f64) * (1.0 - test_share)).floor() as usize
}

/// Filter, shuffle and partition subjects into TRAIN/TEST.
///
/// The input slice is left untouched.
pub fn split_cohort<R: Rng>(subjects: &[Subject], config: &CohortConfig, rng: &mut R) -> CohortSplit {
    if let Err(errors) = config.validate() {
        tracing::warn!("Cohort config out of range, clamping: {}", errors.join("; "));
    }
    let test_share = config.effective_test_share();

    let (mut eligible, ineligible): (Vec<Subject>, Vec<Subject>) =
        subjects.iter().cloned().partition(Subject::is_eligible);

    eligible.shuffle(rng);

    let split_index = split_index(eligible.len(), test_share).min(eligible.len());
    let eligible = eligible
        .iter()
        .enumerate()
        .map(|(i, s)| s.with_split(if i < split_index { Split::Train } else { Split::Test }))
        .collect::<Vec<_>>();

    tracing::info!(
        "Cohort split: {} eligible ({} train / {} test), {} ineligible",
        eligible.len(),
        split_index,
        eligible.len() - split_index,
        ineligible.len()
    );

    CohortSplit {
        eligible,
        ineligible,
        split_index,
    }
}
