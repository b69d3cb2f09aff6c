//! Ground-truth simulator (demonstration only).
//!
//! Draws each outcome as a Bernoulli trial with success probability equal to
//! the subject's own risk score. Validation metrics computed over these
//! labels measure the noise process, not model quality. Use an
//! [`OutcomeLabeler`] backed by independently observed outcomes for any
//! real evaluation.

use rand::{Rng, RngCore};

use crate::domain::Subject;
use crate::ports::OutcomeLabeler;

/// Bernoulli draw with `P(true) = score`. Non-finite scores never succeed.
pub fn simulate_outcome<R: Rng + ?Sized>(score: f64, rng: &mut R) -> bool {
    if !score.is_finite() {
        return false;
    }
    rng.gen::<f64>() < score.clamp(0.0, 1.0)
}

/// Outcome labeler that simulates outcomes from the risk score.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedOutcomes;

impl OutcomeLabeler for SimulatedOutcomes {
    fn label(&self, subject: &Subject, rng: &mut dyn RngCore) -> Option<bool> {
        subject.risk_score.map(|score| simulate_outcome(score, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample_subject;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_degenerate_probabilities() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert!(!simulate_outcome(0.0, &mut rng));
            assert!(simulate_outcome(1.0, &mut rng));
            assert!(!simulate_outcome(f64::NAN, &mut rng));
        }
    }

    #[test]
    fn test_rate_tracks_score() {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let hits = (0..10_000).filter(|_| simulate_outcome(0.3, &mut rng)).count();
        let rate = hits as f64 / 10_000.0;
        assert!((rate - 0.3).abs() < 0.03, "rate {rate}");
    }

    #[test]
    fn test_labeler_skips_unscored_subjects() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let unscored = sample_subject("a", 3);
        assert_eq!(SimulatedOutcomes.label(&unscored, &mut rng), None);

        let certain = unscored.with_score(1.0);
        assert_eq!(SimulatedOutcomes.label(&certain, &mut rng), Some(true));
    }
}
