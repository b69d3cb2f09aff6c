//! Outcome labeler port.

use rand::RngCore;

use crate::domain::Subject;

/// Trait for attaching an observed outcome to a scored subject.
///
/// The bundled implementation simulates outcomes from the score itself,
/// which is only meaningful for demonstrations. Production deployments
/// should provide a labeler backed by independently observed outcomes.
pub trait OutcomeLabeler: Send + Sync {
    /// Outcome for a subject that has a risk score, or `None` if unknown.
    fn label(&self, subject: &Subject, rng: &mut dyn RngCore) -> Option<bool>;
}
