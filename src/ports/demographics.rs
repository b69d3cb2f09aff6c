//! Demographic source port.
//!
//! Claims extracts rarely carry age, gender, therapy line or provider. The
//! normalizer asks this port for them so a deployment with real fields can
//! replace the synthetic generator.

use rand::RngCore;

use crate::domain::Demographics;

/// Trait for supplying demographic/treatment fields for a raw row.
pub trait DemographicSource: Send + Sync {
    /// Produce demographics for the data row at `row_index`.
    ///
    /// `cells` is the split row, so implementations backed by real columns
    /// can read from it.
    fn demographics(&self, row_index: usize, cells: &[String], rng: &mut dyn RngCore) -> Demographics;
}
