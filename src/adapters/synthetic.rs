//! Synthetic demographics: Implementation of DemographicSource.
//!
//! Fills the fields claims extracts do not carry with draws from a declared
//! policy:
//! - age uniform in [30, 85]
//! - gender uniform over male/female
//! - therapy line 1 (60%), 2 (30%) or 3 (10%)
//! - months on current therapy uniform in [0, 24]
//! - a fixed specialty and a provider drawn from a fixed roster
//!
//! Intended for demonstrations only. Replace it with a source that reads
//! real columns before drawing any clinical conclusion.

use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::domain::{Demographics, Gender};
use crate::ports::DemographicSource;

/// Cumulative probabilities for therapy lines 1 and 2; the rest is line 3.
const THERAPY_LINE_CUTOFFS: [f64; 2] = [0.6, 0.9];

/// Synthetic demographic generator.
#[derive(Debug, Clone)]
pub struct SyntheticDemographics {
    specialty: String,

    /// (provider name, provider id)
    providers: Vec<(String, String)>,
}

impl Default for SyntheticDemographics {
    fn default() -> Self {
        Self {
            specialty: "Oncology".to_string(),
            providers: [
                ("Dr. Amara Okafor", "NPI-1043921"),
                ("Dr. Lena Fischer", "NPI-1187730"),
                ("Dr. Rahul Menon", "NPI-1265014"),
                ("Dr. Grace Liu", "NPI-1390448"),
                ("Dr. Tomas Silva", "NPI-1452296"),
            ]
            .iter()
            .map(|(name, id)| ((*name).to_string(), (*id).to_string()))
            .collect(),
        }
    }
}

impl SyntheticDemographics {
    /// Generator with a custom specialty and provider roster.
    ///
    /// An empty roster yields an "Unassigned" provider.
    #[must_use]
    pub fn with_roster(specialty: impl Into<String>, providers: Vec<(String, String)>) -> Self {
        Self {
            specialty: specialty.into(),
            providers,
        }
    }
}

impl DemographicSource for SyntheticDemographics {
    fn demographics(&self, _row_index: usize, _cells: &[String], rng: &mut dyn RngCore) -> Demographics {
        let age = rng.gen_range(30..=85);
        let gender = if rng.gen_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };

        let draw: f64 = rng.gen();
        let current_therapy_line = if draw < THERAPY_LINE_CUTOFFS[0] {
            1
        } else if draw < THERAPY_LINE_CUTOFFS[1] {
            2
        } else {
            3
        };

        let months_on_current_therapy = rng.gen_range(0..=24);

        let (provider_name, provider_id) = self
            .providers
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| ("Unassigned".to_string(), "NPI-0000000".to_string()));

        Demographics {
            age,
            gender,
            current_therapy_line,
            months_on_current_therapy,
            specialty: self.specialty.clone(),
            provider_name,
            provider_id,
        }
    }
}
