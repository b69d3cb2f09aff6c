//! Disease ontology context derived from a free-text research query.

use serde::{Deserialize, Serialize};

/// Structured disease/code/drug context for a study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyMapping {
    pub disease_name: String,

    /// ICD-10 codes; trailing `*` wildcards allowed (e.g. `C50.*`)
    #[serde(default)]
    pub icd_codes: Vec<String>,

    #[serde(default)]
    pub cpt_codes: Vec<String>,

    #[serde(default)]
    pub drugs: Vec<String>,

    /// Target therapy line transition, e.g. "1L to 2L"
    pub target_line_transition: String,
}

impl OntologyMapping {
    /// The mapping used whenever resolution fails.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            disease_name: "Unknown".to_string(),
            icd_codes: Vec::new(),
            cpt_codes: Vec::new(),
            drugs: Vec::new(),
            target_line_transition: "1L to 2L".to_string(),
        }
    }

    /// Parse the `(from, to)` line numbers out of `target_line_transition`.
    ///
    /// Returns `None` if the text is not shaped like `"<n>L to <m>L"`.
    #[must_use]
    pub fn line_transition(&self) -> Option<(u32, u32)> {
        let (from, to) = self.target_line_transition.split_once(" to ")?;
        let parse = |s: &str| {
            s.trim()
                .strip_suffix(['L', 'l'])
                .and_then(|n| n.trim().parse::<u32>().ok())
        };
        Some((parse(from)?, parse(to)?))
    }

    /// Whether a diagnosis code falls under this ontology's ICD codes.
    ///
    /// An empty code list matches nothing.
    #[must_use]
    pub fn covers_diagnosis(&self, code: &str) -> bool {
        let code = code.trim().to_ascii_uppercase();
        self.icd_codes.iter().any(|pattern| {
            let pattern = pattern.trim().to_ascii_uppercase();
            match pattern.strip_suffix('*') {
                Some(prefix) => code.starts_with(prefix),
                None => code == pattern,
            }
        })
    }
}

impl Default for OntologyMapping {
    fn default() -> Self {
        Self::unknown()
    }
}
