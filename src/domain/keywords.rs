//! Column keyword tables used by schema inference.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keyword categories a raw header can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalField {
    Id,
    Diagnosis,
    Prescription,
    Procedure,
    Date,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        Self::Id,
        Self::Diagnosis,
        Self::Prescription,
        Self::Procedure,
        Self::Date,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Diagnosis => "diagnosis",
            Self::Prescription => "prescription",
            Self::Procedure => "procedure",
            Self::Date => "date",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered synonym lists per canonical field.
///
/// Order matters: earlier keywords win within a matching tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnKeywords {
    table: BTreeMap<CanonicalField, Vec<String>>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

impl Default for ColumnKeywords {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(
            CanonicalField::Id,
            owned(&[
                "patientid",
                "memberid",
                "subjectid",
                "mrn",
                "enrolid",
                "patid",
                "personid",
                "id",
            ]),
        );
        table.insert(
            CanonicalField::Diagnosis,
            owned(&["icd10", "icd", "diagnosis", "diag", "dx", "condition"]),
        );
        table.insert(
            CanonicalField::Prescription,
            owned(&["ndc", "drug", "rx", "medication", "prescription", "product"]),
        );
        table.insert(
            CanonicalField::Procedure,
            owned(&["cpt", "hcpcs", "procedure", "proc", "jcode"]),
        );
        table.insert(
            CanonicalField::Date,
            owned(&["dos", "servicedate", "date", "visit", "claimdate", "fromdt", "svcdt"]),
        );
        Self { table }
    }
}

impl ColumnKeywords {
    /// Empty table; combine with [`ColumnKeywords::with`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Replace the keyword list for one field.
    #[must_use]
    pub fn with(mut self, field: CanonicalField, keywords: &[&str]) -> Self {
        self.table.insert(field, owned(keywords));
        self
    }

    /// Keywords configured for a field (empty if none).
    #[must_use]
    pub fn get(&self, field: CanonicalField) -> &[String] {
        self.table.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}
