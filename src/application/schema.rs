//! Schema inference: resolves raw column headers to canonical fields.
//!
//! Headers and keywords are compared after normalization (lowercase,
//! alphanumerics only). For each field the keyword list is searched in three
//! tiers, each tier exhausted across all keywords before the next:
//! 1. exact match
//! 2. header starts with keyword
//! 3. header contains keyword

use serde::{Deserialize, Serialize};

use crate::domain::{CanonicalField, ColumnKeywords};

/// Number of candidate keywords reported per missing column.
const REPORTED_KEYWORDS: usize = 3;

/// Column required to build a subject record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequiredColumn {
    Id,
    Diagnosis,
    Drug,
    Date,
}

impl std::fmt::Display for RequiredColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::Diagnosis => write!(f, "diagnosis"),
            Self::Drug => write!(f, "drug"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// A required column that no header matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub column: RequiredColumn,

    /// First configured keywords for the column
    pub candidates: Vec<String>,
}

impl std::fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (expected e.g. {})", self.column, self.candidates.join(", "))
    }
}

/// Errors from schema inference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Could not resolve required columns: {}", format_missing(.0))]
    UnresolvedColumns(Vec<MissingColumn>),

    #[error("Input has no header row")]
    MissingHeader,
}

fn format_missing(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl SchemaError {
    /// Missing columns, if this is an unresolved-columns error.
    #[must_use]
    pub fn missing(&self) -> &[MissingColumn] {
        match self {
            Self::UnresolvedColumns(missing) => missing.as_slice(),
            Self::MissingHeader => &[],
        }
    }
}

/// Resolved column indices for a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub id: usize,
    pub diagnosis: usize,
    pub drug: usize,
    pub date: usize,

    /// Keyword category the drug column was found through
    pub drug_source: CanonicalField,
}

impl ColumnMapping {
    /// Highest column index referenced by the mapping.
    #[must_use]
    pub fn max_index(&self) -> usize {
        self.id.max(self.diagnosis).max(self.drug).max(self.date)
    }

    /// Column index resolved for a keyword category, if any.
    #[must_use]
    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::Id => Some(self.id),
            CanonicalField::Diagnosis => Some(self.diagnosis),
            CanonicalField::Date => Some(self.date),
            CanonicalField::Prescription | CanonicalField::Procedure => {
                (self.drug_source == field).then_some(self.drug)
            }
        }
    }
}

/// Lowercase and drop every non-alphanumeric character.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the first header matching any keyword, tier by tier.
fn find_column(headers: &[String], keywords: &[String]) -> Option<usize> {
    let keywords: Vec<String> = keywords
        .iter()
        .map(|k| normalize_header(k))
        .filter(|k| !k.is_empty())
        .collect();

    let tiers: [fn(&str, &str) -> bool; 3] = [
        |header, kw| header == kw,
        |header, kw| header.starts_with(kw),
        |header, kw| header.contains(kw),
    ];

    tiers.iter().find_map(|matches| {
        keywords
            .iter()
            .find_map(|kw| headers.iter().position(|h| matches(h, kw)))
    })
}

fn candidates(keywords: &ColumnKeywords, field: CanonicalField) -> Vec<String> {
    keywords
        .get(field)
        .iter()
        .take(REPORTED_KEYWORDS)
        .cloned()
        .collect()
}

/// Resolve a header row against the keyword tables.
///
/// The drug column is looked up through `prescription` keywords first and
/// falls back to `procedure` keywords, since oncology claims often encode
/// therapy as a procedure code.
///
/// # Errors
/// Returns `SchemaError::UnresolvedColumns` listing every required column
/// that could not be resolved. No partial mapping is returned.
pub fn resolve_columns<S: AsRef<str>>(
    headers: &[S],
    keywords: &ColumnKeywords,
) -> Result<ColumnMapping, SchemaError> {
    let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h.as_ref())).collect();
    let lookup = |field| find_column(&normalized, keywords.get(field));

    let id = lookup(CanonicalField::Id);
    let diagnosis = lookup(CanonicalField::Diagnosis);
    let date = lookup(CanonicalField::Date);
    let drug = lookup(CanonicalField::Prescription)
        .map(|i| (i, CanonicalField::Prescription))
        .or_else(|| lookup(CanonicalField::Procedure).map(|i| (i, CanonicalField::Procedure)));

    let mut missing = Vec::new();
    if id.is_none() {
        missing.push(MissingColumn {
            column: RequiredColumn::Id,
            candidates: candidates(keywords, CanonicalField::Id),
        });
    }
    if diagnosis.is_none() {
        missing.push(MissingColumn {
            column: RequiredColumn::Diagnosis,
            candidates: candidates(keywords, CanonicalField::Diagnosis),
        });
    }
    if drug.is_none() {
        let mut drug_candidates = candidates(keywords, CanonicalField::Prescription);
        drug_candidates.extend(candidates(keywords, CanonicalField::Procedure));
        missing.push(MissingColumn {
            column: RequiredColumn::Drug,
            candidates: drug_candidates,
        });
    }
    if date.is_none() {
        missing.push(MissingColumn {
            column: RequiredColumn::Date,
            candidates: candidates(keywords, CanonicalField::Date),
        });
    }

    match (id, diagnosis, drug, date) {
        (Some(id), Some(diagnosis), Some((drug, drug_source)), Some(date)) => {
            tracing::debug!(
                "Resolved columns: id={id}, diagnosis={diagnosis}, drug={drug} (via {drug_source}), date={date}"
            );
            Ok(ColumnMapping {
                id,
                diagnosis,
                drug,
                date,
                drug_source,
            })
        }
        _ => {
            tracing::warn!("Schema inference failed: {} required column(s) unresolved", missing.len());
            Err(SchemaError::UnresolvedColumns(missing))
        }
    }
}
