//! Record normalizer: parses delimited claims rows into canonical subjects.
//!
//! Bad rows are skipped rather than failing the batch. Only schema
//! inference on the header row can fail an ingestion.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;

use crate::adapters::synthetic::SyntheticDemographics;
use crate::domain::{ColumnKeywords, Subject};
use crate::ports::DemographicSource;

use super::schema::{resolve_columns, ColumnMapping, SchemaError};

/// Value used for a missing diagnosis or drug.
pub const UNKNOWN_VALUE: &str = "Unknown";

/// Offset for synthesized subject ids (`P-<offset + row index>`).
const PLACEHOLDER_ID_OFFSET: usize = 1000;

/// Split one delimited line on commas that are not inside quotes.
///
/// Cells are trimmed and a surrounding quote pair is removed. Inside quoted
/// cells a doubled quote (`""`) stands for a literal quote.
#[must_use]
pub fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                cells.push(finish_cell(&current));
                current.clear();
            }
            _ => current.push(c),
        }
    }
    cells.push(finish_cell(&current));
    cells
}

fn finish_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => trimmed.to_string(),
    }
}

/// Parsed ingestion output.
#[derive(Debug, Clone)]
pub struct Ingestion {
    pub mapping: ColumnMapping,
    pub subjects: Vec<Subject>,

    /// Data rows skipped because they were too short
    pub dropped_rows: usize,
}

/// Turns raw claims rows into [`Subject`] records.
pub struct RecordNormalizer {
    demographics: Arc<dyn DemographicSource>,
}

impl Default for RecordNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(SyntheticDemographics::default()))
    }
}

impl RecordNormalizer {
    /// Create a normalizer that takes demographics from `demographics`.
    pub fn new(demographics: Arc<dyn DemographicSource>) -> Self {
        Self { demographics }
    }

    /// Normalize data rows (no header) with an already resolved mapping.
    ///
    /// Returns the subjects and the number of dropped rows. Blank lines are
    /// ignored without counting as dropped.
    pub fn normalize<S, R>(
        &self,
        rows: &[S],
        mapping: &ColumnMapping,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> (Vec<Subject>, usize)
    where
        S: AsRef<str>,
        R: Rng,
    {
        let required_len = mapping.max_index() + 1;
        let fallback_date = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut subjects = Vec::with_capacity(rows.len());
        let mut dropped = 0;

        for (row_index, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }

            let cells = split_row(line);
            if cells.len() < required_len {
                tracing::debug!(
                    "Dropping row {row_index}: {} cells, need {required_len}",
                    cells.len()
                );
                dropped += 1;
                continue;
            }

            let cell = |i: usize| Some(cells[i].as_str()).filter(|v| !v.is_empty());

            let id = cell(mapping.id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("P-{}", PLACEHOLDER_ID_OFFSET + row_index));
            let diagnosis = cell(mapping.diagnosis).unwrap_or(UNKNOWN_VALUE);
            let drug = cell(mapping.drug).unwrap_or(UNKNOWN_VALUE);
            let date = cell(mapping.date)
                .map(str::to_string)
                .unwrap_or_else(|| fallback_date.clone());

            let demographics = self.demographics.demographics(row_index, &cells, &mut *rng);
            subjects.push(Subject::new(id, diagnosis, drug, date, demographics));
        }

        if dropped > 0 {
            tracing::info!("Skipped {dropped} malformed row(s)");
        }
        (subjects, dropped)
    }

    /// Ingest delimited text: resolve the header row, then normalize the rest.
    ///
    /// # Errors
    /// Returns `SchemaError` if there is no header or a required column
    /// cannot be resolved. Nothing is returned for the input in that case.
    pub fn ingest<R: Rng>(
        &self,
        text: &str,
        keywords: &ColumnKeywords,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<Ingestion, SchemaError> {
        let mut lines = text.lines().skip_while(|l| l.trim().is_empty());
        let header = lines.next().ok_or(SchemaError::MissingHeader)?;
        let mapping = resolve_columns(&split_row(header), keywords)?;

        let rows: Vec<&str> = lines.collect();
        let (subjects, dropped_rows) = self.normalize(&rows, &mapping, rng, now);

        tracing::info!(
            "Ingested {} subject(s) from {} data row(s)",
            subjects.len(),
            rows.len()
        );

        Ok(Ingestion {
            mapping,
            subjects,
            dropped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CanonicalField, Demographics, Gender};
    use chrono::TimeZone;
    use rand::RngCore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    struct FixedDemographics;

    impl DemographicSource for FixedDemographics {
        fn demographics(&self, row_index: usize, _cells: &[String], _rng: &mut dyn RngCore) -> Demographics {
            Demographics {
                age: 40 + row_index as u32,
                gender: Gender::Male,
                current_therapy_line: 1,
                months_on_current_therapy: 6,
                specialty: "Oncology".to_string(),
                provider_name: "Dr. Test".to_string(),
                provider_id: "PRV-1".to_string(),
            }
        }
    }

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            id: 0,
            diagnosis: 1,
            drug: 2,
            date: 3,
            drug_source: CanonicalField::Prescription,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn normalizer() -> RecordNormalizer {
        RecordNormalizer::new(Arc::new(FixedDemographics))
    }

    #[test]
    fn test_split_row_respects_quotes() {
        let cells = split_row(r#" P-1 ,"C50.911, left breast", "J9355" ,2024-01-02"#);
        assert_eq!(cells, vec!["P-1", "C50.911, left breast", "J9355", "2024-01-02"]);
    }

    #[test]
    fn test_split_row_doubled_quotes_and_empty_cells() {
        let cells = split_row(r#""say ""hi""",,x"#);
        assert_eq!(cells, vec![r#"say "hi""#, "", "x"]);
    }

    #[test]
    fn test_missing_values_get_defaults() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let rows = [",,,", "P-77,C34.90,,2024-02-02"];
        let (subjects, dropped) = normalizer().normalize(&rows, &mapping(), &mut rng, now());

        assert_eq!(dropped, 0);
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0].id, "P-1000");
        assert_eq!(subjects[0].diagnosis_code, UNKNOWN_VALUE);
        assert_eq!(subjects[0].drug_id, UNKNOWN_VALUE);
        assert_eq!(subjects[0].last_visit_date, "2024-06-01T12:00:00Z");
        assert_eq!(subjects[1].id, "P-77");
        assert_eq!(subjects[1].drug_id, UNKNOWN_VALUE);
        assert_eq!(subjects[1].age, 41);
    }

    #[test]
    fn test_short_rows_are_dropped() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let rows = ["P-1,C50.1,J9355,2024-01-01", "P-2,C50.1", "", "P-3,C50.1,J9355,2024-01-03,extra"];
        let (subjects, dropped) = normalizer().normalize(&rows, &mapping(), &mut rng, now());

        assert_eq!(dropped, 1);
        let ids: Vec<&str> = subjects.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["P-1", "P-3"]);
    }

    #[test]
    fn test_placeholder_id_uses_row_index() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let rows = ["P-1,a,b,c", "P-2,a,b,c", ",a,b,c"];
        let (subjects, _) = normalizer().normalize(&rows, &mapping(), &mut rng, now());
        assert_eq!(subjects[2].id, "P-1002");
    }

    #[test]
    fn test_ingest_resolves_header() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let text = "\nDOS,NDC,Patient_ID,ICD10\n2024-01-01,J9355,P-9,C50.911\n";
        let ingestion = normalizer()
            .ingest(text, &ColumnKeywords::default(), &mut rng, now())
            .expect("Should ingest");

        assert_eq!(ingestion.mapping.id, 2);
        assert_eq!(ingestion.subjects.len(), 1);
        assert_eq!(ingestion.subjects[0].id, "P-9");
        assert_eq!(ingestion.subjects[0].drug_id, "J9355");
        assert_eq!(ingestion.subjects[0].diagnosis_code, "C50.911");
    }

    #[test]
    fn test_ingest_schema_failure_returns_nothing() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let err = normalizer()
            .ingest("foo,bar\n1,2\n", &ColumnKeywords::default(), &mut rng, now())
            .expect_err("Should fail");
        assert_eq!(err.missing().len(), 4);

        let err = normalizer()
            .ingest("  \n", &ColumnKeywords::default(), &mut rng, now())
            .expect_err("Should fail");
        assert_eq!(err, SchemaError::MissingHeader);
    }

    #[test]
    fn test_default_normalizer_is_deterministic_under_seed() {
        let rows = ["P-1,a,b,c", "P-2,a,b,c"];
        let run = |seed| {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            RecordNormalizer::default().normalize(&rows, &mapping(), &mut rng, now()).0
        };
        assert_eq!(run(5), run(5));
    }
}
