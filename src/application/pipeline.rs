//! End-to-end pipeline: ontology → ingestion → inference → validation.
//!
//! Only schema inference can fail a run; every engine failure degrades to
//! its fallback.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

use crate::domain::{CohortConfig, ColumnKeywords, OntologyMapping, Subject, ValidationMetrics};
use crate::ports::{DemographicSource, ReasoningEngine};

use super::analyst::AnalystService;
use super::ground_truth::SimulatedOutcomes;
use super::inference::{InferenceMode, RiskInferenceService};
use super::metrics::compute_metrics;
use super::normalize::RecordNormalizer;
use super::ontology::OntologyService;
use super::schema::ColumnMapping;
use super::scoring::EngineRiskScorer;
use super::summary::{summarize, CohortSummary};
use crate::CohortLensError;

/// Everything produced by one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    pub ontology: OntologyMapping,
    pub config: CohortConfig,
    pub mapping: ColumnMapping,
    pub dropped_rows: usize,
    pub mode: InferenceMode,
    pub metrics: ValidationMetrics,
    pub summary: CohortSummary,

    /// Subjects whose diagnosis is not covered by the ontology's ICD codes
    pub outside_ontology: usize,

    /// Scored subjects followed by ineligible ones
    pub subjects: Vec<Subject>,
}

/// Wires the services together over one reasoning engine.
pub struct Pipeline<E: ReasoningEngine> {
    keywords: ColumnKeywords,
    normalizer: RecordNormalizer,
    ontology: OntologyService<E>,
    inference: RiskInferenceService<EngineRiskScorer<E>, SimulatedOutcomes>,
    analyst: AnalystService<E>,
}

impl<E: ReasoningEngine> Pipeline<E> {
    /// Create a pipeline with default keywords and synthetic demographics.
    ///
    /// `timeout` bounds each engine call.
    pub fn new(engine: Arc<E>, timeout: Duration) -> Self {
        Self {
            keywords: ColumnKeywords::default(),
            normalizer: RecordNormalizer::default(),
            ontology: OntologyService::new(Arc::clone(&engine), timeout),
            inference: RiskInferenceService::new(
                Arc::new(EngineRiskScorer::new(Arc::clone(&engine), timeout)),
                Arc::new(SimulatedOutcomes),
            ),
            analyst: AnalystService::new(engine, timeout),
        }
    }

    /// Use a custom keyword table for schema inference.
    #[must_use]
    pub fn with_keywords(mut self, keywords: ColumnKeywords) -> Self {
        self.keywords = keywords;
        self
    }

    /// Use a custom demographic source during normalization.
    #[must_use]
    pub fn with_demographics(mut self, demographics: Arc<dyn DemographicSource>) -> Self {
        self.normalizer = RecordNormalizer::new(demographics);
        self
    }

    /// Run the pipeline with the current time as ingestion time.
    ///
    /// # Errors
    /// Returns `CohortLensError::Schema` if the header cannot be resolved.
    pub fn run<R: Rng>(
        &self,
        claims_csv: &str,
        query: &str,
        config: &CohortConfig,
        rng: &mut R,
    ) -> Result<PipelineReport, CohortLensError> {
        self.run_at(claims_csv, query, config, rng, Utc::now())
    }

    /// Run the pipeline with an explicit ingestion time.
    ///
    /// # Errors
    /// Returns `CohortLensError::Schema` if the header cannot be resolved.
    pub fn run_at<R: Rng>(
        &self,
        claims_csv: &str,
        query: &str,
        config: &CohortConfig,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<PipelineReport, CohortLensError> {
        tracing::info!("Starting cohort pipeline...");

        // Step 1: Ingest (fails fast before any engine call)
        let ingestion = self.normalizer.ingest(claims_csv, &self.keywords, rng, now)?;

        // Step 2: Ontology
        let ontology = self.ontology.resolve(query);

        // Step 3: Inference
        let classification = self
            .inference
            .classify(&ingestion.subjects, &ontology, config, rng);

        // Step 4: Validation
        let metrics = compute_metrics(&classification.subjects);
        let mut subjects = classification.subjects;
        subjects.extend(classification.ineligible);
        let summary = summarize(&subjects);

        // An empty code list means the ontology is unknown, not restrictive.
        let outside_ontology = if ontology.icd_codes.is_empty() {
            0
        } else {
            subjects
                .iter()
                .filter(|s| !ontology.covers_diagnosis(&s.diagnosis_code))
                .count()
        };
        if outside_ontology > 0 {
            tracing::warn!(
                "{outside_ontology} subject(s) have diagnoses outside the {} ontology",
                ontology.disease_name
            );
        }

        tracing::info!(
            "Pipeline complete: {} subject(s), accuracy={:.3}, precision={:.3}, recall={:.3}, f1={:.3}",
            subjects.len(),
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1()
        );

        Ok(PipelineReport {
            ontology,
            config: config.clone(),
            mapping: ingestion.mapping,
            dropped_rows: ingestion.dropped_rows,
            mode: classification.mode,
            metrics,
            summary,
            outside_ontology,
            subjects,
        })
    }

    /// Ask a question about a finished run.
    pub fn ask(&self, question: &str, report: &PipelineReport) -> String {
        self.analyst.ask(question, &report.subjects, &report.ontology)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::schema::SchemaError;
    use crate::ports::{EngineError, EnginePurpose, EngineRequest};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    /// Answers ontology and analyst prompts; scores every patient id it finds.
    struct ScriptedEngine {
        score: Option<f64>,
    }

    impl ReasoningEngine for ScriptedEngine {
        fn complete(&self, request: &EngineRequest) -> Result<String, EngineError> {
            match request.purpose {
                EnginePurpose::OntologyResolution => Ok(
                    r#"{"diseaseName":"NSCLC","icdCodes":["C34.*"],"cptCodes":[],"drugs":["Osimertinib"],"targetLineTransition":"1L to 2L"}"#
                        .to_string(),
                ),
                EnginePurpose::RiskScoring => {
                    let score = self
                        .score
                        .ok_or_else(|| EngineError::Transport("down".to_string()))?;
                    let ids: Vec<String> = request
                        .prompt
                        .split("\"id\":\"")
                        .skip(1)
                        .filter_map(|rest| rest.split('"').next())
                        .map(|id| format!(r#"{{"id":"{id}","riskScore":{score}}}"#))
                        .collect();
                    Ok(format!("[{}]", ids.join(",")))
                }
                EnginePurpose::AnalystQuery => Ok("Most subjects are high risk.".to_string()),
            }
        }
    }

    fn claims(n: usize) -> String {
        let mut csv = String::from("Patient_ID,ICD10,NDC,DOS\n");
        for i in 0..n {
            csv.push_str(&format!("P-{i},C34.90,J9999,2024-01-{:02}\n", (i % 28) + 1));
        }
        csv
    }

    #[test]
    fn test_run_scores_and_validates() {
        let pipeline = Pipeline::new(Arc::new(ScriptedEngine { score: Some(0.9) }), Duration::from_secs(1));
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let report = pipeline
            .run(&claims(20), "EGFR+ NSCLC progression", &CohortConfig::default(), &mut rng)
            .expect("Should run");

        assert_eq!(report.ontology.disease_name, "NSCLC");
        assert_eq!(report.subjects.len(), 20);
        assert_eq!(report.summary.total, 20);
        assert_eq!(report.outside_ontology, 0);
        assert!(matches!(report.mode, InferenceMode::Scored { fallback_scored: 0, .. }));
        assert_eq!(report.metrics.evaluated(), report.summary.test);
        assert_eq!(pipeline.ask("Summary?", &report), "Most subjects are high risk.");
    }

    #[test]
    fn test_engine_outage_degrades() {
        let pipeline = Pipeline::new(Arc::new(ScriptedEngine { score: None }), Duration::from_secs(1));
        let mut rng = ChaCha20Rng::seed_from_u64(22);
        let report = pipeline
            .run(&claims(12), "query", &CohortConfig::default(), &mut rng)
            .expect("Should run");

        assert!(matches!(report.mode, InferenceMode::TotalFallback { .. }));
        assert_eq!(report.summary.train, 12);
        assert_eq!(report.metrics, ValidationMetrics::default());
    }

    #[test]
    fn test_schema_error_propagates() {
        let pipeline = Pipeline::new(Arc::new(ScriptedEngine { score: Some(0.5) }), Duration::from_secs(1));
        let mut rng = ChaCha20Rng::seed_from_u64(23);
        let err = pipeline
            .run("name,notes\nx,y\n", "query", &CohortConfig::default(), &mut rng)
            .expect_err("Should fail");

        assert!(matches!(err, CohortLensError::Schema(SchemaError::UnresolvedColumns(_))));
    }
}
