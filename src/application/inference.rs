//! Risk inference service: Scores a cohort through a RiskScorer.
//!
//! This service coordinates:
//! - Cohort split and eligibility
//! - Bounded batch scoring
//! - Partial fallback for subjects the scorer did not return
//! - Total fallback when the scorer call fails as a whole
//! - Outcome labelling
//!
//! No scorer failure escapes `classify`.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::domain::{CohortConfig, OntologyMapping, Split, Subject};
use crate::ports::{EngineError, OutcomeLabeler, RiskScorer, ScoringRequest};

use super::cohort::split_cohort;
use super::scoring::check_score_range;
use super::strategy::strategy_for;

/// Maximum number of subjects sent to the scorer in one call.
pub const MAX_BATCH_SIZE: usize = 30;

/// Score assigned to every subject when the scorer call fails.
pub const TOTAL_FALLBACK_SCORE: f64 = 0.1;

/// Partial fallback base score for subjects on therapy longer than the lookback.
pub const LONG_EXPOSURE_BASE: f64 = 0.4;

/// Partial fallback base score otherwise.
pub const SHORT_EXPOSURE_BASE: f64 = 0.05;

/// Half-width of the symmetric noise added to partial fallback scores.
pub const FALLBACK_NOISE: f64 = 0.15;

const MIN_FALLBACK_SCORE: f64 = 0.01;
const MAX_FALLBACK_SCORE: f64 = 0.99;

/// How a classification run obtained its scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferenceMode {
    /// The scorer answered; gaps were filled by the partial fallback.
    Scored {
        engine_scored: usize,
        fallback_scored: usize,
    },
    /// The scorer call failed; every subject got the fixed low score.
    TotalFallback { reason: String },
}

/// Output of [`RiskInferenceService::classify`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    /// Scored subjects with split and outcome assigned
    pub subjects: Vec<Subject>,

    /// Subjects excluded by the eligibility gate (never scored or split)
    pub ineligible: Vec<Subject>,

    pub mode: InferenceMode,
}

impl Classification {
    fn empty() -> Self {
        Self {
            subjects: Vec::new(),
            ineligible: Vec::new(),
            mode: InferenceMode::Scored {
                engine_scored: 0,
                fallback_scored: 0,
            },
        }
    }

    #[must_use]
    pub fn is_total_fallback(&self) -> bool {
        matches!(self.mode, InferenceMode::TotalFallback { .. })
    }
}

/// Synthetic score for an eligible subject the scorer did not return.
pub fn partial_fallback_score<R: Rng>(subject: &Subject, lookback_months: u32, rng: &mut R) -> f64 {
    let base = if subject.months_on_current_therapy > lookback_months {
        LONG_EXPOSURE_BASE
    } else {
        SHORT_EXPOSURE_BASE
    };
    let noise = rng.gen_range(-FALLBACK_NOISE..=FALLBACK_NOISE);
    (base + noise).clamp(MIN_FALLBACK_SCORE, MAX_FALLBACK_SCORE)
}

/// Service for scoring a cohort.
pub struct RiskInferenceService<S, L>
where
    S: RiskScorer,
    L: OutcomeLabeler,
{
    scorer: Arc<S>,
    labeler: Arc<L>,
}

impl<S, L> RiskInferenceService<S, L>
where
    S: RiskScorer,
    L: OutcomeLabeler,
{
    /// Create a new inference service.
    pub fn new(scorer: Arc<S>, labeler: Arc<L>) -> Self {
        Self { scorer, labeler }
    }

    /// Split, score and label a cohort.
    ///
    /// Performs the full pipeline:
    /// 1. Split eligible subjects into TRAIN/TEST
    /// 2. Score the first `MAX_BATCH_SIZE` shuffled eligible subjects
    /// 3. Fill unscored eligible subjects with the partial fallback
    /// 4. Label outcomes
    ///
    /// If the scorer fails, returns nothing, or returns a non-finite or
    /// out-of-range score, every input subject (eligible or not) is
    /// returned with the total fallback score and a TRAIN split. With no
    /// eligible subjects the batch is empty, so this is the path taken.
    pub fn classify<R: Rng>(
        &self,
        subjects: &[Subject],
        ontology: &OntologyMapping,
        config: &CohortConfig,
        rng: &mut R,
    ) -> Classification {
        if subjects.is_empty() {
            return Classification::empty();
        }

        tracing::info!("Starting risk inference for {} subject(s)...", subjects.len());

        // Step 1: Split
        let cohort = split_cohort(subjects, config, rng);
        if cohort.eligible.is_empty() {
            tracing::warn!("No eligible subjects; scoring an empty batch");
        }

        // Step 2: Bounded batch
        let batch = &cohort.eligible[..cohort.eligible.len().min(MAX_BATCH_SIZE)];

        // Step 3: Score
        let strategy = strategy_for(config);
        let request = ScoringRequest {
            disease_name: ontology.disease_name.clone(),
            target_line_transition: ontology.target_line_transition.clone(),
            lookback_months: config.lookback_months,
            prediction_window_months: config.prediction_window_months,
            min_claims_count: config.min_claims_count,
            model_type: strategy.model_type(),
            strategy_script: strategy.script(),
            subjects: batch.iter().map(Subject::features).collect(),
        };

        // Scorer output is untrusted: an empty list or a score outside
        // [0, 1] fails the whole batch.
        let reply = self.scorer.score_batch(&request).and_then(|scores| {
            if scores.is_empty() {
                return Err(EngineError::EmptyResponse);
            }
            check_score_range(&scores)?;
            Ok(scores)
        });
        let scores = match reply {
            Ok(scores) => scores,
            Err(e) => {
                // Step 4: Total fallback
                tracing::warn!("Risk scorer failed ({e}); applying total fallback");
                return self.total_fallback(subjects, e.to_string(), rng);
            }
        };

        // First occurrence wins for duplicate ids.
        let mut by_id: HashMap<&str, f64> = HashMap::with_capacity(scores.len());
        for score in &scores {
            by_id.entry(score.id.as_str()).or_insert(score.risk_score);
        }

        // Step 5: Merge with partial fallback
        let mut engine_scored = 0;
        let mut fallback_scored = 0;
        let scored: Vec<Subject> = cohort
            .eligible
            .iter()
            .map(|subject| {
                let score = match by_id.get(subject.id.as_str()) {
                    Some(&score) => {
                        engine_scored += 1;
                        score
                    }
                    None => {
                        fallback_scored += 1;
                        partial_fallback_score(subject, config.lookback_months, rng)
                    }
                };
                subject.with_score(score)
            })
            .collect();

        let subjects = self.label_outcomes(scored, rng);

        tracing::info!(
            "Inference complete: {engine_scored} scored by engine, {fallback_scored} by fallback, {} ineligible",
            cohort.ineligible.len()
        );

        Classification {
            subjects,
            ineligible: cohort.ineligible,
            mode: InferenceMode::Scored {
                engine_scored,
                fallback_scored,
            },
        }
    }

    fn total_fallback<R: Rng>(&self, subjects: &[Subject], reason: String, rng: &mut R) -> Classification {
        let scored = subjects
            .iter()
            .map(|s| s.with_score(TOTAL_FALLBACK_SCORE).with_split(Split::Train))
            .collect();

        Classification {
            subjects: self.label_outcomes(scored, rng),
            ineligible: Vec::new(),
            mode: InferenceMode::TotalFallback { reason },
        }
    }

    fn label_outcomes<R: Rng>(&self, scored: Vec<Subject>, rng: &mut R) -> Vec<Subject> {
        scored
            .into_iter()
            .map(|mut subject| {
                subject.actual_outcome = self.labeler.label(&subject, &mut *rng);
                subject
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ground_truth::SimulatedOutcomes;
    use crate::domain::{sample_subject, RiskCategory};
    use crate::ports::SubjectScore;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Scorer that returns a fixed score for each requested subject, or fails.
    struct StubScorer {
        reply: Result<f64, EngineError>,
        /// Only score every n-th subject of the batch
        every: usize,
        seen: Mutex<Vec<ScoringRequest>>,
    }

    impl StubScorer {
        fn scoring(score: f64) -> Self {
            Self {
                reply: Ok(score),
                every: 1,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(err: EngineError) -> Self {
            Self {
                reply: Err(err),
                every: 1,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl RiskScorer for StubScorer {
        fn score_batch(&self, request: &ScoringRequest) -> Result<Vec<SubjectScore>, EngineError> {
            self.seen.lock().expect("lock").push(request.clone());
            let score = self.reply.clone()?;
            Ok(request
                .subjects
                .iter()
                .step_by(self.every)
                .map(|f| SubjectScore {
                    id: f.id.clone(),
                    risk_score: score,
                })
                .collect())
        }
    }

    fn service(scorer: StubScorer) -> RiskInferenceService<StubScorer, SimulatedOutcomes> {
        RiskInferenceService::new(Arc::new(scorer), Arc::new(SimulatedOutcomes))
    }

    fn cohort(n: usize, months: u32) -> Vec<Subject> {
        (0..n).map(|i| sample_subject(&format!("P-{i}"), months)).collect()
    }

    #[test]
    fn test_empty_input() {
        let svc = service(StubScorer::scoring(0.5));
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let result = svc.classify(&[], &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        assert!(result.subjects.is_empty());
        assert!(result.ineligible.is_empty());
        assert!(!result.is_total_fallback());
    }

    #[test]
    fn test_batch_is_bounded() {
        let scorer = StubScorer::scoring(0.9);
        let svc = service(scorer);
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let subjects = cohort(45, 3);
        let result = svc.classify(&subjects, &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        let seen = svc.scorer.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].subjects.len(), MAX_BATCH_SIZE);
        assert_eq!(
            result.mode,
            InferenceMode::Scored {
                engine_scored: 30,
                fallback_scored: 15
            }
        );
        assert_eq!(result.subjects.len(), 45);
    }

    #[test]
    fn test_partial_fallback_fills_gaps() {
        let scorer = StubScorer {
            every: 2,
            ..StubScorer::scoring(0.95)
        };
        let svc = service(scorer);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        // months (3) <= lookback (12): fallback base 0.05
        let subjects = cohort(10, 3);
        let result = svc.classify(&subjects, &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        assert_eq!(
            result.mode,
            InferenceMode::Scored {
                engine_scored: 5,
                fallback_scored: 5
            }
        );
        for subject in &result.subjects {
            let score = subject.risk_score.expect("scored");
            if (score - 0.95).abs() > f64::EPSILON {
                assert!((MIN_FALLBACK_SCORE..=0.2 + 1e-9).contains(&score), "score {score}");
            }
            assert_eq!(subject.risk_category, Some(RiskCategory::from_score(score)));
            assert!(subject.split.is_some());
            assert!(subject.actual_outcome.is_some());
        }
    }

    #[test]
    fn test_total_fallback_covers_every_input() {
        let svc = service(StubScorer::failing(EngineError::Timeout(Duration::from_secs(30))));
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let mut subjects = cohort(8, 5);
        subjects.extend(cohort(3, 0));

        let result = svc.classify(&subjects, &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        assert!(result.is_total_fallback());
        assert_eq!(result.subjects.len(), subjects.len());
        assert!(result.ineligible.is_empty());
        for subject in &result.subjects {
            assert_eq!(subject.risk_score, Some(TOTAL_FALLBACK_SCORE));
            assert_eq!(subject.risk_category, Some(RiskCategory::Low));
            assert_eq!(subject.split, Some(Split::Train));
            assert!(subject.actual_outcome.is_some());
        }
        // Input order is preserved on this path.
        let ids: Vec<&str> = result.subjects.iter().map(|s| s.id.as_str()).collect();
        let input: Vec<&str> = subjects.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, input);
    }

    #[test]
    fn test_ineligible_subjects_are_not_scored() {
        let svc = service(StubScorer::scoring(0.6));
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut subjects = cohort(6, 2);
        subjects.push(sample_subject("fresh", 0));

        let result = svc.classify(&subjects, &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        assert_eq!(result.subjects.len(), 6);
        assert_eq!(result.ineligible.len(), 1);
        let fresh = &result.ineligible[0];
        assert!(fresh.risk_score.is_none() && fresh.split.is_none() && fresh.actual_outcome.is_none());
    }

    #[test]
    fn test_no_eligible_subjects_with_failing_scorer() {
        let svc = service(StubScorer::failing(EngineError::Transport("refused".to_string())));
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let result = svc.classify(&cohort(3, 0), &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        assert_eq!(svc.scorer.seen.lock().expect("lock").len(), 1);
        assert!(result.is_total_fallback());
        assert_eq!(result.subjects.len(), 3);
        assert!(result.ineligible.is_empty());
        for subject in &result.subjects {
            assert_eq!(subject.risk_score, Some(TOTAL_FALLBACK_SCORE));
            assert_eq!(subject.split, Some(Split::Train));
        }
    }

    #[test]
    fn test_no_eligible_subjects_sends_empty_batch() {
        let svc = service(StubScorer::scoring(0.6));
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let result = svc.classify(&cohort(4, 0), &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

        let seen = svc.scorer.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert!(seen[0].subjects.is_empty());
        // Nothing scored counts as an empty reply.
        assert!(result.is_total_fallback());
        assert_eq!(result.subjects.len(), 4);
    }

    #[test]
    fn test_out_of_range_scores_trigger_total_fallback() {
        for bad in [f64::NAN, 1.4, -0.2, f64::INFINITY] {
            let svc = service(StubScorer::scoring(bad));
            let mut rng = ChaCha20Rng::seed_from_u64(12);
            let result = svc.classify(&cohort(5, 4), &OntologyMapping::unknown(), &CohortConfig::default(), &mut rng);

            assert!(result.is_total_fallback(), "score {bad} should be rejected");
            assert!(result
                .subjects
                .iter()
                .all(|s| s.risk_score == Some(TOTAL_FALLBACK_SCORE)));
        }
    }

    #[test]
    fn test_partial_fallback_bases() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..200 {
            let long = partial_fallback_score(&sample_subject("a", 20), 12, &mut rng);
            assert!((0.25 - 1e-9..=0.55 + 1e-9).contains(&long), "long {long}");

            let short = partial_fallback_score(&sample_subject("b", 12), 12, &mut rng);
            assert!((MIN_FALLBACK_SCORE..=0.2 + 1e-9).contains(&short), "short {short}");
        }
    }

    #[test]
    fn test_request_carries_context_and_strategy() {
        let svc = service(StubScorer::scoring(0.5));
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let ontology = OntologyMapping {
            disease_name: "CLL".to_string(),
            target_line_transition: "1L to 2L".to_string(),
            ..OntologyMapping::unknown()
        };
        let config = CohortConfig {
            lookback_months: 18,
            ..Default::default()
        };
        svc.classify(&cohort(3, 4), &ontology, &config, &mut rng);

        let seen = svc.scorer.seen.lock().expect("lock");
        assert_eq!(seen[0].disease_name, "CLL");
        assert_eq!(seen[0].lookback_months, 18);
        assert!(seen[0].strategy_script.contains("decision tree"));
    }
}
