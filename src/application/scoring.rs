//! Engine-backed risk scorer: Implementation of RiskScorer over a ReasoningEngine.
//!
//! Renders one prompt per batch and validates the reply against the
//! expected schema: a JSON array of `{"id": string, "riskScore": number}`
//! with every score in [0, 1]. Anything else is reported as an
//! `EngineError` so the caller can fall back.

use std::sync::Arc;
use std::time::Duration;

use crate::ports::{
    EngineError, EnginePurpose, EngineRequest, ReasoningEngine, RiskScorer, ScoringRequest,
    SubjectScore,
};

/// Remove a surrounding markdown code fence, if any.
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string line (e.g. ```json).
    let body = rest.split_once('\n').map_or("", |(_, body)| body).trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse and validate a batch scoring reply.
///
/// # Errors
/// `EmptyResponse` for blank text or an empty array, `Malformed` for
/// anything that does not match the schema.
pub fn parse_scores(text: &str) -> Result<Vec<SubjectScore>, EngineError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(EngineError::EmptyResponse);
    }

    let scores: Vec<SubjectScore> =
        serde_json::from_str(body).map_err(|e| EngineError::Malformed(e.to_string()))?;
    if scores.is_empty() {
        return Err(EngineError::EmptyResponse);
    }

    check_score_range(&scores)?;
    Ok(scores)
}

/// Reject any non-finite score or one outside [0, 1].
///
/// # Errors
/// `Malformed` naming the first offending subject.
pub fn check_score_range(scores: &[SubjectScore]) -> Result<(), EngineError> {
    match scores
        .iter()
        .find(|s| !s.risk_score.is_finite() || !(0.0..=1.0).contains(&s.risk_score))
    {
        Some(bad) => Err(EngineError::Malformed(format!(
            "riskScore {} for subject {} outside [0, 1]",
            bad.risk_score, bad.id
        ))),
        None => Ok(()),
    }
}

/// Build the scoring prompt for one batch.
#[must_use]
pub fn render_prompt(request: &ScoringRequest) -> String {
    let subjects = serde_json::to_string(&request.subjects).unwrap_or_else(|_| "[]".to_string());

    format!(
        "You are estimating the probability that each patient transitions therapy line \
         ({transition}) for {disease} within the next {window} months.\n\
         Cohort parameters: lookback {lookback} months, prediction window {window} months, \
         minimum {min_claims} claims per patient.\n\
         Method: {script}\n\
         Patients (JSON): {subjects}\n\
         Respond with only a JSON array of objects {{\"id\": string, \"riskScore\": number \
         between 0 and 1}}, one per patient.",
        transition = request.target_line_transition,
        disease = request.disease_name,
        window = request.prediction_window_months,
        lookback = request.lookback_months,
        min_claims = request.min_claims_count,
        script = request.strategy_script,
    )
}

/// Risk scorer that prompts a reasoning engine.
pub struct EngineRiskScorer<E: ReasoningEngine> {
    engine: Arc<E>,
    timeout: Duration,
}

impl<E: ReasoningEngine> EngineRiskScorer<E> {
    pub fn new(engine: Arc<E>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }
}

impl<E: ReasoningEngine> RiskScorer for EngineRiskScorer<E> {
    fn score_batch(&self, request: &ScoringRequest) -> Result<Vec<SubjectScore>, EngineError> {
        let prompt = render_prompt(request);
        tracing::debug!(
            "Requesting scores for {} subject(s), prompt {} bytes",
            request.subjects.len(),
            prompt.len()
        );

        let reply = self.engine.complete(&EngineRequest::new(
            EnginePurpose::RiskScoring,
            prompt,
            self.timeout,
        ))?;
        parse_scores(&reply)
    }
}
