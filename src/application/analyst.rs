//! Analyst service: free-text questions about a classified cohort.
//!
//! The answer is opaque engine output. Failures yield a fixed apology.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{OntologyMapping, RiskCategory, Subject};
use crate::ports::{EnginePurpose, EngineRequest, ReasoningEngine};

/// Returned whenever the engine cannot answer.
pub const APOLOGY: &str =
    "Sorry, I couldn't analyze the cohort right now. Please try again in a moment.";

/// One roster line per subject.
///
/// Fields: id, age, gender, therapy line, months on therapy, drug, risk
/// category, risk score (2 decimals), provider name, provider id, split.
#[must_use]
pub fn roster_line(subject: &Subject) -> String {
    let category = subject
        .risk_category
        .map_or_else(|| "-".to_string(), |c| c.to_string());
    let score = subject
        .risk_score
        .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));
    let split = subject
        .split
        .map_or_else(|| "-".to_string(), |s| s.to_string());

    format!(
        "{}|{}|{}|L{}|{}mo|{}|{}|{}|{}|{}|{}",
        subject.id,
        subject.age,
        subject.gender,
        subject.current_therapy_line,
        subject.months_on_current_therapy,
        subject.drug_id,
        category,
        score,
        subject.provider_name,
        subject.provider_id,
        split
    )
}

/// Build the analyst prompt.
#[must_use]
pub fn render_prompt(question: &str, subjects: &[Subject], ontology: &OntologyMapping) -> String {
    let mut prompt = format!(
        "You are a data analyst answering questions about a {disease} cohort \
         (target transition {transition}; ICD {icd}; drugs {drugs}).\n\
         Roster columns: id|age|gender|line|months|drug|riskCategory|riskScore|provider|providerId|split\n",
        disease = ontology.disease_name,
        transition = ontology.target_line_transition,
        icd = ontology.icd_codes.join(", "),
        drugs = ontology.drugs.join(", "),
    );
    for category in [RiskCategory::High, RiskCategory::Medium, RiskCategory::Low] {
        let _ = writeln!(prompt, "{category}: {}", category.description());
    }
    for subject in subjects {
        let _ = writeln!(prompt, "{}", roster_line(subject));
    }
    let _ = write!(prompt, "Question: {question}");
    prompt
}

/// Service for analyst Q&A.
pub struct AnalystService<E: ReasoningEngine> {
    engine: Arc<E>,
    timeout: Duration,
}

impl<E: ReasoningEngine> AnalystService<E> {
    pub fn new(engine: Arc<E>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Answer a question about the cohort. Never fails.
    pub fn ask(&self, question: &str, subjects: &[Subject], ontology: &OntologyMapping) -> String {
        let request = EngineRequest::new(
            EnginePurpose::AnalystQuery,
            render_prompt(question, subjects, ontology),
            self.timeout,
        );

        match self.engine.complete(&request) {
            Ok(answer) if !answer.trim().is_empty() => answer.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Analyst engine returned an empty answer");
                APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!("Analyst query failed: {e}");
                APOLOGY.to_string()
            }
        }
    }
}
