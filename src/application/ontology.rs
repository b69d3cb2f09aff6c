//! Ontology service: Resolves a free-text research query into an OntologyMapping.
//!
//! Resolution never fails: any engine or parse error yields
//! [`OntologyMapping::unknown`].

use std::sync::Arc;
use std::time::Duration;

use crate::domain::OntologyMapping;
use crate::ports::{EngineError, EnginePurpose, EngineRequest, ReasoningEngine};

use super::scoring::strip_code_fence;

/// Service for ontology resolution.
pub struct OntologyService<E: ReasoningEngine> {
    engine: Arc<E>,
    timeout: Duration,
}

fn render_prompt(query: &str) -> String {
    format!(
        "Map this oncology research question to a clinical ontology.\n\
         Question: {query}\n\
         Respond with only a JSON object with fields \"diseaseName\" (string), \
         \"icdCodes\" (ICD-10 codes, wildcards like C50.* allowed), \"cptCodes\", \
         \"drugs\" (arrays of strings) and \"targetLineTransition\" (e.g. \"1L to 2L\")."
    )
}

/// Parse and validate an ontology reply.
///
/// # Errors
/// `EmptyResponse` for blank text, `Malformed` if the JSON does not match or
/// the disease name is blank.
pub fn parse_ontology(text: &str) -> Result<OntologyMapping, EngineError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(EngineError::EmptyResponse);
    }

    let mapping: OntologyMapping =
        serde_json::from_str(body).map_err(|e| EngineError::Malformed(e.to_string()))?;
    if mapping.disease_name.trim().is_empty() {
        return Err(EngineError::Malformed("blank diseaseName".to_string()));
    }
    if mapping.line_transition().is_none() {
        tracing::debug!(
            "Unrecognized line transition format: {:?}",
            mapping.target_line_transition
        );
    }
    Ok(mapping)
}

impl<E: ReasoningEngine> OntologyService<E> {
    pub fn new(engine: Arc<E>, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Resolve a research query. Blank queries resolve to the default
    /// mapping without an engine call.
    pub fn resolve(&self, query: &str) -> OntologyMapping {
        let query = query.trim();
        if query.is_empty() {
            return OntologyMapping::unknown();
        }

        let request = EngineRequest::new(EnginePurpose::OntologyResolution, render_prompt(query), self.timeout);
        match self.engine.complete(&request).and_then(|reply| parse_ontology(&reply)) {
            Ok(mapping) => {
                tracing::info!(
                    "Resolved ontology: {} ({} ICD, {} CPT, {} drugs, {})",
                    mapping.disease_name,
                    mapping.icd_codes.len(),
                    mapping.cpt_codes.len(),
                    mapping.drugs.len(),
                    mapping.target_line_transition
                );
                mapping
            }
            Err(e) => {
                tracing::warn!("Ontology resolution failed ({e}); using default mapping");
                OntologyMapping::unknown()
            }
        }
    }
}
