//! Reasoning engine port: Trait for the external probabilistic reasoning service.
//!
//! Every request carries its own timeout. Adapters must map an elapsed
//! deadline to [`EngineError::Timeout`] so callers can degrade the same way
//! they do for transport failures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors surfaced by an external engine call.
///
/// All variants are recoverable: application services absorb them and
/// substitute fallback values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Engine call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Engine returned an empty response")]
    EmptyResponse,

    #[error("Malformed engine response: {0}")]
    Malformed(String),
}

/// What an engine call is for. Adapters may route or tag requests by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePurpose {
    OntologyResolution,
    RiskScoring,
    AnalystQuery,
}

/// A single prompt sent to the engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub purpose: EnginePurpose,
    pub prompt: String,

    /// Upper bound for the whole call
    pub timeout: Duration,
}

impl EngineRequest {
    #[must_use]
    pub fn new(purpose: EnginePurpose, prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            purpose,
            prompt: prompt.into(),
            timeout,
        }
    }
}

/// Trait for the external reasoning engine.
///
/// The engine is treated as an opaque text-in/text-out service. Response
/// validation is the caller's job.
pub trait ReasoningEngine: Send + Sync {
    /// Run one blocking completion.
    ///
    /// # Errors
    /// Returns `EngineError` on transport failure, timeout or an empty body.
    fn complete(&self, request: &EngineRequest) -> Result<String, EngineError>;
}
