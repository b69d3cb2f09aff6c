//! Offline adapter: a ReasoningEngine that is never reachable.
//!
//! Used when no endpoint is configured, so every service runs its fallback.

use crate::ports::{EngineError, EngineRequest, ReasoningEngine};

#[derive(Debug, Clone, Default)]
pub struct OfflineEngine;

impl ReasoningEngine for OfflineEngine {
    fn complete(&self, request: &EngineRequest) -> Result<String, EngineError> {
        tracing::debug!("Offline engine refused {:?} request", request.purpose);
        Err(EngineError::Unavailable("no reasoning engine configured".to_string()))
    }
}
