//! HTTP adapter: Implementation of ReasoningEngine over a JSON completion endpoint.
//!
//! Sends `{"model", "purpose", "prompt"}` as a POST body and accepts either a
//! JSON reply with a `text` field or a plain-text body.
//!
//! # Timeouts
//!
//! Each request carries its own deadline (`EngineRequest::timeout`), applied
//! to the whole call. An elapsed deadline maps to `EngineError::Timeout`.
//!
//! # Configuration
//!
//! - COHORTLENS_ENGINE_URL (unset: no HTTP engine, see [`ConfiguredEngine`])
//! - COHORTLENS_ENGINE_MODEL
//! - COHORTLENS_ENGINE_API_KEY (sent as a bearer token)
//! - COHORTLENS_ENGINE_TIMEOUT_MS

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ports::{EngineError, EnginePurpose, EngineRequest, ReasoningEngine};

use super::offline::OfflineEngine;

const DEFAULT_MODEL: &str = "default";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Connection settings for the HTTP engine.
#[derive(Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub url: String,
    pub model: String,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub timeout: Duration,
}

// Keep the API key out of logs.
impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Load from environment. Returns `None` if no endpoint is configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("COHORTLENS_ENGINE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())?;

        let mut cfg = Self::new(url);
        if let Ok(model) = std::env::var("COHORTLENS_ENGINE_MODEL") {
            if !model.trim().is_empty() {
                cfg.model = model.trim().to_string();
            }
        }
        cfg.api_key = std::env::var("COHORTLENS_ENGINE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Some(ms) = std::env::var("COHORTLENS_ENGINE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&ms| ms > 0)
        {
            cfg.timeout = Duration::from_millis(ms);
        }
        Some(cfg)
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    purpose: EnginePurpose,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct CompletionReply {
    text: String,
}

/// Extract the completion text from a response body.
fn extract_text(body: &str) -> Result<String, EngineError> {
    let text = match serde_json::from_str::<CompletionReply>(body) {
        Ok(reply) => reply.text,
        Err(_) => body.to_string(),
    };
    if text.trim().is_empty() {
        return Err(EngineError::EmptyResponse);
    }
    Ok(text)
}

/// Blocking HTTP reasoning engine.
pub struct HttpReasoningEngine {
    config: EngineConfig,
    client: reqwest::blocking::Client,
}

impl HttpReasoningEngine {
    /// Create a new HTTP engine.
    ///
    /// # Errors
    /// Returns `EngineError::Unavailable` if the HTTP client cannot be built.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EngineError::Unavailable(format!("HTTP client: {e}")))?;

        tracing::info!("Initializing HttpReasoningEngine ({}, model {})", config.url, config.model);
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl ReasoningEngine for HttpReasoningEngine {
    fn complete(&self, request: &EngineRequest) -> Result<String, EngineError> {
        let body = CompletionBody {
            model: &self.config.model,
            purpose: request.purpose,
            prompt: &request.prompt,
        };

        let mut builder = self
            .client
            .post(&self.config.url)
            .timeout(request.timeout)
            .json(&body);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout(request.timeout)
            } else {
                EngineError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Transport(format!("HTTP {status}")));
        }

        let text = response.text().map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout(request.timeout)
            } else {
                EngineError::Transport(e.to_string())
            }
        })?;
        extract_text(&text)
    }
}

/// Engine selected from configuration: HTTP when an endpoint is set,
/// offline otherwise.
pub enum ConfiguredEngine {
    Http(HttpReasoningEngine),
    Offline(OfflineEngine),
}

impl ConfiguredEngine {
    /// Build from environment.
    ///
    /// # Errors
    /// Returns `EngineError::Unavailable` if an endpoint is configured but
    /// the client cannot be built.
    pub fn from_env() -> Result<Self, EngineError> {
        match EngineConfig::from_env() {
            Some(cfg) => Ok(Self::Http(HttpReasoningEngine::new(cfg)?)),
            None => {
                tracing::warn!("COHORTLENS_ENGINE_URL not set; running with the offline engine");
                Ok(Self::Offline(OfflineEngine::default()))
            }
        }
    }

    /// Per-call timeout to use with this engine.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        match self {
            Self::Http(engine) => engine.config().timeout,
            Self::Offline(_) => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ReasoningEngine for ConfiguredEngine {
    fn complete(&self, request: &EngineRequest) -> Result<String, EngineError> {
        match self {
            Self::Http(engine) => engine.complete(request),
            Self::Offline(engine) => engine.complete(request),
        }
    }
}
