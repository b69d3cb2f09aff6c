//! # CohortLens
//!
//! Claims-driven cohort risk pipeline.
//!
//! This crate provides:
//! - Schema inference and normalization of raw claims CSV exports
//! - Reproducible train/test cohort splits
//! - Batched risk inference against a reasoning engine, with graceful fallback
//! - Validation metrics against simulated outcomes
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (Subject, OntologyMapping, CohortConfig, metrics)
//! - `ports`: Trait definitions for the reasoning engine and other seams
//! - `adapters`: Concrete implementations (HTTP engine, synthetic demographics)
//! - `application`: Use cases orchestrating domain and ports

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{Pipeline, PipelineReport};
pub use domain::{CohortConfig, OntologyMapping, RiskCategory, Subject, ValidationMetrics};

/// Result type for CohortLens operations
pub type Result<T> = std::result::Result<T, CohortLensError>;

/// Main error type for CohortLens
#[derive(Debug, thiserror::Error)]
pub enum CohortLensError {
    #[error("Schema inference failed: {0}")]
    Schema(#[from] application::schema::SchemaError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
