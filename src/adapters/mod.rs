//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reasoning engine over a JSON completion endpoint (reqwest)
//! - `offline`: engine used when no endpoint is configured
//! - `synthetic`: seeded demographic enrichment
//! - `sanitize`: identifier and secret filtering for logs

pub mod http;
pub mod offline;
pub mod sanitize;
pub mod synthetic;

pub use http::{ConfiguredEngine, EngineConfig, HttpReasoningEngine};
pub use offline::OfflineEngine;
pub use synthetic::SyntheticDemographics;
