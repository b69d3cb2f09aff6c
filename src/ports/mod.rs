//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (reasoning engine,
//! demographic sources, outcome labels).

mod demographics;
mod outcome;
mod reasoning_engine;
mod risk_scorer;

pub use demographics::DemographicSource;
pub use outcome::OutcomeLabeler;
pub use reasoning_engine::{EngineError, EnginePurpose, EngineRequest, ReasoningEngine};
pub use risk_scorer::{RiskScorer, ScoringRequest, SubjectScore};
