//! Shared types for the Pub/Sub load engine
//!
//! Contains the declarative script schema consumed by the engine, the
//! shared error type and the tracing setup used by the binary.

pub mod types;
pub mod errors;
pub mod logging;
pub mod script;

pub use types::*;
pub use errors::*;

pub use script::{
    // Script schema
    Script, ScriptConfig, EnginesConfig, EngineOptions, DefaultsConfig, ThinkDefaults,
    ScenarioSpec,

    // Declarative steps
    DeclarativeStep, LoopCount, MessageSpec, ThinkSpec,
};
