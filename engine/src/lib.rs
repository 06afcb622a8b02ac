//! Pub/Sub load engine library
//!
//! This library compiles declarative load-test scenarios into executable
//! steps and fans publish steps out into templated Pub/Sub messages,
//! reporting latency and error metrics along the way.

pub mod error;
pub mod types;
pub mod traits;
pub mod engine_impl;
pub mod core;
pub mod services;

// Re-export main types
pub use error::{EngineError, EngineResult};
pub use types::*;
pub use traits::*;
pub use engine_impl::PubSubEngine;
pub use crate::core::{Scenario, ScenarioOutcome, StepCompiler};
pub use services::*;
