//! Engine data types

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use serde_json::Value;
use tokio::time::Instant;

use shared::{ScriptConfig, VirtualUserId};
use crate::error::{EngineError, EngineResult};
use crate::traits::TopicPublisher;

/// Counter incremented once per successfully published message
pub const MESSAGES_PUBLISHED: &str = "gcppubsub.messages_published";

/// Counter incremented once per failed publish call
pub const PUBLISH_ERRORS: &str = "gcppubsub.publish_errors";

/// Histogram of milliseconds between scenario start and publish completion
pub const PUBLISH_LATENCY: &str = "gcppubsub.publish_latency";

/// Validated engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Stored for compatibility only, nothing is sent to it
    pub target: Option<String>,
    pub project: String,
    pub topic: String,
    pub dry_run: bool,
}

impl EngineSettings {
    /// Validate the script config. Project and topic must be present and non-empty.
    pub fn from_config(config: &ScriptConfig) -> EngineResult<Self> {
        let project = required(config.project.as_deref())
            .ok_or_else(|| EngineError::config("'[project]' missing from environment config"))?;
        let topic = required(config.topic.as_deref())
            .ok_or_else(|| EngineError::config("'[topic]' missing from environment config"))?;

        Ok(Self {
            target: config.target.clone(),
            project,
            topic,
            dry_run: config.dry_run(),
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

fn required(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Batching policy requested when acquiring a topic handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// At most 1000 for Pub/Sub
    pub max_messages: usize,
    pub max_delay: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_messages: 1000,
            max_delay: Duration::from_secs(3),
        }
    }
}

/// A single rendered message handed to the publisher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub data: Vec<u8>,
    pub attributes: HashMap<String, String>,
}

/// Events reported to the metrics sink
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// One per scenario run
    Started,
    Counter { name: String, value: u64 },
    Histogram { name: String, value: f64 },
}

impl EngineEvent {
    pub fn counter(name: impl Into<String>, value: u64) -> Self {
        Self::Counter { name: name.into(), value }
    }

    pub fn histogram(name: impl Into<String>, value: f64) -> Self {
        Self::Histogram { name: name.into(), value }
    }
}

/// Lifecycle of one scenario run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

/// Mutable state threaded through every step of one scenario run
pub struct ScenarioContext {
    pub vu: VirtualUserId,

    /// Template variables
    pub vars: HashMap<String, Value>,

    /// Reference point for publish latency
    pub start_time: Instant,

    /// Topic handle, set by the setup step
    pub publisher: Option<Arc<dyn TopicPublisher>>,

    pub state: ScenarioState,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::with_vars(HashMap::new())
    }

    pub fn with_vars(vars: HashMap<String, Value>) -> Self {
        Self {
            vu: VirtualUserId::new(),
            vars,
            start_time: Instant::now(),
            publisher: None,
            state: ScenarioState::NotStarted,
        }
    }

    /// Milliseconds since the start-time marker
    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for ScenarioContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("vu", &self.vu)
            .field("vars", &self.vars)
            .field("start_time", &self.start_time)
            .field("publisher", &self.publisher.is_some())
            .field("state", &self.state)
            .finish()
    }
}
