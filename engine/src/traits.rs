//! Engine trait definitions for dependency injection

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use serde_json::Value;

use shared::{LoopCount, ThinkDefaults, ThinkSpec};
use crate::error::EngineResult;
use crate::types::{BatchSettings, EngineEvent, OutgoingMessage, ScenarioContext};

/// An executable step of a compiled scenario
#[async_trait]
pub trait Step: Send + Sync {
    /// Run the step against the scenario context
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()>;
}

/// Builders and templating supplied by the runner hosting the engine
#[cfg_attr(test, mockall::automock)]
pub trait Helpers: Send + Sync {
    /// Wrap compiled steps in a step that repeats them `count` times
    fn create_loop_with_count(&self, count: LoopCount, steps: Vec<Arc<dyn Step>>) -> Arc<dyn Step>;

    /// Build a step that pauses for the think duration
    fn create_think(&self, think: &ThinkSpec, defaults: &ThinkDefaults) -> Arc<dyn Step>;

    /// Substitute placeholders in `template` using the context variables
    fn template(&self, template: &Value, context: &ScenarioContext) -> EngineResult<Value>;
}

/// Sink for scenario events and metrics
#[cfg_attr(test, mockall::automock)]
pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// A user-supplied function invoked by `{function: name}` steps
#[async_trait]
pub trait Processor: Send + Sync {
    /// Returning signals completion
    async fn call(&self, context: &mut ScenarioContext, events: Arc<dyn EventEmitter>);
}

/// Named processors available to function steps
pub type ProcessorRegistry = HashMap<String, Arc<dyn Processor>>;

/// Publisher bound to one project/topic pair
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Publish one message, returning the server-assigned message id
    async fn publish_message(&self, message: OutgoingMessage) -> EngineResult<String>;
}

/// Client that hands out topic publishers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn topic(
        &self,
        project: &str,
        topic: &str,
        batching: BatchSettings,
    ) -> EngineResult<Arc<dyn TopicPublisher>>;
}
