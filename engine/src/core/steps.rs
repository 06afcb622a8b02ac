//! Compiled steps that need no collaborator beyond the context

use std::sync::Arc;
use async_trait::async_trait;

use shared::vu_debug;
use crate::error::EngineResult;
use crate::traits::{EventEmitter, ProcessorRegistry, PubSubClient, Step};
use crate::types::{BatchSettings, ScenarioContext};

/// First step of every scenario: acquires the topic handle
pub struct SetupStep {
    client: Arc<dyn PubSubClient>,
    project: String,
    topic: String,
    batching: BatchSettings,
}

impl SetupStep {
    pub fn new(client: Arc<dyn PubSubClient>, project: String, topic: String) -> Self {
        Self {
            client,
            project,
            topic,
            batching: BatchSettings::default(),
        }
    }
}

#[async_trait]
impl Step for SetupStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        vu_debug!(context.vu, "Initializing Pub/Sub publisher for {}/{}", self.project, self.topic);
        let publisher = self.client.topic(&self.project, &self.topic, self.batching).await?;
        context.publisher = Some(publisher);
        Ok(())
    }
}

/// `{log: ...}` marker
pub struct LogStep {
    message: String,
}

impl LogStep {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

#[async_trait]
impl Step for LogStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        // Completes on the next scheduling tick, never inline
        tokio::task::yield_now().await;
        vu_debug!(context.vu, "log marker: {}", self.message);
        Ok(())
    }
}

/// `{function: name}` step, resolved against the registry when executed
pub struct FunctionStep {
    name: String,
    processors: Arc<ProcessorRegistry>,
    events: Arc<dyn EventEmitter>,
}

impl FunctionStep {
    pub fn new(name: String, processors: Arc<ProcessorRegistry>, events: Arc<dyn EventEmitter>) -> Self {
        Self { name, processors, events }
    }
}

#[async_trait]
impl Step for FunctionStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        match self.processors.get(&self.name) {
            Some(processor) => {
                processor.call(context, self.events.clone()).await;
            }
            None => {
                vu_debug!(context.vu, "No processor named '{}', skipping", self.name);
            }
        }
        Ok(())
    }
}

/// Unrecognized steps compile to this
pub struct NoopStep;

#[async_trait]
impl Step for NoopStep {
    async fn execute(&self, _context: &mut ScenarioContext) -> EngineResult<()> {
        Ok(())
    }
}
