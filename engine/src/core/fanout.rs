//! Message fan-out publisher
//!
//! A `{message: ...}` step renders its template `multiplier` times, one after
//! another, and then dispatches every rendered payload at once. The step
//! settles only after every dispatch has settled; any failed dispatch fails
//! the step with the first failure observed.

use std::sync::Arc;
use async_trait::async_trait;
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;

use shared::{MessageSpec, vu_debug};
use crate::error::{EngineError, EngineResult};
use crate::traits::{EventEmitter, Helpers, Step, TopicPublisher};
use crate::types::{
    EngineEvent, EngineSettings, OutgoingMessage, ScenarioContext, MESSAGES_PUBLISHED,
    PUBLISH_ERRORS, PUBLISH_LATENCY,
};

/// Compiled form of a publish step
pub struct MessageStep {
    spec: MessageSpec,
    settings: Arc<EngineSettings>,
    helpers: Arc<dyn Helpers>,
    events: Arc<dyn EventEmitter>,
}

impl MessageStep {
    pub fn new(
        spec: MessageSpec,
        settings: Arc<EngineSettings>,
        helpers: Arc<dyn Helpers>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self { spec, settings, helpers, events }
    }

    /// Render the template `multiplier` times, stopping at the first failure
    fn render_batch(
        &self,
        template: &Value,
        context: &ScenarioContext,
        multiplier: usize,
    ) -> EngineResult<Vec<Vec<u8>>> {
        let mut batch = Vec::new();

        for _ in 0..multiplier {
            let rendered = self.helpers.template(template, context).inspect_err(|e| {
                vu_debug!(context.vu, "Error processing template: {}", e);
            })?;
            let payload = serde_json::to_vec(&rendered)?;
            vu_debug!(
                context.vu,
                "Publishing message to topic ({}): {}",
                self.settings.topic,
                String::from_utf8_lossy(&payload)
            );
            batch.push(payload);
        }

        Ok(batch)
    }

    /// Publish one message and report its outcome
    async fn dispatch(
        &self,
        publisher: &dyn TopicPublisher,
        context: &ScenarioContext,
        message: OutgoingMessage,
    ) -> EngineResult<String> {
        match publisher.publish_message(message).await {
            Ok(message_id) => {
                vu_debug!(context.vu, "Message published with ID: {}", message_id);
                self.events.emit(EngineEvent::counter(MESSAGES_PUBLISHED, 1));
                self.events.emit(EngineEvent::histogram(PUBLISH_LATENCY, context.elapsed_ms()));
                Ok(message_id)
            }
            Err(e) => {
                vu_debug!(context.vu, "Error publishing message: {}", e);
                self.events.emit(EngineEvent::counter(PUBLISH_ERRORS, 1));
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Step for MessageStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        let template = self.spec.json.as_ref().ok_or(EngineError::MissingTemplate)?;

        let multiplier = self.spec.multiplier();
        if multiplier <= 0 {
            return Ok(());
        }

        // Dispatches only ever read the context
        let context: &ScenarioContext = context;
        let count = usize::try_from(multiplier).unwrap_or(usize::MAX);
        let batch = self.render_batch(template, context, count)?;

        if self.settings.dry_run {
            vu_debug!(context.vu, "Dry run: prepared {} message(s), nothing sent", batch.len());
            return Ok(());
        }

        let publisher = context.publisher.clone().ok_or(EngineError::PublisherNotInitialized)?;
        let attributes = self.spec.attributes.clone().unwrap_or_default();

        let mut in_flight: FuturesUnordered<_> = batch
            .into_iter()
            .map(|data| {
                let message = OutgoingMessage { data, attributes: attributes.clone() };
                self.dispatch(publisher.as_ref(), context, message)
            })
            .collect();

        let mut first_error = None;
        while let Some(result) = in_flight.next().await {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
