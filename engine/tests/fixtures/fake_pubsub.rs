//! In-memory Pub/Sub client that records every published message

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use serde_json::Value;

use pubsub_engine::{BatchSettings, EngineError, EngineResult, OutgoingMessage, PubSubClient, TopicPublisher};

/// Publisher that stores messages and can be told to reject some of them
#[derive(Default)]
pub struct RecordingPublisher {
    messages: Mutex<Vec<OutgoingMessage>>,

    /// 1-based publish call numbers that fail
    reject_calls: Vec<usize>,
    calls: Mutex<usize>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(reject_calls: Vec<usize>) -> Arc<Self> {
        Arc::new(Self { reject_calls, ..Self::default() })
    }

    pub fn messages(&self) -> Vec<OutgoingMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Published payloads parsed back into JSON
    pub fn payloads(&self) -> Vec<Value> {
        self.messages()
            .iter()
            .map(|message| serde_json::from_slice(&message.data).unwrap())
            .collect()
    }

    pub fn attributes(&self) -> Vec<HashMap<String, String>> {
        self.messages().into_iter().map(|message| message.attributes).collect()
    }
}

#[async_trait]
impl TopicPublisher for RecordingPublisher {
    async fn publish_message(&self, message: OutgoingMessage) -> EngineResult<String> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            *calls
        };
        tokio::task::yield_now().await;

        if self.reject_calls.contains(&call) {
            return Err(EngineError::publish(format!("rejected publish #{call}")));
        }

        self.messages.lock().unwrap().push(message);
        Ok(format!("msg-{call}"))
    }
}

/// Client handing out one shared recording publisher
pub struct RecordingClient {
    publisher: Arc<RecordingPublisher>,
    topics: Mutex<Vec<(String, String, BatchSettings)>>,
}

#[allow(dead_code)]
impl RecordingClient {
    pub fn new(publisher: Arc<RecordingPublisher>) -> Arc<Self> {
        Arc::new(Self { publisher, topics: Mutex::new(Vec::new()) })
    }

    /// Every `(project, topic, batching)` a publisher was requested for
    pub fn topics(&self) -> Vec<(String, String, BatchSettings)> {
        self.topics.lock().unwrap().clone()
    }
}

#[async_trait]
impl PubSubClient for RecordingClient {
    async fn topic(
        &self,
        project: &str,
        topic: &str,
        batching: BatchSettings,
    ) -> EngineResult<Arc<dyn TopicPublisher>> {
        self.topics
            .lock()
            .unwrap()
            .push((project.to_string(), topic.to_string(), batching));
        let publisher: Arc<dyn TopicPublisher> = self.publisher.clone();
        Ok(publisher)
    }
}
