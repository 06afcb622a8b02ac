//! Pub/Sub REST client
//!
//! Publishes through `POST /v1/projects/{project}/topics/{topic}:publish`.
//! Talks to the emulator when `PUBSUB_EMULATOR_HOST` is set, otherwise to
//! the public endpoint with a bearer token.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::traits::{PubSubClient, TopicPublisher};
use crate::types::{BatchSettings, OutgoingMessage};

pub const DEFAULT_ENDPOINT: &str = "https://pubsub.googleapis.com";
pub const EMULATOR_HOST_VAR: &str = "PUBSUB_EMULATOR_HOST";
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Real Pub/Sub client over HTTP
#[derive(Clone)]
pub struct RestPubSubClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
}

impl RestPubSubClient {
    /// Create a client for an explicit endpoint
    pub fn new(endpoint: impl Into<String>, access_token: Option<String>) -> EngineResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pubsub-engine/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EngineError::Http { message: e.to_string() })?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// Create a client from `PUBSUB_EMULATOR_HOST` / `GOOGLE_OAUTH_ACCESS_TOKEN`
    pub fn from_env() -> EngineResult<Self> {
        match std::env::var(EMULATOR_HOST_VAR) {
            Ok(host) if !host.is_empty() => Self::new(emulator_endpoint(&host), None),
            _ => Self::new(DEFAULT_ENDPOINT, std::env::var(ACCESS_TOKEN_VAR).ok()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn publish_url(&self, project: &str, topic: &str) -> String {
        format!("{}/v1/projects/{}/topics/{}:publish", self.endpoint, project, topic)
    }
}

pub(crate) fn emulator_endpoint(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

#[async_trait]
impl PubSubClient for RestPubSubClient {
    async fn topic(
        &self,
        project: &str,
        topic: &str,
        batching: BatchSettings,
    ) -> EngineResult<Arc<dyn TopicPublisher>> {
        Ok(Arc::new(RestTopicPublisher {
            http: self.http.clone(),
            url: self.publish_url(project, topic),
            access_token: self.access_token.clone(),
            batching,
        }))
    }
}

/// Topic handle that publishes one message per request
pub struct RestTopicPublisher {
    http: reqwest::Client,
    url: String,
    access_token: Option<String>,
    batching: BatchSettings,
}

impl RestTopicPublisher {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Batching policy requested at acquisition
    pub fn batching(&self) -> BatchSettings {
        self.batching
    }
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    messages: [WireMessage<'a>; 1],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    data: String,
    #[serde(skip_serializing_if = "no_attributes")]
    attributes: &'a HashMap<String, String>,
}

fn no_attributes(attributes: &&HashMap<String, String>) -> bool {
    attributes.is_empty()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

#[async_trait]
impl TopicPublisher for RestTopicPublisher {
    async fn publish_message(&self, message: OutgoingMessage) -> EngineResult<String> {
        let body = PublishRequest {
            messages: [WireMessage {
                data: STANDARD.encode(&message.data),
                attributes: &message.attributes,
            }],
        };

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EngineError::publish(format!("request to {} failed: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EngineError::publish(format!("HTTP {status}: {text}")));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| EngineError::publish(format!("invalid publish response: {e}")))?;

        let message_id = parsed
            .message_ids
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::publish("publish response contained no message id"))?;

        debug!("Pub/Sub accepted message {}", message_id);
        Ok(message_id)
    }
}
