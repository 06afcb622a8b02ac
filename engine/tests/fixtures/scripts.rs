//! Scripts and engine builders shared by the integration tests

use std::sync::Arc;

use pubsub_engine::{ProcessorRegistry, PubSubEngine, RealHelpers, RealMetricsCollector};
use shared::Script;

use super::RecordingClient;

pub fn parse_script(yaml: &str) -> Script {
    Script::from_yaml_str(yaml).expect("test script should parse")
}

/// Engine wired with real helpers and metrics and a recording client
pub fn build_engine(
    script: &Script,
    client: Arc<RecordingClient>,
    metrics: &RealMetricsCollector,
    processors: ProcessorRegistry,
) -> PubSubEngine {
    PubSubEngine::new(
        &script.config,
        Arc::new(metrics.clone()),
        Arc::new(RealHelpers::new()),
        client,
        processors,
    )
    .expect("test script should configure the engine")
}
