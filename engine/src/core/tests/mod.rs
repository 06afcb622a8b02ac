//! Tests for the engine core
//!
//! Collaborators are mocked with mockall where call counts matter; the
//! recording fixtures below cover the rest.


use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::traits::{EventEmitter, MockHelpers, Step};
use crate::types::{EngineEvent, EngineSettings, ScenarioContext};

/// Event emitter that keeps everything it is given
#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingEvents {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn counter_total(&self, name: &str) -> u64 {
        self.events()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Counter { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .sum()
    }

    pub fn histogram_samples(&self, name: &str) -> Vec<f64> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Histogram { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }

    pub fn started_count(&self) -> usize {
        self.events().iter().filter(|event| **event == EngineEvent::Started).count()
    }
}

impl EventEmitter for RecordingEvents {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Appends its label to the `trace` variable
pub struct RecordStep(pub &'static str);

#[async_trait]
impl Step for RecordStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        let trace = context
            .vars
            .entry("trace".to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = trace {
            items.push(Value::from(self.0));
        }
        Ok(())
    }
}

/// Always fails with a publish error
pub struct FailStep(pub &'static str);

#[async_trait]
impl Step for FailStep {
    async fn execute(&self, _context: &mut ScenarioContext) -> EngineResult<()> {
        Err(EngineError::publish(self.0))
    }
}

/// Labels recorded by `RecordStep`s, in order
pub fn trace_of(context: &ScenarioContext) -> Vec<String> {
    match context.vars.get("trace") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

pub fn test_settings(dry_run: bool) -> Arc<EngineSettings> {
    Arc::new(EngineSettings {
        target: Some("http://localhost".to_string()),
        project: "test-project".to_string(),
        topic: "test-topic".to_string(),
        dry_run,
    })
}

/// Helpers whose template returns its input unchanged
pub fn passthrough_helpers(times: usize) -> MockHelpers {
    let mut helpers = MockHelpers::new();
    helpers
        .expect_template()
        .times(times)
        .returning(|template, _| Ok(template.clone()));
    helpers
}
