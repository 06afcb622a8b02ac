//! Pub/Sub engine implementation with dependency injection

use std::sync::Arc;

use shared::{DeclarativeStep, ScenarioSpec, ScriptConfig};
use crate::core::{Scenario, SetupStep, StepCompiler};
use crate::error::EngineResult;
use crate::traits::{EventEmitter, Helpers, ProcessorRegistry, PubSubClient, Step};
use crate::types::EngineSettings;

/// Turns scenario specs into runnable scenarios that publish to one topic
pub struct PubSubEngine {
    settings: Arc<EngineSettings>,
    compiler: StepCompiler,
    client: Arc<dyn PubSubClient>,
    events: Arc<dyn EventEmitter>,
}

impl PubSubEngine {
    /// Create a new engine; fails when project or topic is missing
    pub fn new(
        config: &ScriptConfig,
        events: Arc<dyn EventEmitter>,
        helpers: Arc<dyn Helpers>,
        client: Arc<dyn PubSubClient>,
        processors: ProcessorRegistry,
    ) -> EngineResult<Self> {
        let settings = EngineSettings::from_config(config)?;
        Ok(Self::with_settings(settings, config, events, helpers, client, processors))
    }

    /// Create an engine from already validated settings
    pub fn with_settings(
        settings: EngineSettings,
        config: &ScriptConfig,
        events: Arc<dyn EventEmitter>,
        helpers: Arc<dyn Helpers>,
        client: Arc<dyn PubSubClient>,
        processors: ProcessorRegistry,
    ) -> Self {
        let settings = Arc::new(settings);
        let compiler = StepCompiler::new(
            settings.clone(),
            helpers,
            events.clone(),
            Arc::new(processors),
            config.defaults.think.clone(),
        );

        Self { settings, compiler, client, events }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compile a single declarative step
    pub fn step(&self, step: &DeclarativeStep) -> Arc<dyn Step> {
        self.compiler.compile(step)
    }

    /// Compile a scenario spec into a runnable scenario
    pub fn create_scenario(&self, spec: &ScenarioSpec) -> Scenario {
        let setup = Arc::new(SetupStep::new(
            self.client.clone(),
            self.settings.project.clone(),
            self.settings.topic.clone(),
        ));
        let steps = self.compiler.compile_all(spec.flow());

        Scenario::new(spec.display_name(), setup, steps, self.events.clone())
    }
}
