//! Step compiler: declarative steps to executable steps

use std::sync::Arc;

use shared::{DeclarativeStep, ThinkDefaults};
use crate::core::fanout::MessageStep;
use crate::core::steps::{FunctionStep, LogStep, NoopStep};
use crate::traits::{EventEmitter, Helpers, ProcessorRegistry, Step};
use crate::types::EngineSettings;

/// Compiles declarative steps, recursing into loop bodies
#[derive(Clone)]
pub struct StepCompiler {
    settings: Arc<EngineSettings>,
    helpers: Arc<dyn Helpers>,
    events: Arc<dyn EventEmitter>,
    processors: Arc<ProcessorRegistry>,
    think_defaults: ThinkDefaults,
}

impl StepCompiler {
    pub fn new(
        settings: Arc<EngineSettings>,
        helpers: Arc<dyn Helpers>,
        events: Arc<dyn EventEmitter>,
        processors: Arc<ProcessorRegistry>,
        think_defaults: ThinkDefaults,
    ) -> Self {
        Self { settings, helpers, events, processors, think_defaults }
    }

    /// Compile one declarative step
    pub fn compile(&self, step: &DeclarativeStep) -> Arc<dyn Step> {
        match step {
            DeclarativeStep::Loop { steps, count } => {
                let body = self.compile_all(steps);
                self.helpers.create_loop_with_count(*count, body)
            }
            DeclarativeStep::Think(think) => self.helpers.create_think(think, &self.think_defaults),
            DeclarativeStep::Function { name } => Arc::new(FunctionStep::new(
                name.clone(),
                self.processors.clone(),
                self.events.clone(),
            )),
            DeclarativeStep::Log { message } => Arc::new(LogStep::new(message.clone())),
            DeclarativeStep::Message(spec) => Arc::new(MessageStep::new(
                spec.clone(),
                self.settings.clone(),
                self.helpers.clone(),
                self.events.clone(),
            )),
            DeclarativeStep::Unrecognized(_) => Arc::new(NoopStep),
        }
    }

    /// Compile a sequence of steps in order
    pub fn compile_all(&self, steps: &[DeclarativeStep]) -> Vec<Arc<dyn Step>> {
        steps.iter().map(|step| self.compile(step)).collect()
    }
}
