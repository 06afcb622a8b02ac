//! Scenario runner
//!
//! Runs the setup step and then every compiled top-level step in order,
//! threading one context through all of them. The first failure ends the run.

use std::sync::Arc;

use shared::vu_debug;
use crate::error::{EngineError, EngineResult};
use crate::traits::{EventEmitter, Step};
use crate::types::{EngineEvent, ScenarioContext, ScenarioState};

/// Final result of one scenario run
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub error: Option<EngineError>,
    pub context: ScenarioContext,
}

impl ScenarioOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> EngineResult<ScenarioContext> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.context),
        }
    }
}

/// A compiled scenario, runnable any number of times
#[derive(Clone)]
pub struct Scenario {
    name: String,
    setup: Arc<dyn Step>,
    steps: Vec<Arc<dyn Step>>,
    events: Arc<dyn EventEmitter>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        setup: Arc<dyn Step>,
        steps: Vec<Arc<dyn Step>>,
        events: Arc<dyn EventEmitter>,
    ) -> Self {
        Self { name: name.into(), setup, steps, events }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of compiled top-level steps, setup excluded
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the scenario to completion with the given context
    pub async fn run(&self, mut context: ScenarioContext) -> ScenarioOutcome {
        self.events.emit(EngineEvent::Started);
        context.state = ScenarioState::Running;

        let result = self.run_steps(&mut context).await;

        let error = match result {
            Ok(()) => {
                context.state = ScenarioState::Completed;
                None
            }
            Err(e) => {
                vu_debug!(context.vu, "Scenario '{}' failed: {}", self.name, e);
                context.state = ScenarioState::Failed;
                Some(e)
            }
        };

        ScenarioOutcome { error, context }
    }

    async fn run_steps(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        self.setup.execute(context).await?;
        for step in &self.steps {
            step.execute(context).await?;
        }
        Ok(())
    }
}
