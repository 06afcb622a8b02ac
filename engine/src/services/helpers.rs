//! Default loop/think builders and templating

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;

use shared::{LoopCount, ThinkDefaults, ThinkSpec};
use crate::error::EngineResult;
use crate::services::template::Templater;
use crate::traits::{Helpers, Step};
use crate::types::ScenarioContext;

/// Template variable holding the current (1-based) loop iteration
pub const LOOP_COUNT_VAR: &str = "$loopCount";

/// Real helpers backed by tokio timers and the built-in templater
#[derive(Debug, Clone, Default)]
pub struct RealHelpers {
    templater: Templater,
}

impl RealHelpers {
    pub fn new() -> Self {
        Self { templater: Templater::new() }
    }
}

impl Helpers for RealHelpers {
    fn create_loop_with_count(&self, count: LoopCount, steps: Vec<Arc<dyn Step>>) -> Arc<dyn Step> {
        Arc::new(LoopStep::new(count, steps))
    }

    fn create_think(&self, think: &ThinkSpec, defaults: &ThinkDefaults) -> Arc<dyn Step> {
        Arc::new(ThinkStep::new(think.duration, defaults.jitter))
    }

    fn template(&self, template: &Value, context: &ScenarioContext) -> EngineResult<Value> {
        self.templater.render(template, &context.vars)
    }
}

/// Runs its body sequentially, `count` times
pub struct LoopStep {
    count: LoopCount,
    steps: Vec<Arc<dyn Step>>,
}

impl LoopStep {
    pub fn new(count: LoopCount, steps: Vec<Arc<dyn Step>>) -> Self {
        Self { count, steps }
    }

    async fn run_iterations(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        let mut iteration: u64 = 0;

        loop {
            if let LoopCount::Times(n) = self.count {
                if iteration >= n {
                    return Ok(());
                }
            }

            iteration += 1;
            context.vars.insert(LOOP_COUNT_VAR.to_string(), Value::from(iteration));
            for step in &self.steps {
                step.execute(context).await?;
            }

            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Step for LoopStep {
    async fn execute(&self, context: &mut ScenarioContext) -> EngineResult<()> {
        // An enclosing loop gets its own counter back afterwards
        let outer = context.vars.remove(LOOP_COUNT_VAR);
        let result = self.run_iterations(context).await;

        match outer {
            Some(value) => {
                context.vars.insert(LOOP_COUNT_VAR.to_string(), value);
            }
            None => {
                context.vars.remove(LOOP_COUNT_VAR);
            }
        }

        result
    }
}

/// Pauses the scenario
pub struct ThinkStep {
    duration: Duration,
    jitter: Option<f64>,
}

impl ThinkStep {
    pub fn new(duration: Duration, jitter: Option<f64>) -> Self {
        Self { duration, jitter }
    }

    /// Base duration spread uniformly by +/- jitter percent
    pub fn effective_duration(&self) -> Duration {
        match self.jitter {
            Some(jitter) if jitter > 0.0 && !self.duration.is_zero() => {
                let spread = jitter.min(100.0) / 100.0;
                let factor = rand::thread_rng().gen_range((1.0 - spread)..=(1.0 + spread));
                self.duration.mul_f64(factor)
            }
            _ => self.duration,
        }
    }
}

#[async_trait]
impl Step for ThinkStep {
    async fn execute(&self, _context: &mut ScenarioContext) -> EngineResult<()> {
        let pause = self.effective_duration();
        tokio::time::sleep(pause).await;
        Ok(())
    }
}
