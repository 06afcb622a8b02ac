//! Engine core: step compilation, fan-out publishing, scenario sequencing

pub mod compiler;
pub mod fanout;
pub mod scenario;
pub mod steps;

#[cfg(test)]
pub mod tests;

pub use compiler::StepCompiler;
pub use fanout::MessageStep;
pub use scenario::{Scenario, ScenarioOutcome};
pub use steps::{FunctionStep, LogStep, NoopStep, SetupStep};
