//! Load-test script schema
//!
//! A script carries a `config` section (destination, engine options,
//! defaults, variables) and a list of scenarios, each with an ordered flow
//! of declarative steps.

pub mod step;

pub use step::{DeclarativeStep, LoopCount, MessageSpec, ThinkSpec};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use crate::errors::{SharedError, SharedResult};

/// Engine name scenarios use to select this engine
pub const ENGINE_NAME: &str = "gcppubsub";

/// A complete load-test script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub config: ScriptConfig,

    #[serde(default)]
    pub scenarios: Vec<ScenarioSpec>,
}

/// The `config` section of a script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Kept for compatibility with HTTP-centric runners; never used for publishing
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    #[serde(default)]
    pub engines: EnginesConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Initial template variables for every scenario run
    #[serde(default)]
    pub variables: HashMap<String, Value>,
}

/// Per-engine option blocks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnginesConfig {
    #[serde(default)]
    pub gcppubsub: Option<EngineOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(default)]
    pub dryrun: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub think: ThinkDefaults,
}

/// Defaults applied to every think step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThinkDefaults {
    /// Random spread applied to think durations, as a percentage (0-100)
    #[serde(default)]
    pub jitter: Option<f64>,
}

/// One scenario of a script
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSpec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub engine: Option<String>,

    #[serde(default)]
    pub flow: Option<Vec<DeclarativeStep>>,
}

impl ScenarioSpec {
    /// Steps of the flow; an absent or null flow is empty
    pub fn flow(&self) -> &[DeclarativeStep] {
        self.flow.as_deref().unwrap_or_default()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// Whether this scenario should run on the Pub/Sub engine
    pub fn targets_engine(&self) -> bool {
        self.engine.as_deref().is_none_or(|engine| engine == ENGINE_NAME)
    }
}

impl ScriptConfig {
    pub fn dry_run(&self) -> bool {
        self.engines.gcppubsub.as_ref().is_some_and(|opts| opts.dryrun)
    }
}

impl Script {
    /// Load a script file, choosing the format from the extension
    pub fn load(path: impl AsRef<Path>) -> SharedResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SharedError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Self::from_json_str(&contents),
        }
    }

    pub fn from_yaml_str(contents: &str) -> SharedResult<Self> {
        serde_yaml::from_str(contents).map_err(|e| SharedError::ScriptParse { message: e.to_string() })
    }

    pub fn from_json_str(contents: &str) -> SharedResult<Self> {
        serde_json::from_str(contents).map_err(|e| SharedError::ScriptParse { message: e.to_string() })
    }

    /// Find a scenario by name
    pub fn scenario(&self, name: &str) -> Option<&ScenarioSpec> {
        self.scenarios.iter().find(|scenario| scenario.name.as_deref() == Some(name))
    }
}
