//! Declarative scenario steps
//!
//! A step in a scenario flow is a loosely-shaped mapping (`{loop: [...]}`,
//! `{think: 1}`, `{message: {...}}`, ...). Parsing goes through
//! `serde_json::Value` so the same classification applies to YAML and JSON
//! scripts alike.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::errors::{SharedError, SharedResult};

/// Number of iterations a loop step runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Times(u64),
}

impl LoopCount {
    /// Absent and non-positive counts both mean "run forever".
    pub fn from_count(count: Option<i64>) -> Self {
        match count {
            Some(n) if n > 0 => LoopCount::Times(n as u64),
            _ => LoopCount::Infinite,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, LoopCount::Infinite)
    }
}

impl fmt::Display for LoopCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopCount::Infinite => write!(f, "infinite"),
            LoopCount::Times(n) => write!(f, "{n}"),
        }
    }
}

/// Pause duration of a think step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThinkSpec {
    pub duration: Duration,
}

impl ThinkSpec {
    pub fn from_secs_f64(secs: f64) -> SharedResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(SharedError::InvalidThink { value: secs.to_string() });
        }
        Ok(Self { duration: Duration::from_secs_f64(secs) })
    }

    /// Accepts seconds as a number, or a string with an optional `ms`/`s` suffix.
    pub fn from_value(value: &Value) -> SharedResult<Self> {
        match value {
            Value::Number(n) => {
                let secs = n
                    .as_f64()
                    .ok_or_else(|| SharedError::InvalidThink { value: n.to_string() })?;
                Self::from_secs_f64(secs)
            }
            Value::String(s) => Self::parse(s),
            other => Err(SharedError::InvalidThink { value: other.to_string() }),
        }
    }

    fn parse(raw: &str) -> SharedResult<Self> {
        let trimmed = raw.trim();
        let invalid = || SharedError::InvalidThink { value: raw.to_string() };

        if let Some(ms) = trimmed.strip_suffix("ms") {
            let ms: f64 = ms.trim().parse().map_err(|_| invalid())?;
            return Self::from_secs_f64(ms / 1000.0).map_err(|_| invalid());
        }

        let secs = trimmed.strip_suffix('s').unwrap_or(trimmed);
        let secs: f64 = secs.trim().parse().map_err(|_| invalid())?;
        Self::from_secs_f64(secs).map_err(|_| invalid())
    }
}

/// Parameters of a publish step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageSpec {
    /// Payload template; `None` when absent or `null`
    #[serde(default)]
    pub json: Option<Value>,

    /// Fan-out factor, defaults to 1
    #[serde(default)]
    pub multiplier: Option<i64>,

    /// Message attributes; `None` when absent or `null`
    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
}

impl MessageSpec {
    pub fn multiplier(&self) -> i64 {
        self.multiplier.unwrap_or(1)
    }
}

/// One entry of a scenario flow
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarativeStep {
    /// `{loop: [steps...], count?: n}`
    Loop { steps: Vec<DeclarativeStep>, count: LoopCount },
    /// `{think: duration}`
    Think(ThinkSpec),
    /// `{function: name}`
    Function { name: String },
    /// `{log: message}`
    Log { message: String },
    /// `{message: {json, multiplier?, attributes?}}`
    Message(MessageSpec),
    /// Any other shape; executed as a no-op
    Unrecognized(Value),
}

impl DeclarativeStep {
    /// Classify a raw step value.
    ///
    /// Keys are checked in the order loop, log, think, function, message.
    /// A key holding `null` is treated as absent.
    pub fn from_value(value: Value) -> SharedResult<Self> {
        let Some(object) = value.as_object() else {
            return Ok(DeclarativeStep::Unrecognized(value));
        };

        if let Some(body) = present(object, "loop") {
            let Value::Array(items) = body else {
                return Err(SharedError::InvalidStep {
                    message: format!("loop must be a list of steps, got {body}"),
                });
            };
            let steps = items
                .iter()
                .cloned()
                .map(DeclarativeStep::from_value)
                .collect::<SharedResult<Vec<_>>>()?;
            let count = match present(object, "count") {
                Some(count) => Some(count.as_i64().ok_or_else(|| SharedError::InvalidStep {
                    message: format!("loop count must be an integer, got {count}"),
                })?),
                None => None,
            };
            return Ok(DeclarativeStep::Loop { steps, count: LoopCount::from_count(count) });
        }

        if let Some(message) = present(object, "log") {
            let message = match message {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Ok(DeclarativeStep::Log { message });
        }

        if let Some(think) = present(object, "think") {
            return Ok(DeclarativeStep::Think(ThinkSpec::from_value(think)?));
        }

        if let Some(function) = present(object, "function").filter(|v| truthy(v)) {
            let name = match function {
                Value::String(name) => name.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Ok(DeclarativeStep::Unrecognized(value.clone())),
            };
            return Ok(DeclarativeStep::Function { name });
        }

        if let Some(message) = present(object, "message").filter(|v| truthy(v)) {
            // Anything but an object carries no template and fails when run
            if !message.is_object() {
                return Ok(DeclarativeStep::Message(MessageSpec::default()));
            }
            let mut spec: MessageSpec = serde_json::from_value(message.clone()).map_err(|e| {
                SharedError::InvalidStep { message: format!("invalid message step: {e}") }
            })?;
            spec.json = spec.json.filter(truthy);
            return Ok(DeclarativeStep::Message(spec));
        }

        Ok(DeclarativeStep::Unrecognized(value))
    }

    /// Short name of the variant, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            DeclarativeStep::Loop { .. } => "loop",
            DeclarativeStep::Think(_) => "think",
            DeclarativeStep::Function { .. } => "function",
            DeclarativeStep::Log { .. } => "log",
            DeclarativeStep::Message(_) => "message",
            DeclarativeStep::Unrecognized(_) => "unrecognized",
        }
    }

    fn to_value(&self) -> Value {
        match self {
            DeclarativeStep::Loop { steps, count } => {
                let mut object = Map::new();
                object.insert("loop".into(), Value::Array(steps.iter().map(Self::to_value).collect()));
                if let LoopCount::Times(n) = count {
                    object.insert("count".into(), json!(n));
                }
                Value::Object(object)
            }
            DeclarativeStep::Think(think) => json!({ "think": think.duration.as_secs_f64() }),
            DeclarativeStep::Function { name } => json!({ "function": name }),
            DeclarativeStep::Log { message } => json!({ "log": message }),
            DeclarativeStep::Message(spec) => json!({ "message": spec }),
            DeclarativeStep::Unrecognized(value) => value.clone(),
        }
    }
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

/// `false`, `0`, `""` and `null` count as unset
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl<'de> Deserialize<'de> for DeclarativeStep {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        DeclarativeStep::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for DeclarativeStep {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}
