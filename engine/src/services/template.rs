//! Placeholder templating for message payloads
//!
//! Strings may contain `{{ expr }}` placeholders. `expr` is either a variable
//! path (`user.id`, `items.0`) or a built-in such as `$randomNumber(1, 10)`.
//! A string that is exactly one placeholder takes the JSON value it resolves
//! to; anywhere else the value is interpolated as text.

use std::collections::HashMap;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

const DEFAULT_RANDOM_STRING_LEN: usize = 10;

/// Renders JSON templates against a variable map
#[derive(Debug, Clone)]
pub struct Templater {
    placeholder: Regex,
    whole: Regex,
    call: Regex,
}

impl Templater {
    pub fn new() -> Self {
        Self {
            placeholder: Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("valid placeholder pattern"),
            whole: Regex::new(r"^\{\{\s*([^{}]*?)\s*\}\}$").expect("valid placeholder pattern"),
            call: Regex::new(r"^\$(\w+)\((.*)\)$").expect("valid call pattern"),
        }
    }

    /// Render every string (and object key) in `template`
    pub fn render(&self, template: &Value, vars: &HashMap<String, Value>) -> EngineResult<Value> {
        match template {
            Value::String(s) => self.render_str(s, vars),
            Value::Array(items) => items
                .iter()
                .map(|item| self.render(item, vars))
                .collect::<EngineResult<Vec<_>>>()
                .map(Value::Array),
            Value::Object(object) => {
                let mut rendered = Map::with_capacity(object.len());
                for (key, value) in object {
                    let key = match self.render_str(key, vars)? {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    rendered.insert(key, self.render(value, vars)?);
                }
                Ok(Value::Object(rendered))
            }
            other => Ok(other.clone()),
        }
    }

    fn render_str(&self, s: &str, vars: &HashMap<String, Value>) -> EngineResult<Value> {
        if !s.contains("{{") {
            return Ok(Value::String(s.to_string()));
        }

        if let Some(caps) = self.whole.captures(s) {
            return self.evaluate(&caps[1], vars);
        }

        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        for caps in self.placeholder.captures_iter(s) {
            let Some(whole) = caps.get(0) else { continue };
            let literal = &s[last..whole.start()];
            check_literal(literal, s)?;
            out.push_str(literal);

            match self.evaluate(&caps[1], vars)? {
                Value::String(text) => out.push_str(&text),
                other => out.push_str(&other.to_string()),
            }
            last = whole.end();
        }
        let tail = &s[last..];
        check_literal(tail, s)?;
        out.push_str(tail);

        Ok(Value::String(out))
    }

    fn evaluate(&self, expr: &str, vars: &HashMap<String, Value>) -> EngineResult<Value> {
        if expr.is_empty() {
            return Err(EngineError::template("empty placeholder"));
        }

        if let Some(value) = lookup(expr, vars) {
            return Ok(value);
        }

        if let Some(caps) = self.call.captures(expr) {
            return call_builtin(&caps[1], &caps[2]);
        }

        if let Some(name) = expr.strip_prefix('$') {
            return call_builtin(name, "");
        }

        Err(EngineError::template(format!("undefined variable '{expr}'")))
    }
}

impl Default for Templater {
    fn default() -> Self {
        Self::new()
    }
}

fn check_literal(literal: &str, source: &str) -> EngineResult<()> {
    if literal.contains("{{") {
        return Err(EngineError::template(format!("unterminated placeholder in '{source}'")));
    }
    Ok(())
}

/// Resolve a dotted variable path
fn lookup(path: &str, vars: &HashMap<String, Value>) -> Option<Value> {
    let mut segments = path.split('.');
    let mut current = vars.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(object) => object.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current.clone())
}

fn call_builtin(name: &str, raw_args: &str) -> EngineResult<Value> {
    let args: Vec<&str> = raw_args
        .split(',')
        .map(str::trim)
        .filter(|arg| !arg.is_empty())
        .collect();

    match name {
        "randomNumber" => {
            let [min, max] = args.as_slice() else {
                return Err(EngineError::template("$randomNumber expects (min, max)"));
            };
            let min = parse_arg::<i64>(name, min)?;
            let max = parse_arg::<i64>(name, max)?;
            if min > max {
                return Err(EngineError::template(format!("$randomNumber: {min} > {max}")));
            }
            Ok(Value::from(rand::thread_rng().gen_range(min..=max)))
        }
        "randomString" => {
            let len = match args.as_slice() {
                [] => DEFAULT_RANDOM_STRING_LEN,
                [len] => parse_arg::<usize>(name, len)?,
                _ => return Err(EngineError::template("$randomString expects (length?)")),
            };
            let text: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(len)
                .map(char::from)
                .collect();
            Ok(Value::String(text))
        }
        "uuid" => Ok(Value::String(Uuid::new_v4().to_string())),
        "timestamp" => Ok(Value::from(Utc::now().timestamp_millis())),
        other => Err(EngineError::template(format!("unknown function '${other}'"))),
    }
}

fn parse_arg<T: std::str::FromStr>(function: &str, raw: &str) -> EngineResult<T> {
    raw.parse()
        .map_err(|_| EngineError::template(format!("${function}: invalid argument '{raw}'")))
}
