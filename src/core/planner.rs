//! Task planning: prompt the provider for a JSON step list and validate it
//! into a [`Plan`].

use super::{Action, Plan, Step};
use crate::providers::{LlmProvider, ProviderError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Model response is not a JSON array")]
    NotAnArray,

    #[error("Invalid step {index}: {reason}")]
    InvalidStep { index: usize, reason: String },
}

const PLAN_PROMPT: &str = r#"You are a desktop automation agent. Create a step-by-step plan to accomplish this task.

TASK: "{task}"

AVAILABLE ACTIONS:
- open_app(name): Open an application (notepad, chrome, excel, calculator, etc.)
- type(text): Type text
- press(key): Press a key (enter, tab, escape, etc.)
- hotkey(keys): Press keyboard shortcut, keys as a list (["ctrl", "c"] for copy)
- click(x, y): Click at screen position
- wait(seconds): Wait for app to load
- screenshot(): Take screenshot to verify

Return a JSON array of steps. Each step has: action, params, description.

Example for "Open notepad and type hello":
[
  {"action": "open_app", "params": {"name": "notepad"}, "description": "Open Notepad"},
  {"action": "wait", "params": {"seconds": 1}, "description": "Wait for Notepad to load"},
  {"action": "type", "params": {"text": "hello"}, "description": "Type hello"}
]

Return ONLY valid JSON array, no other text."#;

static FENCE_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_+-]*\s*").expect("valid fence regex"));
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*```$").expect("valid fence regex"));

/// Builds plans for tasks using the configured provider
pub struct Planner {
    provider: Arc<dyn LlmProvider>,
}

impl Planner {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn build_prompt(task: &str) -> String {
        PLAN_PROMPT.replace("{task}", task)
    }

    pub async fn plan(&self, task: &str) -> Result<Plan, PlanError> {
        let prompt = Self::build_prompt(task);
        let response = self.provider.generate(&prompt).await?;
        tracing::debug!(provider = self.provider.name(), chars = response.len(), "Plan response received");
        parse_plan(&response)
    }
}

/// Remove a wrapping Markdown code fence (with optional language tag)
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let start = FENCE_OPEN.find(trimmed).map(|m| m.end()).unwrap_or(0);
    let body = &trimmed[start..];
    let end = FENCE_CLOSE.find(body).map(|m| m.start()).unwrap_or(body.len());
    &body[..end]
}

/// Parse and validate raw model output into a plan
pub fn parse_plan(response: &str) -> Result<Plan, PlanError> {
    let body = strip_code_fence(response);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => extract_array(body).ok_or_else(|| PlanError::InvalidJson(e.to_string()))?,
    };

    let Value::Array(entries) = value else {
        return Err(PlanError::NotAnArray);
    };

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_step(i, entry))
        .collect()
}

/// Fallback for prose around the array: parse the outermost `[...]` slice
fn extract_array(body: &str) -> Option<Value> {
    let start = body.find('[')?;
    let end = body.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&body[start..=end])
        .ok()
        .filter(Value::is_array)
}

fn parse_step(index: usize, entry: &Value) -> Result<Step, PlanError> {
    let invalid = |reason: String| PlanError::InvalidStep {
        index: index + 1,
        reason,
    };

    let obj = entry
        .as_object()
        .ok_or_else(|| invalid("step is not an object".into()))?;

    let name = obj
        .get("action")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid("missing \"action\" string".into()))?;

    let empty = Map::new();
    let params = match obj.get("params") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => return Err(invalid("\"params\" must be an object".into())),
    };

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Step {}", index + 1));

    let action = parse_action(name, params).map_err(invalid)?;
    Ok(Step::new(action, description))
}

fn parse_action(name: &str, params: &Map<String, Value>) -> Result<Action, String> {
    let action = match name {
        "open_app" => Action::OpenApp {
            name: required_str(params, "name")?,
        },
        "type" => Action::Type {
            text: params
                .get("text")
                .and_then(Value::as_str)
                .ok_or("type requires a \"text\" string")?
                .to_string(),
        },
        "press" => Action::Press {
            key: required_str(params, "key")?,
        },
        "hotkey" => Action::Hotkey {
            keys: parse_keys(params.get("keys"))?,
        },
        "click" => {
            let x = params.get("x").map(|v| as_coordinate(v, "x")).transpose()?;
            let y = params.get("y").map(|v| as_coordinate(v, "y")).transpose()?;
            match (x, y) {
                (Some(x), Some(y)) => Action::Click { position: Some((x, y)) },
                (None, None) => Action::Click { position: None },
                _ => return Err("click requires both \"x\" and \"y\" or neither".into()),
            }
        }
        "wait" => {
            let seconds = match params.get("seconds") {
                None | Some(Value::Null) => 1.0,
                Some(v) => as_number(v).ok_or("wait \"seconds\" must be a number")?,
            };
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(format!("wait \"seconds\" must be non-negative, got {seconds}"));
            }
            Action::Wait { seconds }
        }
        "screenshot" => Action::Screenshot,
        other => Action::Unknown {
            name: other.to_string(),
        },
    };
    Ok(action)
}

fn required_str(params: &Map<String, Value>, field: &str) -> Result<String, String> {
    params
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("missing \"{field}\" string"))
}

/// Keys arrive as a list or as a "ctrl, c" / "ctrl+c" string
fn parse_keys(value: Option<&Value>) -> Result<Vec<String>, String> {
    let keys: Vec<String> = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| "hotkey \"keys\" must contain strings".to_string())
            })
            .collect::<Result<_, _>>()?,
        Some(Value::String(s)) => {
            let sep = if s.contains(',') { ',' } else { '+' };
            s.split(sep).map(|k| k.trim().to_string()).collect()
        }
        _ => return Err("hotkey requires \"keys\"".into()),
    };

    let keys: Vec<String> = keys.into_iter().filter(|k| !k.is_empty()).collect();
    if keys.is_empty() {
        return Err("hotkey requires at least one key".into());
    }
    Ok(keys)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_coordinate(value: &Value, field: &str) -> Result<i32, String> {
    as_number(value)
        .filter(|n| n.is_finite() && n.abs() <= i32::MAX as f64)
        .map(|n| n.round() as i32)
        .ok_or_else(|| format!("click \"{field}\" must be a number"))
}
