//! deskagent Core - plan types, planner, executor, configuration

pub mod config;
pub mod executor;
pub mod planner;

pub use config::{AgentConfig, ProviderKind};
pub use executor::Executor;
pub use planner::{parse_plan, strip_code_fence, PlanError, Planner};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One automation primitive with its typed parameters.
///
/// `Unknown` keeps an action name the model invented so the executor can
/// fail that single step instead of rejecting the whole plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    OpenApp { name: String },
    Type { text: String },
    Press { key: String },
    Hotkey { keys: Vec<String> },
    Click { position: Option<(i32, i32)> },
    Wait { seconds: f64 },
    Screenshot,
    Unknown { name: String },
}

impl Action {
    /// Wire name of the action as it appears in model output
    pub fn name(&self) -> &str {
        match self {
            Action::OpenApp { .. } => "open_app",
            Action::Type { .. } => "type",
            Action::Press { .. } => "press",
            Action::Hotkey { .. } => "hotkey",
            Action::Click { .. } => "click",
            Action::Wait { .. } => "wait",
            Action::Screenshot => "screenshot",
            Action::Unknown { name } => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::OpenApp { name } => write!(f, "open_app({name:?})"),
            Action::Type { text } => write!(f, "type({} chars)", text.chars().count()),
            Action::Press { key } => write!(f, "press({key})"),
            Action::Hotkey { keys } => write!(f, "hotkey({})", keys.join("+")),
            Action::Click { position: Some((x, y)) } => write!(f, "click({x}, {y})"),
            Action::Click { position: None } => write!(f, "click()"),
            Action::Wait { seconds } => write!(f, "wait({seconds}s)"),
            Action::Screenshot => write!(f, "screenshot()"),
            Action::Unknown { name } => write!(f, "{name}(?)"),
        }
    }
}

/// A planned step: what to do and how to describe it to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub action: Action,
    pub description: String,
}

impl Step {
    pub fn new(action: Action, description: impl Into<String>) -> Self {
        Self {
            action,
            description: description.into(),
        }
    }
}

/// Ordered steps; order is execution order
pub type Plan = Vec<Step>;

/// Result of a single Action Library call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            path: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Message for a success, error text for a failure
    pub fn summary(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

/// Per-step entry of an execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the plan
    pub step: usize,
    pub description: String,
    pub success: bool,
    pub message: Option<String>,
}

/// Aggregate result of running a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub results: Vec<StepRecord>,
    pub message: String,
}

impl ExecutionResult {
    pub fn steps_attempted(&self) -> usize {
        self.results.len()
    }

    /// First failed record, if execution stopped early
    pub fn failed_step(&self) -> Option<&StepRecord> {
        self.results.iter().find(|r| !r.success)
    }
}
