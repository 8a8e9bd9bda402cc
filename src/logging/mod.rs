//! Cross-Platform System Logging for deskagent
//!
//! Two layers:
//! - `tracing` for console diagnostics, set up by [`init_tracing`]
//! - [`SystemLogger`] for the audit trail of tasks and steps, written to
//!   syslog on Linux, the Unified Log on macOS and `tracing` elsewhere
//!
//! Filter commands:
//! - Linux: `journalctl -t deskagent`
//! - macOS: `log show --predicate 'subsystem == "com.gtechsd.deskagent"'`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::EnvFilter;

/// Event IDs for filtering in system logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum EventId {
    // Informational (1000-1099)
    ServiceStart = 1000,
    ServiceStop = 1001,
    TaskReceived = 1010,
    PlanCreated = 1011,
    StepExecuted = 1012,
    TaskCompleted = 1020,

    // Errors (1200-1299)
    PlanUnavailable = 1200,
    StepFailed = 1230,
    ProviderFailed = 1240,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Structured audit event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentEvent {
    pub timestamp: DateTime<Utc>,
    pub event_id: EventId,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AgentEvent {
    pub fn new(event_id: EventId, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event_id,
            level,
            message: message.into(),
            task_id: None,
            task: None,
            action: None,
            success: None,
            reason: None,
        }
    }

    pub fn with_task_id(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        let task: String = task.into();
        // Truncate for log safety
        self.task = Some(if task.chars().count() > 500 {
            task.chars().take(500).collect()
        } else {
            task
        });
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Format for syslog-style output
    pub fn to_syslog_format(&self) -> String {
        let mut parts = vec![
            format!("DESKAGENT[{}]", self.event_id as u32),
            format!("level={}", self.level),
        ];

        if let Some(ref id) = self.task_id {
            parts.push(format!("task_id={}", &id[..8.min(id.len())]));
        }
        if let Some(ref task) = self.task {
            let escaped = task.replace('"', "\\\"").replace('\n', " ");
            parts.push(format!("task=\"{}\"", escaped));
        }
        if let Some(ref action) = self.action {
            parts.push(format!("action={}", action));
        }
        if let Some(success) = self.success {
            parts.push(format!("success={}", if success { "yes" } else { "no" }));
        }
        if let Some(ref reason) = self.reason {
            let escaped = reason.replace('"', "\\\"").replace('\n', " ");
            parts.push(format!("reason=\"{}\"", escaped));
        }

        parts.push(format!("msg={}", self.message));
        parts.join(" ")
    }
}

// Platform-specific implementations
#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "linux")]
pub use linux::SystemLogger;
#[cfg(target_os = "macos")]
pub use macos::SystemLogger;

// Everything else, Windows included, logs through tracing only
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod fallback;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub use fallback::SystemLogger;

/// Mirror an audit event to tracing for console output
fn trace_event(event: &AgentEvent, message: &str) {
    match event.level {
        LogLevel::Debug => tracing::debug!(target: "deskagent::audit", "{}", message),
        LogLevel::Info => tracing::info!(target: "deskagent::audit", "{}", message),
        LogLevel::Warning => tracing::warn!(target: "deskagent::audit", "{}", message),
        LogLevel::Error => tracing::error!(target: "deskagent::audit", "{}", message),
    }
}

/// Convenience functions
impl SystemLogger {
    pub fn service_start(&self, provider: &str, model: &str, addr: &str) {
        self.log(AgentEvent::new(
            EventId::ServiceStart,
            LogLevel::Info,
            format!("Service listening on {} using {} ({})", addr, provider, model),
        ));
    }

    pub fn service_stop(&self) {
        self.log(AgentEvent::new(
            EventId::ServiceStop,
            LogLevel::Info,
            "Service stopped",
        ));
    }

    pub fn task_received(&self, task_id: &str, task: &str) {
        self.log(
            AgentEvent::new(EventId::TaskReceived, LogLevel::Info, "Task received")
                .with_task_id(task_id)
                .with_task(task),
        );
    }

    pub fn plan_created(&self, task_id: &str, steps: usize) {
        self.log(
            AgentEvent::new(
                EventId::PlanCreated,
                LogLevel::Info,
                format!("Plan created with {} steps", steps),
            )
            .with_task_id(task_id),
        );
    }

    pub fn plan_unavailable(&self, task_id: &str, reason: &str) {
        self.log(
            AgentEvent::new(EventId::PlanUnavailable, LogLevel::Error, "No plan available")
                .with_task_id(task_id)
                .with_success(false)
                .with_reason(reason),
        );
    }

    pub fn provider_failed(&self, task_id: &str, provider: &str, reason: &str) {
        self.log(
            AgentEvent::new(
                EventId::ProviderFailed,
                LogLevel::Error,
                format!("Provider {} failed", provider),
            )
            .with_task_id(task_id)
            .with_success(false)
            .with_reason(reason),
        );
    }

    pub fn step_executed(&self, task_id: &str, step: usize, action: &str) {
        self.log(
            AgentEvent::new(
                EventId::StepExecuted,
                LogLevel::Info,
                format!("Step {} executed", step),
            )
            .with_task_id(task_id)
            .with_action(action)
            .with_success(true),
        );
    }

    pub fn step_failed(&self, task_id: &str, step: usize, action: &str, reason: &str) {
        self.log(
            AgentEvent::new(
                EventId::StepFailed,
                LogLevel::Warning,
                format!("Step {} failed", step),
            )
            .with_task_id(task_id)
            .with_action(action)
            .with_success(false)
            .with_reason(reason),
        );
    }

    pub fn task_completed(&self, task_id: &str, success: bool, summary: &str) {
        let level = if success { LogLevel::Info } else { LogLevel::Warning };
        self.log(
            AgentEvent::new(EventId::TaskCompleted, level, summary)
                .with_task_id(task_id)
                .with_success(success),
        );
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `debug` picks between debug and info
/// for this crate. Safe to call more than once; later calls are no-ops.
pub fn init_tracing(debug: bool, json: bool) {
    let default_level = if debug { "deskagent=debug,tower_http=debug" } else { "deskagent=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
