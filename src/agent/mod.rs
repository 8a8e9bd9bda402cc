//! Request routing
//!
//! Every task string goes down exactly one branch, checked in order:
//! empty input, help phrase, a direct `open <app>` command, or the full
//! planner + executor path.

use crate::actions::{ActionLibrary, SystemDesktop};
use crate::core::{AgentConfig, ExecutionResult, Executor, PlanError, Planner};
use crate::logging::SystemLogger;
use crate::providers::{self, LlmProvider};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const HELP_PHRASES: &[&str] = &["help", "?", "hi", "hello"];

pub const NO_INPUT: &str = "No input provided";
pub const NO_PLAN: &str = "Could not create plan. Check your LLM configuration.";

/// A standalone `and`/`then`, a comma or a semicolon marks a follow-up
/// instruction after the application name
static FOLLOW_UP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(and|then)\b|[,;]").expect("valid follow-up regex"));

/// Reply returned to API and CLI callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

/// Which branch a task takes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Empty,
    Help,
    OpenApp(&'a str),
    Plan(&'a str),
}

impl<'a> Route<'a> {
    pub fn classify(input: &'a str) -> Self {
        let task = input.trim();
        if task.is_empty() {
            return Route::Empty;
        }

        let lower = task.to_lowercase();
        if HELP_PHRASES.contains(&lower.as_str()) {
            return Route::Help;
        }

        let is_open = task
            .get(..5)
            .map_or(false, |prefix| prefix.eq_ignore_ascii_case("open "));
        if is_open {
            let app = task[5..].trim();
            if !app.is_empty() && !FOLLOW_UP.is_match(app) {
                return Route::OpenApp(app);
            }
        }

        Route::Plan(task)
    }
}

pub fn help_text(provider: &str) -> String {
    format!(
        "DESKTOP AUTOMATION AGENT

Just describe what you want to do:

Examples:
  \"Open calculator\"
  \"Open notepad and type Hello World\"
  \"Open Chrome and search for Python tutorials\"
  \"Take a screenshot\"

The agent will plan and execute the steps automatically.

Powered by: {}",
        provider.to_uppercase()
    )
}

/// Render a finished execution for the user
pub fn format_execution(task: &str, result: &ExecutionResult) -> String {
    let steps: Vec<String> = result
        .results
        .iter()
        .map(|r| match (r.success, &r.message) {
            (true, _) => format!("  ✓ {}", r.description),
            (false, Some(error)) => format!("  ✗ {} ({})", r.description, error),
            (false, None) => format!("  ✗ {}", r.description),
        })
        .collect();

    format!(
        "Task: {}\n\nSteps:\n{}\n\n{}",
        task,
        steps.join("\n"),
        result.message
    )
}

/// The desktop agent: routes tasks, plans them and runs the plans
pub struct Agent {
    config: Arc<AgentConfig>,
    planner: Planner,
    executor: Arc<Executor>,
    audit: SystemLogger,
}

impl Agent {
    pub fn new(
        config: Arc<AgentConfig>,
        provider: Arc<dyn LlmProvider>,
        actions: Arc<ActionLibrary>,
    ) -> Self {
        Self {
            config,
            planner: Planner::new(provider),
            executor: Arc::new(Executor::new(actions)),
            audit: SystemLogger::new(),
        }
    }

    /// Agent driving the real desktop with the configured provider
    pub fn from_config(config: AgentConfig) -> Self {
        let provider = providers::from_config(&config);
        let actions = ActionLibrary::new(Arc::new(SystemDesktop::new()));
        Self::new(Arc::new(config), provider, Arc::new(actions))
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.planner.provider()
    }

    pub fn audit(&self) -> &SystemLogger {
        &self.audit
    }

    pub async fn process(&self, input: &str) -> AgentReply {
        match Route::classify(input) {
            Route::Empty => AgentReply::err(NO_INPUT),
            Route::Help => AgentReply::ok(help_text(self.provider().name())),
            Route::OpenApp(app) => self.open_app(app).await,
            Route::Plan(task) => self.run_task(task).await,
        }
    }

    async fn open_app(&self, app: &str) -> AgentReply {
        let executor = self.executor.clone();
        let name = app.to_string();
        let outcome = match tokio::task::spawn_blocking(move || executor.actions().open_app(&name)).await {
            Ok(outcome) => outcome,
            Err(e) => return AgentReply::err(format!("Execution aborted: {}", e)),
        };

        AgentReply {
            success: outcome.success,
            message: outcome.message,
            error: outcome.error,
        }
    }

    async fn run_task(&self, task: &str) -> AgentReply {
        let task_id = uuid::Uuid::new_v4().to_string();
        self.audit.task_received(&task_id, task);

        let plan = match self.planner.plan(task).await {
            Ok(plan) => plan,
            Err(e) => {
                if let PlanError::Provider(ref provider_error) = e {
                    self.audit.provider_failed(
                        &task_id,
                        self.provider().name(),
                        &provider_error.to_string(),
                    );
                }
                self.audit.plan_unavailable(&task_id, &e.to_string());
                return AgentReply::err(NO_PLAN);
            }
        };
        self.audit.plan_created(&task_id, plan.len());

        let executor = self.executor.clone();
        let steps = plan.clone();
        let result = match tokio::task::spawn_blocking(move || executor.run(&steps)).await {
            Ok(result) => result,
            Err(e) => return AgentReply::err(format!("Execution aborted: {}", e)),
        };

        for (record, step) in result.results.iter().zip(&plan) {
            if record.success {
                self.audit.step_executed(&task_id, record.step, step.action.name());
            } else {
                self.audit.step_failed(
                    &task_id,
                    record.step,
                    step.action.name(),
                    record.message.as_deref().unwrap_or_default(),
                );
            }
        }
        self.audit
            .task_completed(&task_id, result.success, &result.message);

        AgentReply {
            success: result.success,
            message: Some(format_execution(task, &result)),
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionTiming, MockDesktop};
    use crate::providers::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        reply: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn model(&self) -> &str {
            "stub-1"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| ProviderError::Api("connection refused".into()))
        }
    }

    fn agent(reply: Option<&str>) -> (Agent, Arc<StubProvider>, Arc<MockDesktop>) {
        let provider = Arc::new(StubProvider {
            reply: reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        });
        let desktop = Arc::new(MockDesktop::new());
        let actions = ActionLibrary::new(desktop.clone()).with_timing(ActionTiming::instant());
        let agent = Agent::new(
            Arc::new(AgentConfig::default()),
            provider.clone(),
            Arc::new(actions),
        );
        (agent, provider, desktop)
    }

    #[test]
    fn test_route_precedence() {
        assert_eq!(Route::classify("   "), Route::Empty);
        assert_eq!(Route::classify("HELP"), Route::Help);
        assert_eq!(Route::classify(" ? "), Route::Help);
        assert_eq!(Route::classify("open calculator"), Route::OpenApp("calculator"));
        assert_eq!(Route::classify("Open Visual Studio Code"), Route::OpenApp("Visual Studio Code"));
        assert_eq!(Route::classify("help me write a letter"), Route::Plan("help me write a letter"));
        assert_eq!(Route::classify("open"), Route::Plan("open"));
    }

    #[test]
    fn test_open_with_follow_up_goes_to_planner() {
        for task in [
            "open chrome and search",
            "open notepad then type hi",
            "open notepad, type hi",
            "open notepad; press enter",
        ] {
            assert_eq!(Route::classify(task), Route::Plan(task));
        }
        // "and" inside a word is not a connective
        assert_eq!(Route::classify("open android studio"), Route::OpenApp("android studio"));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (agent, provider, _) = agent(Some("[]"));
        let reply = agent.process("").await;
        assert_eq!(reply, AgentReply::err("No input provided"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_help_skips_planner() {
        let (agent, provider, _) = agent(Some("[]"));
        let reply = agent.process("hello").await;
        assert!(reply.success);
        assert!(reply.message.unwrap().ends_with("Powered by: STUB"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_open_dispatches_directly() {
        let (agent, provider, desktop) = agent(None);
        let reply = agent.process("open notepad").await;

        assert!(reply.success);
        assert!(reply.message.unwrap().contains("notepad"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(desktop.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_provider() {
        let (agent, provider, desktop) = agent(None);
        let reply = agent.process("open chrome and search").await;

        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some(NO_PLAN));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert!(desktop.calls().is_empty());
    }

    #[tokio::test]
    async fn test_garbage_plan_is_no_plan() {
        let (agent, _, _) = agent(Some("Sure! First, open the app."));
        let reply = agent.process("do something").await;
        assert_eq!(reply.error.as_deref(), Some(NO_PLAN));
    }

    #[tokio::test]
    async fn test_planned_task_formats_steps() {
        let plan = r#"```json
[
  {"action": "open_app", "params": {"name": "notepad"}, "description": "Open Notepad"},
  {"action": "type", "params": {"text": "hello"}, "description": "Type hello"}
]
```"#;
        let (agent, provider, desktop) = agent(Some(plan));
        let reply = agent.process("open notepad and type hello").await;

        assert!(reply.success);
        assert_eq!(
            reply.message.as_deref(),
            Some("Task: open notepad and type hello\n\nSteps:\n  ✓ Open Notepad\n  ✓ Type hello\n\nAll steps completed")
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(desktop.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_step_marks_reply() {
        let plan = r#"[
  {"action": "press", "params": {"key": "enter"}, "description": "Press enter"},
  {"action": "teleport", "params": {}, "description": "Teleport"},
  {"action": "press", "params": {"key": "tab"}, "description": "Press tab"}
]"#;
        let (agent, _, desktop) = agent(Some(plan));
        let reply = agent.process("do the impossible").await;

        assert!(!reply.success);
        let message = reply.message.unwrap();
        assert!(message.contains(
            "  ✓ Press enter\n  ✗ Teleport (Unknown action: teleport)\n\nExecution stopped due to error"
        ));
        assert!(!message.contains("Press tab"));
        assert_eq!(desktop.calls(), vec!["press enter"]);
    }
}
