//! Plan execution
//!
//! Steps run strictly in order and execution stops at the first failed
//! outcome; later steps are never attempted. Everything here blocks, so
//! async callers run it under `spawn_blocking`.

use super::{Action, ExecutionResult, Outcome, Step, StepRecord};
use crate::actions::ActionLibrary;
use std::sync::Arc;

pub struct Executor {
    actions: Arc<ActionLibrary>,
}

impl Executor {
    pub fn new(actions: Arc<ActionLibrary>) -> Self {
        Self { actions }
    }

    pub fn actions(&self) -> &ActionLibrary {
        &self.actions
    }

    /// Dispatch one action to its primitive
    pub fn dispatch(&self, action: &Action) -> Outcome {
        let lib = &self.actions;
        match action {
            Action::OpenApp { name } => lib.open_app(name),
            Action::Type { text } => lib.type_text(text),
            Action::Press { key } => lib.press(key),
            Action::Hotkey { keys } => lib.hotkey(keys),
            Action::Click { position } => lib.click(*position),
            Action::Wait { seconds } => lib.wait(*seconds),
            Action::Screenshot => lib.screenshot(),
            Action::Unknown { name } => Outcome::err(format!("Unknown action: {}", name)),
        }
    }

    pub fn run(&self, plan: &[Step]) -> ExecutionResult {
        let mut results = Vec::with_capacity(plan.len());
        let step_pause = self.actions.timing().step_pause;

        for (i, step) in plan.iter().enumerate() {
            tracing::info!(
                step = i + 1,
                total = plan.len(),
                action = %step.action,
                "{}",
                step.description
            );

            let outcome = self.dispatch(&step.action);
            let success = outcome.success;
            results.push(StepRecord {
                step: i + 1,
                description: step.description.clone(),
                success,
                message: outcome.summary().map(str::to_string),
            });

            if !success {
                break;
            }

            // Let the UI settle before the next action
            if i + 1 < plan.len() && !step_pause.is_zero() {
                std::thread::sleep(step_pause);
            }
        }

        let success = results.iter().all(|r| r.success);
        ExecutionResult {
            success,
            results,
            message: if success {
                "All steps completed".to_string()
            } else {
                "Execution stopped due to error".to_string()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionTiming, MockDesktop};
    use std::time::{Duration, Instant};

    fn executor(desktop: MockDesktop) -> (Executor, Arc<MockDesktop>) {
        let desktop = Arc::new(desktop);
        let lib = ActionLibrary::new(desktop.clone()).with_timing(ActionTiming::instant());
        (Executor::new(Arc::new(lib)), desktop)
    }

    fn press(key: &str) -> Step {
        Step::new(Action::Press { key: key.into() }, format!("Press {}", key))
    }

    #[test]
    fn test_empty_plan_succeeds() {
        let (exec, _) = executor(MockDesktop::new());
        let result = exec.run(&[]);
        assert!(result.success);
        assert!(result.results.is_empty());
        assert_eq!(result.message, "All steps completed");
    }

    #[test]
    fn test_all_steps_succeed() {
        let (exec, desktop) = executor(MockDesktop::new());
        let plan = vec![
            Step::new(Action::OpenApp { name: "notepad".into() }, "Open Notepad"),
            Step::new(Action::Type { text: "hello".into() }, "Type hello"),
            press("enter"),
        ];

        let result = exec.run(&plan);
        assert!(result.success);
        assert_eq!(result.results.len(), 3);
        assert_eq!(
            result.results.iter().map(|r| r.step).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(result.results[1].message.as_deref(), Some("Typed: hello..."));
        assert_eq!(desktop.calls().len(), 3);
    }

    #[test]
    fn test_stops_at_first_failure() {
        for k in 1..=4 {
            let (exec, desktop) = executor(MockDesktop::new());
            let mut plan: Vec<Step> = (0..4).map(|_| press("a")).collect();
            plan[k - 1] = press("not-a-key");

            let result = exec.run(&plan);
            assert!(!result.success);
            assert_eq!(result.results.len(), k);
            assert!(!result.results[k - 1].success);
            assert!(result.results[..k - 1].iter().all(|r| r.success));
            assert_eq!(desktop.calls().len(), k - 1);
            assert_eq!(result.message, "Execution stopped due to error");
        }
    }

    #[test]
    fn test_unknown_action_fails_step() {
        let (exec, desktop) = executor(MockDesktop::new());
        let plan = vec![
            Step::new(Action::Unknown { name: "fly".into() }, "Fly away"),
            press("enter"),
        ];

        let result = exec.run(&plan);
        assert!(!result.success);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].message.as_deref(), Some("Unknown action: fly"));
        assert!(desktop.calls().is_empty());
    }

    #[test]
    fn test_backend_failure_message_recorded() {
        let (exec, _) = executor(MockDesktop::new().fail_on("click", "no display"));
        let result = exec.run(&[Step::new(Action::Click { position: None }, "Click")]);
        assert_eq!(result.failed_step().map(|r| r.step), Some(1));
        assert_eq!(result.results[0].message.as_deref(), Some("no display"));
    }

    #[test]
    fn test_pause_only_between_successful_steps() {
        let pause = Duration::from_millis(300);
        let timed = || {
            let lib = ActionLibrary::new(Arc::new(MockDesktop::new())).with_timing(ActionTiming {
                step_pause: pause,
                ..ActionTiming::instant()
            });
            Executor::new(Arc::new(lib))
        };
        let elapsed = |plan: &[Step]| {
            let started = Instant::now();
            let result = timed().run(plan);
            (started.elapsed(), result)
        };

        // No pause after the last step
        let (took, result) = elapsed(&[press("a")]);
        assert!(result.success);
        assert!(took < pause, "{:?}", took);

        // One pause between two steps
        let (took, result) = elapsed(&[press("a"), press("b")]);
        assert!(result.success);
        assert!(took >= pause, "{:?}", took);
        assert!(took < pause * 2, "{:?}", took);

        // No pause after a failure
        let (took, result) = elapsed(&[press("not-a-key"), press("b")]);
        assert!(!result.success);
        assert!(took < pause, "{:?}", took);
    }
}
