//! deskagent Library
//!
//! A desktop automation agent: a task in plain English is planned by an LLM
//! into a list of steps (launch an app, type, press keys, click, wait,
//! capture the screen) and executed against the local desktop.
//!
//! Data flow: task → [`agent::Agent`] router → direct `open_app`, or
//! [`core::Planner`] → provider → plan → [`core::Executor`] → reply.

pub mod actions;
pub mod agent;
pub mod api;
pub mod cli;
pub mod client;
pub mod core;
pub mod logging;
pub mod providers;
pub mod voice;

// Desktop backends. Always compiled; the real implementations sit behind
// the `input` and `vision` features and fall back to stubs without them.
pub mod input;
pub mod vision;

pub use crate::actions::{ActionLibrary, ActionTiming, Desktop, MockDesktop, SystemDesktop};
pub use crate::agent::{Agent, AgentReply};
pub use crate::core::{Action, AgentConfig, ExecutionResult, Executor, Outcome, Plan, Planner, ProviderKind, Step};
pub use crate::logging::{AgentEvent, EventId, LogLevel, SystemLogger};
pub use crate::providers::{Anthropic, Gemini, LlmProvider, Ollama, OpenAi};
pub use crate::input::InputController;
pub use crate::vision::VisionController;
