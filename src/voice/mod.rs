//! Voice command front end
//!
//! Turns a stream of transcribed utterances into agent commands. An
//! utterance only counts when it contains a wake phrase; the phrase is
//! removed and the remainder becomes the command. A wake phrase on its own
//! arms the listener so the next utterance is taken as the command.

use crate::agent::AgentReply;
use crate::client::ClientError;
use once_cell::sync::Lazy;
use regex::Regex;

pub const WAKE_PHRASES: &[&str] = &["hey agent", "hello agent", "agent"];

/// Longest phrases first so "hey agent" is removed whole
static WAKE: Lazy<Regex> = Lazy::new(|| {
    let alternatives: Vec<String> = WAKE_PHRASES
        .iter()
        .map(|p| p.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"\s+"))
        .collect();
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|"))).expect("valid wake regex")
});

/// What the listener makes of one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    /// No wake phrase, nothing to do
    Ignored,
    /// Wake phrase alone; waiting for the command
    Prompt,
    /// Armed, but the follow-up was empty
    Missed,
    Command(String),
}

#[derive(Debug, Default)]
pub struct WakeListener {
    armed: bool,
}

impl WakeListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn hear(&mut self, utterance: &str) -> Heard {
        if self.armed {
            self.armed = false;
            let command = clean(utterance);
            return if command.is_empty() {
                Heard::Missed
            } else {
                Heard::Command(command.to_string())
            };
        }

        if !WAKE.is_match(utterance) {
            return Heard::Ignored;
        }

        let stripped = WAKE.replace_all(utterance, " ");
        let command = clean(&stripped);
        if command.is_empty() {
            self.armed = true;
            Heard::Prompt
        } else {
            Heard::Command(command.to_string())
        }
    }
}

/// Trim whitespace and the punctuation speech-to-text leaves around a
/// removed wake phrase ("hey agent, open calculator")
fn clean(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ':'))
}

/// Spoken feedback for a backend reply
pub fn describe_reply(result: &Result<AgentReply, ClientError>) -> String {
    match result {
        Ok(reply) if reply.success => "Done".to_string(),
        Ok(reply) => format!(
            "Sorry, {}",
            reply.error.as_deref().unwrap_or("Unknown error")
        ),
        Err(ClientError::Unreachable(_)) => {
            "Backend is not running. Start it with `deskagent serve` first.".to_string()
        }
        Err(ClientError::Http(e)) if e.is_timeout() => "Request timed out".to_string(),
        Err(_) => "Error executing command".to_string(),
    }
}
