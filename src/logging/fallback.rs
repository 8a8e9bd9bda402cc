//! Tracing-only logging for platforms without a system log backend

use super::{trace_event, AgentEvent};

pub struct SystemLogger;

impl SystemLogger {
    pub fn new() -> Self {
        SystemLogger
    }

    pub fn log(&self, event: AgentEvent) {
        trace_event(&event, &event.to_syslog_format());
    }
}

impl Default for SystemLogger {
    fn default() -> Self {
        Self::new()
    }
}
