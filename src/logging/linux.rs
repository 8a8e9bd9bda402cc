//! Linux system logging via syslog/journald

use super::{trace_event, AgentEvent, LogLevel};
use std::sync::Mutex;
use syslog::{Facility, Formatter3164};

pub struct SystemLogger {
    logger: Mutex<Option<syslog::Logger<syslog::LoggerBackend, Formatter3164>>>,
}

impl SystemLogger {
    pub fn new() -> Self {
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            hostname: None,
            process: "deskagent".into(),
            pid: std::process::id(),
        };

        // No syslog socket (containers, CI) just means tracing only
        let logger = syslog::unix(formatter).ok();
        SystemLogger {
            logger: Mutex::new(logger),
        }
    }

    pub fn log(&self, event: AgentEvent) {
        let message = event.to_syslog_format();

        if let Ok(mut guard) = self.logger.lock() {
            if let Some(ref mut logger) = *guard {
                let _ = match event.level {
                    LogLevel::Debug => logger.debug(&message),
                    LogLevel::Info => logger.info(&message),
                    LogLevel::Warning => logger.warning(&message),
                    LogLevel::Error => logger.err(&message),
                };
            }
        }

        trace_event(&event, &message);
    }
}

impl Default for SystemLogger {
    fn default() -> Self {
        Self::new()
    }
}
