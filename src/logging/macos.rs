//! macOS system logging via Unified Logging (os_log)
//!
//! View logs with:
//!   log stream --predicate 'subsystem == "com.gtechsd.deskagent"'

use super::{trace_event, AgentEvent, LogLevel};
use oslog::OsLog;
use std::sync::OnceLock;

static LOGGER: OnceLock<OsLog> = OnceLock::new();

const SUBSYSTEM: &str = "com.gtechsd.deskagent";
const CATEGORY: &str = "tasks";

pub struct SystemLogger;

impl SystemLogger {
    pub fn new() -> Self {
        LOGGER.get_or_init(|| OsLog::new(SUBSYSTEM, CATEGORY));
        SystemLogger
    }

    pub fn log(&self, event: AgentEvent) {
        let message = event.to_syslog_format();

        if let Some(logger) = LOGGER.get() {
            match event.level {
                LogLevel::Debug => logger.with_level(oslog::Level::Debug, &message),
                LogLevel::Info => logger.with_level(oslog::Level::Info, &message),
                LogLevel::Warning => logger.with_level(oslog::Level::Default, &message),
                LogLevel::Error => logger.with_level(oslog::Level::Error, &message),
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
