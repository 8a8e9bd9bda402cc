//! In-memory desktop that records every call

use super::{ActionError, Desktop};
use crate::input::{check_bounds, parse_chord, KeyCode};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Records calls as short strings (`"press enter"`, `"hotkey ctrl+s"`) and
/// fails selected operations on request. Key names and click bounds are
/// checked the same way the real input backend checks them.
#[derive(Debug)]
pub struct MockDesktop {
    calls: Mutex<Vec<String>>,
    failures: HashMap<&'static str, String>,
    screen: (i32, i32),
    pointer: (i32, i32),
}

impl Default for MockDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDesktop {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: HashMap::new(),
            screen: (1920, 1080),
            pointer: (0, 0),
        }
    }

    /// Make `op` (`launch`, `type`, `press`, `hotkey`, `click`,
    /// `screenshot`) fail with `error`
    pub fn fail_on(mut self, op: &'static str, error: impl Into<String>) -> Self {
        self.failures.insert(op, error.into());
        self
    }

    pub fn with_screen(mut self, width: i32, height: i32) -> Self {
        self.screen = (width, height);
        self
    }

    pub fn with_pointer(mut self, x: i32, y: i32) -> Self {
        self.pointer = (x, y);
        self
    }

    /// Calls recorded so far, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn record(&self, op: &'static str, detail: String) -> Result<(), ActionError> {
        if let Some(error) = self.failures.get(op) {
            return Err(ActionError::Backend(error.clone()));
        }
        let entry = if detail.is_empty() {
            op.to_string()
        } else {
            format!("{} {}", op, detail)
        };
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
        Ok(())
    }
}

impl Desktop for MockDesktop {
    fn launch(&self, target: &str) -> Result<(), ActionError> {
        self.record("launch", target.to_string())
    }

    fn type_text(&self, text: &str, _interval: Duration) -> Result<(), ActionError> {
        self.record("type", text.to_string())
    }

    fn press_key(&self, key: &str) -> Result<(), ActionError> {
        KeyCode::parse(key)?;
        self.record("press", key.to_string())
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), ActionError> {
        parse_chord(keys)?;
        self.record("hotkey", keys.join("+"))
    }

    fn click(&self, position: Option<(i32, i32)>) -> Result<(i32, i32), ActionError> {
        let (x, y) = position.unwrap_or(self.pointer);
        check_bounds(x, y, self.screen.0, self.screen.1)?;
        self.record("click", format!("{},{}", x, y))?;
        Ok((x, y))
    }

    fn capture_screen(&self, path: &Path) -> Result<PathBuf, ActionError> {
        self.record("screenshot", String::new())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ActionError::Vision(e.into()))?;
        }
        std::fs::write(path, b"").map_err(|e| ActionError::Vision(e.into()))?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_calls_in_order() {
        let desktop = MockDesktop::new();
        desktop.launch("gedit").unwrap();
        desktop.type_text("hi", Duration::ZERO).unwrap();
        desktop.click(Some((5, 6))).unwrap();
        assert_eq!(desktop.calls(), vec!["launch gedit", "type hi", "click 5,6"]);
    }

    #[test]
    fn test_injected_failure_not_recorded() {
        let desktop = MockDesktop::new().fail_on("type", "keyboard unplugged");
        let err = desktop.type_text("hi", Duration::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "keyboard unplugged");
        assert!(desktop.calls().is_empty());
    }
}
