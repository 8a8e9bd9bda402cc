//! The real desktop: process launcher, synthetic input, screen capture

use super::{ActionError, Desktop};
use crate::input::InputController;
use crate::vision::VisionController;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct SystemDesktop {
    input: InputController,
    vision: VisionController,
}

impl SystemDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the input and vision features were compiled in
    pub fn capabilities(&self) -> (bool, bool) {
        (self.input.is_available(), self.vision.is_available())
    }
}

impl Desktop for SystemDesktop {
    fn launch(&self, target: &str) -> Result<(), ActionError> {
        let pid = spawn_detached(launch_command(target)?, target)?;
        tracing::debug!(target, pid, "Launched");
        Ok(())
    }

    fn type_text(&self, text: &str, interval: Duration) -> Result<(), ActionError> {
        Ok(self.input.type_text(text, interval)?)
    }

    fn press_key(&self, key: &str) -> Result<(), ActionError> {
        Ok(self.input.key_press(key)?)
    }

    fn hotkey(&self, keys: &[String]) -> Result<(), ActionError> {
        Ok(self.input.key_combination(keys)?)
    }

    fn click(&self, position: Option<(i32, i32)>) -> Result<(i32, i32), ActionError> {
        Ok(self.input.click(position)?)
    }

    fn capture_screen(&self, path: &Path) -> Result<PathBuf, ActionError> {
        Ok(self.vision.capture_to_file(path)?.path)
    }
}

/// Start `command` without waiting for it. A detached thread waits on the
/// child so it is reaped when it exits instead of lingering as a zombie.
fn spawn_detached(mut command: Command, target: &str) -> Result<u32, ActionError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    let mut child = command.spawn().map_err(|source| ActionError::Launch {
        target: target.to_string(),
        source,
    })?;
    let pid = child.id();

    std::thread::Builder::new()
        .name(format!("reap-{}", pid))
        .spawn(move || match child.wait() {
            Ok(status) => tracing::debug!(pid, %status, "Launched process exited"),
            Err(e) => tracing::warn!(pid, "Failed to wait on launched process: {}", e),
        })
        .map_err(|source| ActionError::Launch {
            target: target.to_string(),
            source,
        })?;

    Ok(pid)
}

#[cfg(target_os = "windows")]
fn launch_command(target: &str) -> Result<Command, ActionError> {
    // `start` resolves App Paths entries such as chrome.exe
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", target]);
    Ok(command)
}

#[cfg(target_os = "macos")]
fn launch_command(target: &str) -> Result<Command, ActionError> {
    if let Ok(path) = which::which(target) {
        return Ok(Command::new(path));
    }
    let mut command = Command::new("open");
    command.args(["-a", target]);
    Ok(command)
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launch_command(target: &str) -> Result<Command, ActionError> {
    let mut parts = target.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| ActionError::NotFound(target.to_string()))?;
    let path = which::which(program).map_err(|_| ActionError::NotFound(program.to_string()))?;

    let mut command = Command::new(path);
    command.args(parts);
    Ok(command)
}
