//! Action Library - OS automation primitives
//!
//! Every primitive returns an [`Outcome`]. Backend failures (missing
//! executable, unknown key, out-of-bounds click, capture errors) are turned
//! into failed outcomes carrying the error text; nothing escapes as a panic
//! or an `Err`.
//!
//! The OS itself sits behind the [`Desktop`] trait: [`SystemDesktop`] drives
//! the real machine, [`MockDesktop`] records calls for tests.

mod mock;
mod system;

pub use mock::MockDesktop;
pub use system::SystemDesktop;

use crate::core::Outcome;
use crate::input::InputError;
use crate::vision::{capture_file_name, VisionError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error("Could not launch {target}: {source}")]
    Launch {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Application not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// The OS surface the action library drives
pub trait Desktop: Send + Sync {
    /// Start `target` without waiting for it to exit
    fn launch(&self, target: &str) -> Result<(), ActionError>;

    fn type_text(&self, text: &str, interval: Duration) -> Result<(), ActionError>;

    fn press_key(&self, key: &str) -> Result<(), ActionError>;

    /// Hold `keys` in order, release in reverse
    fn hotkey(&self, keys: &[String]) -> Result<(), ActionError>;

    /// Left click; returns the position actually clicked
    fn click(&self, position: Option<(i32, i32)>) -> Result<(i32, i32), ActionError>;

    /// Capture the primary screen to `path`
    fn capture_screen(&self, path: &Path) -> Result<PathBuf, ActionError>;
}

/// Pauses the library inserts around OS actions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionTiming {
    /// Sleep after launching an application
    pub launch_settle: Duration,
    /// Delay between characters when typing ASCII
    pub type_interval: Duration,
    /// Pause between successful plan steps
    pub step_pause: Duration,
}

impl Default for ActionTiming {
    fn default() -> Self {
        Self {
            launch_settle: Duration::from_millis(1500),
            type_interval: Duration::from_millis(20),
            step_pause: Duration::from_millis(200),
        }
    }
}

impl ActionTiming {
    /// No pauses at all
    pub fn instant() -> Self {
        Self {
            launch_settle: Duration::ZERO,
            type_interval: Duration::ZERO,
            step_pause: Duration::ZERO,
        }
    }
}

#[cfg(target_os = "windows")]
const APP_ALIASES: &[(&str, &str)] = &[
    ("notepad", "notepad.exe"),
    ("calculator", "calc.exe"),
    ("chrome", "chrome.exe"),
    ("firefox", "firefox.exe"),
    ("edge", "msedge.exe"),
    ("explorer", "explorer.exe"),
    ("word", "winword.exe"),
    ("excel", "excel.exe"),
    ("powerpoint", "powerpnt.exe"),
    ("outlook", "outlook.exe"),
    ("vscode", "code"),
    ("terminal", "wt.exe"),
    ("cmd", "cmd.exe"),
    ("powershell", "powershell.exe"),
];

#[cfg(target_os = "macos")]
const APP_ALIASES: &[(&str, &str)] = &[
    ("notepad", "TextEdit"),
    ("calculator", "Calculator"),
    ("chrome", "Google Chrome"),
    ("firefox", "Firefox"),
    ("edge", "Microsoft Edge"),
    ("explorer", "Finder"),
    ("word", "Microsoft Word"),
    ("excel", "Microsoft Excel"),
    ("powerpoint", "Microsoft PowerPoint"),
    ("outlook", "Microsoft Outlook"),
    ("vscode", "Visual Studio Code"),
    ("terminal", "Terminal"),
];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const APP_ALIASES: &[(&str, &str)] = &[
    ("notepad", "gedit"),
    ("calculator", "gnome-calculator"),
    ("chrome", "google-chrome"),
    ("firefox", "firefox"),
    ("edge", "microsoft-edge"),
    ("explorer", "nautilus"),
    ("word", "libreoffice --writer"),
    ("excel", "libreoffice --calc"),
    ("powerpoint", "libreoffice --impress"),
    ("vscode", "code"),
    ("terminal", "gnome-terminal"),
];

/// Map a well-known application name to this platform's launch target;
/// anything else is launched literally.
pub fn resolve_app(name: &str) -> String {
    let key = name.trim().to_lowercase();
    APP_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, target)| target.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// `~/Desktop/screenshots`, falling back to the home directory when the
/// platform has no desktop folder.
pub fn default_screenshot_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| {
            dirs.desktop_dir()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dirs.home_dir().join("Desktop"))
        })
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screenshots")
}

/// The fixed set of primitives plans are made of
pub struct ActionLibrary {
    desktop: Arc<dyn Desktop>,
    timing: ActionTiming,
    screenshot_dir: PathBuf,
}

impl ActionLibrary {
    pub fn new(desktop: Arc<dyn Desktop>) -> Self {
        Self {
            desktop,
            timing: ActionTiming::default(),
            screenshot_dir: default_screenshot_dir(),
        }
    }

    pub fn with_timing(mut self, timing: ActionTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    pub fn timing(&self) -> &ActionTiming {
        &self.timing
    }

    pub fn screenshot_dir(&self) -> &Path {
        &self.screenshot_dir
    }

    pub fn open_app(&self, name: &str) -> Outcome {
        let target = resolve_app(name);
        tracing::info!(app = %name, target = %target, "Opening application");

        if let Err(e) = self.desktop.launch(&target) {
            return failed("open_app", e);
        }
        pause(self.timing.launch_settle);
        Outcome::ok(format!("Opened {}", name))
    }

    pub fn type_text(&self, text: &str) -> Outcome {
        match self.desktop.type_text(text, self.timing.type_interval) {
            Ok(()) => {
                let preview: String = text.chars().take(50).collect();
                Outcome::ok(format!("Typed: {}...", preview))
            }
            Err(e) => failed("type", e),
        }
    }

    pub fn press(&self, key: &str) -> Outcome {
        match self.desktop.press_key(key) {
            Ok(()) => Outcome::ok(format!("Pressed: {}", key)),
            Err(e) => failed("press", e),
        }
    }

    pub fn hotkey(&self, keys: &[String]) -> Outcome {
        match self.desktop.hotkey(keys) {
            Ok(()) => Outcome::ok(format!("Hotkey: {}", keys.join("+"))),
            Err(e) => failed("hotkey", e),
        }
    }

    pub fn click(&self, position: Option<(i32, i32)>) -> Outcome {
        match self.desktop.click(position) {
            Ok((x, y)) => Outcome::ok(format!("Clicked at ({}, {})", x, y)),
            Err(e) => failed("click", e),
        }
    }

    pub fn wait(&self, seconds: f64) -> Outcome {
        match Duration::try_from_secs_f64(seconds) {
            Ok(duration) => {
                std::thread::sleep(duration);
                Outcome::ok(format!("Waited {}s", seconds))
            }
            Err(e) => Outcome::err(format!("Invalid wait of {}s: {}", seconds, e)),
        }
    }

    pub fn screenshot(&self) -> Outcome {
        let path = self
            .screenshot_dir
            .join(capture_file_name(chrono::Local::now()));

        match self.desktop.capture_screen(&path) {
            Ok(saved) => {
                Outcome::ok(format!("Screenshot saved: {}", saved.display())).with_path(saved)
            }
            Err(e) => failed("screenshot", e),
        }
    }
}

fn failed(action: &str, error: ActionError) -> Outcome {
    tracing::warn!(action, error = %error, "Action failed");
    Outcome::err(error.to_string())
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}
