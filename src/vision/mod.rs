//! Vision Module - Screen Capture
//!
//! Screen capture is disabled by default and requires the `vision` feature
//! flag: `--features vision`.

#[cfg(feature = "vision")]
use xcap::Monitor;

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Saved capture metadata
#[derive(Debug, Clone)]
pub struct Capture {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// File name for a capture taken at `at`
pub fn capture_file_name(at: DateTime<Local>) -> String {
    format!("screenshot_{}.png", at.format("%Y%m%d_%H%M%S"))
}

/// Vision controller for the primary monitor
#[derive(Debug, Clone, Default)]
pub struct VisionController;

impl VisionController {
    pub fn new() -> Self {
        Self
    }

    pub fn is_available(&self) -> bool {
        cfg!(feature = "vision")
    }

    /// Get primary screen dimensions
    #[cfg(feature = "vision")]
    pub fn get_screen_size(&self) -> Result<(u32, u32), VisionError> {
        let monitor = primary_monitor()?;
        Ok((monitor.width(), monitor.height()))
    }

    /// Capture the primary monitor and write it as PNG to `path`,
    /// creating parent directories as needed.
    #[cfg(feature = "vision")]
    pub fn capture_to_file(&self, path: &Path) -> Result<Capture, VisionError> {
        let monitor = primary_monitor()?;
        let image = monitor
            .capture_image()
            .map_err(|e| VisionError::CaptureError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        image
            .save_with_format(path, xcap::image::ImageFormat::Png)
            .map_err(|e| VisionError::EncodingError(e.to_string()))?;

        tracing::debug!(path = %path.display(), width = image.width(), height = image.height(), "Screen captured");

        Ok(Capture {
            path: path.to_path_buf(),
            width: image.width(),
            height: image.height(),
        })
    }

    // Stubs when feature not compiled

    #[cfg(not(feature = "vision"))]
    pub fn get_screen_size(&self) -> Result<(u32, u32), VisionError> {
        Err(VisionError::FeatureNotCompiled)
    }

    #[cfg(not(feature = "vision"))]
    pub fn capture_to_file(&self, _path: &Path) -> Result<Capture, VisionError> {
        Err(VisionError::FeatureNotCompiled)
    }
}

#[cfg(feature = "vision")]
fn primary_monitor() -> Result<Monitor, VisionError> {
    let monitors = Monitor::all().map_err(|e| VisionError::CaptureError(e.to_string()))?;
    monitors.into_iter().next().ok_or(VisionError::NoMonitor)
}

/// Vision errors
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("Vision feature not compiled. Rebuild with --features vision")]
    FeatureNotCompiled,

    #[error("No monitor found")]
    NoMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureError(String),

    #[error("Image encoding failed: {0}")]
    EncodingError(String),

    #[error("Could not create screenshot directory: {0}")]
    Io(#[from] std::io::Error),
}
