//! Input Module - Keyboard and Mouse Injection
//!
//! Synthetic input is disabled by default and requires the `input` feature
//! flag: `--features input`. Without it every operation fails with
//! `InputError::FeatureNotCompiled`, which the action library reports as a
//! failed step.
//!
//! Key-name parsing is always compiled so plans can be checked without a
//! display.

#[cfg(feature = "input")]
use enigo::{Enigo, Keyboard, Mouse, Settings};

use std::time::Duration;

/// Keys the agent knows how to press by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Control,
    Alt,
    Shift,
    Meta,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Backspace,
    Delete,
    Return,
    Tab,
    Escape,
    Space,
    Char(char),
}

impl KeyCode {
    /// Parse a key name such as `ctrl`, `F5`, `pgdn` or a single character
    pub fn parse(key: &str) -> Result<Self, InputError> {
        let key = key.trim();
        let key_lower = key.to_lowercase();
        let parsed = match key_lower.as_str() {
            // Modifiers
            "ctrl" | "control" => KeyCode::Control,
            "alt" | "option" => KeyCode::Alt,
            "shift" => KeyCode::Shift,
            "super" | "win" | "windows" | "meta" | "cmd" | "command" => KeyCode::Meta,

            "f1" => KeyCode::F1,
            "f2" => KeyCode::F2,
            "f3" => KeyCode::F3,
            "f4" => KeyCode::F4,
            "f5" => KeyCode::F5,
            "f6" => KeyCode::F6,
            "f7" => KeyCode::F7,
            "f8" => KeyCode::F8,
            "f9" => KeyCode::F9,
            "f10" => KeyCode::F10,
            "f11" => KeyCode::F11,
            "f12" => KeyCode::F12,

            // Navigation
            "up" | "uparrow" => KeyCode::Up,
            "down" | "downarrow" => KeyCode::Down,
            "left" | "leftarrow" => KeyCode::Left,
            "right" | "rightarrow" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" | "pgup" => KeyCode::PageUp,
            "pagedown" | "pgdn" => KeyCode::PageDown,

            // Editing
            "backspace" | "back" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "enter" | "return" => KeyCode::Return,
            "tab" => KeyCode::Tab,
            "escape" | "esc" => KeyCode::Escape,
            "space" => KeyCode::Space,

            _ => {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                    _ => return Err(InputError::UnknownKey(key.to_string())),
                }
            }
        };

        Ok(parsed)
    }

    #[cfg(feature = "input")]
    fn to_enigo(self) -> enigo::Key {
        use enigo::Key;

        match self {
            KeyCode::Control => Key::Control,
            KeyCode::Alt => Key::Alt,
            KeyCode::Shift => Key::Shift,
            KeyCode::Meta => Key::Meta,
            KeyCode::F1 => Key::F1,
            KeyCode::F2 => Key::F2,
            KeyCode::F3 => Key::F3,
            KeyCode::F4 => Key::F4,
            KeyCode::F5 => Key::F5,
            KeyCode::F6 => Key::F6,
            KeyCode::F7 => Key::F7,
            KeyCode::F8 => Key::F8,
            KeyCode::F9 => Key::F9,
            KeyCode::F10 => Key::F10,
            KeyCode::F11 => Key::F11,
            KeyCode::F12 => Key::F12,
            KeyCode::Up => Key::UpArrow,
            KeyCode::Down => Key::DownArrow,
            KeyCode::Left => Key::LeftArrow,
            KeyCode::Right => Key::RightArrow,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Return => Key::Return,
            KeyCode::Tab => Key::Tab,
            KeyCode::Escape => Key::Escape,
            KeyCode::Space => Key::Space,
            KeyCode::Char(c) => Key::Unicode(c),
        }
    }
}

/// Parse every key of a chord, failing on the first unknown name
pub fn parse_chord<S: AsRef<str>>(keys: &[S]) -> Result<Vec<KeyCode>, InputError> {
    if keys.is_empty() {
        return Err(InputError::EmptyChord);
    }
    keys.iter().map(|k| KeyCode::parse(k.as_ref())).collect()
}

/// Input controller
///
/// Opens a fresh enigo connection per operation, so the controller itself
/// holds no OS handles and can be shared across worker threads.
#[derive(Debug, Clone, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }

    /// Whether synthetic input was compiled in
    pub fn is_available(&self) -> bool {
        cfg!(feature = "input")
    }

    #[cfg(feature = "input")]
    fn session(&self) -> Result<Enigo, InputError> {
        Enigo::new(&Settings::default()).map_err(|e| InputError::InitError(e.to_string()))
    }

    // ========== Keyboard Operations ==========

    /// Type text.
    ///
    /// Plain ASCII goes out one character at a time with `interval` between
    /// characters; anything else is inserted in one call.
    #[cfg(feature = "input")]
    pub fn type_text(&self, text: &str, interval: Duration) -> Result<(), InputError> {
        let mut enigo = self.session()?;

        if !text.is_ascii() {
            return enigo
                .text(text)
                .map_err(|e| InputError::KeyboardError(e.to_string()));
        }

        let mut buf = [0u8; 4];
        for (i, ch) in text.chars().enumerate() {
            if i > 0 && !interval.is_zero() {
                std::thread::sleep(interval);
            }
            enigo
                .text(ch.encode_utf8(&mut buf))
                .map_err(|e| InputError::KeyboardError(e.to_string()))?;
        }
        Ok(())
    }

    /// Press and release a key
    #[cfg(feature = "input")]
    pub fn key_press(&self, key: &str) -> Result<(), InputError> {
        let code = KeyCode::parse(key)?;
        let mut enigo = self.session()?;
        enigo
            .key(code.to_enigo(), enigo::Direction::Click)
            .map_err(|e| InputError::KeyboardError(e.to_string()))
    }

    /// Press a key combination: hold every key but the last, click the last,
    /// then release the held keys in reverse order.
    #[cfg(feature = "input")]
    pub fn key_combination<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), InputError> {
        use enigo::Direction;

        let codes = parse_chord(keys)?;
        let mut enigo = self.session()?;
        let (main_key, modifiers) = codes.split_last().ok_or(InputError::EmptyChord)?;

        let mut held = Vec::with_capacity(modifiers.len());
        let mut result = Ok(());
        for code in modifiers {
            if let Err(e) = enigo.key(code.to_enigo(), Direction::Press) {
                result = Err(InputError::KeyboardError(e.to_string()));
                break;
            }
            held.push(*code);
        }

        if result.is_ok() {
            result = enigo
                .key(main_key.to_enigo(), Direction::Click)
                .map_err(|e| InputError::KeyboardError(e.to_string()));
        }

        // Release whatever was pressed even when the chord failed halfway
        for code in held.iter().rev() {
            if let Err(e) = enigo.key(code.to_enigo(), Direction::Release) {
                tracing::warn!(key = ?code, error = %e, "Failed to release key");
            }
        }

        result
    }

    // ========== Mouse Operations ==========

    /// Main display size in pixels
    #[cfg(feature = "input")]
    pub fn screen_size(&self) -> Result<(i32, i32), InputError> {
        self.session()?
            .main_display()
            .map_err(|e| InputError::MouseError(e.to_string()))
    }

    /// Left click at absolute coordinates, or at the pointer when `None`.
    /// Returns the position clicked.
    #[cfg(feature = "input")]
    pub fn click(&self, position: Option<(i32, i32)>) -> Result<(i32, i32), InputError> {
        let mut enigo = self.session()?;

        let (x, y) = match position {
            Some((x, y)) => {
                let (width, height) = enigo
                    .main_display()
                    .map_err(|e| InputError::MouseError(e.to_string()))?;
                check_bounds(x, y, width, height)?;
                enigo
                    .move_mouse(x, y, enigo::Coordinate::Abs)
                    .map_err(|e| InputError::MouseError(e.to_string()))?;
                (x, y)
            }
            None => enigo
                .location()
                .map_err(|e| InputError::MouseError(e.to_string()))?,
        };

        enigo
            .button(enigo::Button::Left, enigo::Direction::Click)
            .map_err(|e| InputError::MouseError(e.to_string()))?;

        Ok((x, y))
    }

    // ========== Stub implementations when feature not compiled ==========

    #[cfg(not(feature = "input"))]
    pub fn type_text(&self, _text: &str, _interval: Duration) -> Result<(), InputError> {
        Err(InputError::FeatureNotCompiled)
    }

    #[cfg(not(feature = "input"))]
    pub fn key_press(&self, key: &str) -> Result<(), InputError> {
        KeyCode::parse(key)?;
        Err(InputError::FeatureNotCompiled)
    }

    #[cfg(not(feature = "input"))]
    pub fn key_combination<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), InputError> {
        parse_chord(keys)?;
        Err(InputError::FeatureNotCompiled)
    }

    #[cfg(not(feature = "input"))]
    pub fn screen_size(&self) -> Result<(i32, i32), InputError> {
        Err(InputError::FeatureNotCompiled)
    }

    #[cfg(not(feature = "input"))]
    pub fn click(&self, _position: Option<(i32, i32)>) -> Result<(i32, i32), InputError> {
        Err(InputError::FeatureNotCompiled)
    }
}

/// Reject coordinates outside a `width` x `height` display
pub fn check_bounds(x: i32, y: i32, width: i32, height: i32) -> Result<(), InputError> {
    if x < 0 || y < 0 || x >= width || y >= height {
        return Err(InputError::OutOfBounds {
            x,
            y,
            width,
            height,
        });
    }
    Ok(())
}

/// Input errors
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Input feature not compiled. Rebuild with --features input")]
    FeatureNotCompiled,

    #[error("Input initialization failed: {0}")]
    InitError(String),

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Hotkey needs at least one key")]
    EmptyChord,

    #[error("Coordinates ({x}, {y}) outside the {width}x{height} display")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },

    #[error("Mouse operation failed: {0}")]
    MouseError(String),

    #[error("Keyboard operation failed: {0}")]
    KeyboardError(String),
}
