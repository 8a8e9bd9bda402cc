//! Layered configuration: built-in defaults, then a config file, then the
//! environment. Built once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_VISION_MODEL: &str = "llava:v1.6";

/// Placeholder returned instead of a stored credential
pub const REDACTED: &str = "***hidden***";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown provider: {0} (expected ollama, openai, anthropic or gemini)")]
    UnknownProvider(String),
}

/// LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    OpenAI,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    /// Model used when configuration names none for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "qwen2.5:7b",
            ProviderKind::OpenAI => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-haiku-20240307",
            ProviderKind::Gemini => "gemini-2.0-flash",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ProviderKind::Ollama)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::OpenAI => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "openai" => Ok(ProviderKind::OpenAI),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Effective process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub vision_model: String,
    pub api_key: Option<String>,
    pub ollama_url: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let provider = ProviderKind::Ollama;
        Self {
            provider,
            model: provider.default_model().to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            api_key: None,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
        }
    }
}

/// Config file layer. Every field is optional; absent fields keep the
/// lower layer's value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLayer {
    provider: Option<String>,
    model: Option<String>,
    vision_model: Option<String>,
    api_key: Option<String>,
    ollama_url: Option<String>,
}

/// API key variables, lowest precedence first. A present key forces its provider.
const API_KEY_VARS: &[(&[&str], ProviderKind)] = &[
    (&["OPENAI_API_KEY"], ProviderKind::OpenAI),
    (&["ANTHROPIC_API_KEY"], ProviderKind::Anthropic),
    (&["GEMINI_API_KEY", "GOOGLE_API_KEY"], ProviderKind::Gemini),
];

impl AgentConfig {
    /// Load defaults, then `path`, then the process environment
    pub fn load(path: &Path) -> Self {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as [`AgentConfig::load`] with an injectable environment lookup
    pub fn load_with_env<F>(path: &Path, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut layers = Layering::default();

        match read_file_layer(path) {
            Ok(Some(layer)) => {
                tracing::debug!(path = %path.display(), "Applying config file");
                layers.apply_file(layer);
            }
            Ok(None) => tracing::debug!(path = %path.display(), "No config file, using defaults"),
            Err(e) => tracing::warn!("Config load error: {}", e),
        }

        layers.apply_env(|key| env(key).filter(|v| !v.trim().is_empty()));
        layers.finish()
    }

    /// Copy safe to hand out over the API
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| REDACTED.to_string()),
            ..self.clone()
        }
    }
}

#[derive(Default)]
struct Layering {
    config: AgentConfig,
    model_explicit: bool,
}

impl Layering {
    fn apply_file(&mut self, layer: FileLayer) {
        if let Some(provider) = layer.provider {
            self.set_provider(&provider, "config file");
        }
        if let Some(model) = layer.model {
            self.config.model = model;
            self.model_explicit = true;
        }
        if let Some(vision_model) = layer.vision_model {
            self.config.vision_model = vision_model;
        }
        if layer.api_key.is_some() {
            self.config.api_key = layer.api_key;
        }
        if let Some(url) = layer.ollama_url {
            self.config.ollama_url = url;
        }
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(provider) = env("LLM_PROVIDER") {
            self.set_provider(&provider, "LLM_PROVIDER");
        }
        if let Some(model) = env("LLM_MODEL") {
            self.config.model = model;
            self.model_explicit = true;
        }
        for (vars, provider) in API_KEY_VARS {
            if let Some(key) = vars.iter().find_map(|var| env(var)) {
                self.config.api_key = Some(key);
                self.config.provider = *provider;
            }
        }
    }

    fn set_provider(&mut self, value: &str, source: &str) {
        match value.parse() {
            Ok(provider) => self.config.provider = provider,
            Err(e) => tracing::warn!("Ignoring provider from {}: {}", source, e),
        }
    }

    fn finish(mut self) -> AgentConfig {
        if !self.model_explicit {
            self.config.model = self.config.provider.default_model().to_string();
        }
        self.config
    }
}

/// Read the file layer; `Ok(None)` when the file does not exist.
/// `.toml` files are parsed as TOML, anything else as JSON.
fn read_file_layer(path: &Path) -> Result<Option<FileLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_toml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false);

    let layer = if is_toml {
        toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?
    };

    Ok(Some(layer))
}
