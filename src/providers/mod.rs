//! LLM Provider Abstraction
//!
//! One provider is active per process:
//! 1. Ollama (local, default)
//! 2. OpenAI (cloud)
//! 3. Anthropic Claude (cloud)
//! 4. Google Gemini (cloud)
//!
//! Every provider is "prompt in, text out" with a single bounded request.
//! No retries and no fallback between providers.

mod anthropic;
mod gemini;
mod ollama;
mod openai;

pub use anthropic::Anthropic;
pub use gemini::Gemini;
pub use ollama::Ollama;
pub use openai::OpenAi;

use crate::core::{AgentConfig, ProviderKind};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Timeout for local inference servers
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for hosted APIs
pub const HOSTED_TIMEOUT: Duration = Duration::from_secs(30);

/// Sampling settings shared by the hosted providers
const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 1024;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(&'static str),

    #[error("Malformed response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// LLM Provider trait
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Model identifier requests are sent with
    fn model(&self) -> &str;

    /// Single-turn generation
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Build the provider selected by configuration
pub fn from_config(config: &AgentConfig) -> Arc<dyn LlmProvider> {
    let key = config.api_key.as_deref();
    match config.provider {
        ProviderKind::Ollama => Arc::new(Ollama::new(&config.ollama_url, &config.model)),
        ProviderKind::OpenAI => Arc::new(OpenAi::new(key).with_model(&config.model)),
        ProviderKind::Anthropic => Arc::new(Anthropic::new(key).with_model(&config.model)),
        ProviderKind::Gemini => Arc::new(Gemini::new(key).with_model(&config.model)),
    }
}

/// Send a request and decode the JSON envelope.
///
/// Non-2xx statuses become `Api` errors carrying the body, undecodable
/// bodies become `InvalidResponse`. The timeout covers the whole exchange,
/// body included.
async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, ProviderError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    if !status.is_success() {
        return Err(ProviderError::Api(format!("{}: {}", status, body)));
    }

    serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

/// Request URLs can carry credentials, so they never reach error text
fn transport_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::Http(e.without_url())
    }
}

fn non_empty_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_provider() {
        let config = AgentConfig::default();
        let provider = from_config(&config);
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "qwen2.5:7b");

        let config = AgentConfig {
            provider: ProviderKind::Anthropic,
            model: "claude-3-haiku-20240307".into(),
            api_key: Some("sk-ant".into()),
            ..AgentConfig::default()
        };
        let provider = from_config(&config);
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.model(), "claude-3-haiku-20240307");
    }

    #[tokio::test]
    async fn test_transport_error_omits_url() {
        let url = "http://127.0.0.1:9/v1/generate?key=SECRET-KEY-123";
        let result: Result<serde_json::Value, _> =
            send_json(reqwest::Client::new().post(url), HOSTED_TIMEOUT).await;

        let err = result.unwrap_err();
        assert!(matches!(err, ProviderError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
    }

    #[test]
    fn test_timeout_display() {
        assert_eq!(
            ProviderError::Timeout(LOCAL_TIMEOUT).to_string(),
            "Timeout after 60s"
        );
    }

    #[test]
    fn test_blank_key_treated_as_missing() {
        assert_eq!(non_empty_key(Some("  ")), None);
        assert_eq!(non_empty_key(Some("sk")), Some("sk".to_string()));
    }
}
