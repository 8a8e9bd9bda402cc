//! Anthropic Claude messages API

use super::{non_empty_key, send_json, LlmProvider, ProviderError, HOSTED_TIMEOUT, MAX_TOKENS};
use crate::core::ProviderKind;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct Anthropic {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

impl Anthropic {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            base_url: "https://api.anthropic.com".into(),
            api_key: non_empty_key(api_key),
            model: ProviderKind::Anthropic.default_model().into(),
            timeout: HOSTED_TIMEOUT,
            client: Client::new(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').into();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for Anthropic {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("anthropic"))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response: MessagesResponse = send_json(
            self.client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", key)
                .header("anthropic-version", API_VERSION)
                .header("content-type", "application/json")
                .json(&request),
            self.timeout,
        )
        .await?;

        response
            .content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| ProviderError::InvalidResponse("No response content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_extracts_first_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-ant")
            .match_header("anthropic-version", API_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"content": [{"type": "text", "text": "[]"}], "stop_reason": "end_turn"}"#)
            .create_async()
            .await;

        let provider = Anthropic::new(Some("sk-ant")).with_base_url(&server.url());
        assert_eq!(provider.generate("plan it").await.unwrap(), "[]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_key() {
        let provider = Anthropic::new(Some("")).with_base_url("http://127.0.0.1:9");
        assert!(matches!(
            provider.generate("plan it").await,
            Err(ProviderError::MissingApiKey("anthropic"))
        ));
    }

    #[tokio::test]
    async fn test_overloaded_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type": "error", "error": {"type": "overloaded_error"}}"#)
            .create_async()
            .await;

        let provider = Anthropic::new(Some("sk-ant")).with_base_url(&server.url());
        let err = provider.generate("plan it").await.unwrap_err();
        assert!(matches!(err, ProviderError::Api(ref msg) if msg.contains("overloaded_error")));
    }
}
