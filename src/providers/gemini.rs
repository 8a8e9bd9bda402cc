//! Google Gemini `generateContent`

use super::{non_empty_key, send_json, LlmProvider, ProviderError, HOSTED_TIMEOUT, MAX_TOKENS, TEMPERATURE};
use crate::core::ProviderKind;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Google Gemini API provider
pub struct Gemini {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl Gemini {
    pub fn new(api_key: Option<&str>) -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: non_empty_key(api_key),
            model: ProviderKind::Gemini.default_model().into(),
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
impl LlmProvider for Gemini {
    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingApiKey("gemini"))?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_TOKENS,
            },
        };

        let response: GenerateContentResponse = send_json(
            self.client
                .post(&url)
                .header("x-goog-api-key", key)
                .json(&request),
            self.timeout,
        )
        .await?;

        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ProviderError::InvalidResponse("No candidates in response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_generate_extracts_first_candidate() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "POST",
                Matcher::Regex(r"^/v1beta/models/gemini-2\.0-flash:generateContent".into()),
            )
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": {"maxOutputTokens": 1024}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "[]"}], "role": "model"}}]}"#)
            .create_async()
            .await;

        let provider = Gemini::new(Some("g-key")).with_base_url(&server.url());
        assert_eq!(provider.generate("plan it").await.unwrap(), "[]");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_candidates_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let provider = Gemini::new(Some("g-key")).with_base_url(&server.url());
        assert!(matches!(
            provider.generate("plan it").await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_key_stays_out_of_errors() {
        let provider = Gemini::new(Some("SECRET-KEY-123")).with_base_url("http://127.0.0.1:9");
        let err = provider.generate("plan it").await.unwrap_err();
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{}", err);
    }
}
