//! Ollama local inference via `/api/generate`

use super::{send_json, LlmProvider, ProviderError, LOCAL_TIMEOUT};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ollama provider
pub struct Ollama {
    base_url: String,
    model: String,
    timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl Ollama {
    pub fn new(url: &str, model: &str) -> Self {
        Self {
            base_url: url.trim_end_matches('/').into(),
            model: model.into(),
            timeout: LOCAL_TIMEOUT,
            client: Client::new(),
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmProvider for Ollama {
    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response: GenerateResponse =
            send_json(self.client.post(&url).json(&request), self.timeout).await?;
        Ok(response.response)
    }
}
