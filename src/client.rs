//! HTTP client for a running deskagent service

use crate::agent::AgentReply;
use crate::api::{AgentRequest, Health, DEFAULT_PORT};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Planning can take a minute on a local model, plus execution time
const TASK_TIMEOUT: Duration = Duration::from_secs(180);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Backend is not running at {0}")]
    Unreachable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub fn default_url() -> String {
    format!("http://localhost:{}", DEFAULT_PORT)
}

pub struct AgentClient {
    base_url: String,
    client: Client,
}

impl AgentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').into(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        Ok(response.error_for_status()?.json().await?)
    }

    /// Submit a task and wait for the reply
    pub async fn send(&self, task: &str) -> Result<AgentReply, ClientError> {
        let response = self
            .client
            .post(format!("{}/agent", self.base_url))
            .json(&AgentRequest::task(task))
            .timeout(TASK_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        // Rejected bodies still carry an AgentReply
        Ok(response.json().await?)
    }

    fn classify(&self, error: reqwest::Error) -> ClientError {
        if error.is_connect() {
            ClientError::Unreachable(self.base_url.clone())
        } else {
            ClientError::Http(error)
        }
    }
}
