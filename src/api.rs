//! HTTP API
//!
//! - `GET /health` → `{status, provider, model}`
//! - `GET /config` → effective configuration, credential masked
//! - `POST /agent` with `{task | query | message}` → [`AgentReply`]

use crate::agent::{Agent, AgentReply};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub const DEFAULT_PORT: u16 = 5001;

#[derive(Clone)]
pub struct AppState {
    agent: Arc<Agent>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub status: String,
    pub provider: String,
    pub model: String,
}

/// Body of `POST /agent`; callers use any one of the three field names
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AgentRequest {
    pub fn task(text: impl Into<String>) -> Self {
        Self {
            task: Some(text.into()),
            ..Self::default()
        }
    }

    /// First non-empty of `task`, `query`, `message`
    pub fn text(&self) -> &str {
        [&self.task, &self.query, &self.message]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

pub fn router(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(config))
        .route("/agent", post(run_agent))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { agent })
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let config = state.agent.config();
    Json(Health {
        status: "ok".into(),
        provider: config.provider.to_string(),
        model: config.model.clone(),
    })
}

async fn config(State(state): State<AppState>) -> Json<crate::core::AgentConfig> {
    Json(state.agent.config().redacted())
}

async fn run_agent(
    State(state): State<AppState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> (StatusCode, Json<AgentReply>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected agent request");
            return (
                rejection.status(),
                Json(AgentReply::err(format!("Invalid request: {}", rejection.body_text()))),
            );
        }
    };

    let reply = state.agent.process(request.text()).await;
    (StatusCode::OK, Json(reply))
}

/// Serve the API until Ctrl+C
pub async fn serve(agent: Arc<Agent>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    let config = agent.config();
    agent
        .audit()
        .service_start(&config.provider.to_string(), &config.model, &local.to_string());

    let audit_agent = agent.clone();
    axum::serve(listener, router(agent))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    audit_agent.audit().service_stop();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionLibrary, ActionTiming, MockDesktop};
    use crate::core::{AgentConfig, ProviderKind};
    use crate::providers::{LlmProvider, ProviderError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct Offline;

    #[async_trait]
    impl LlmProvider for Offline {
        fn name(&self) -> &str {
            "openai"
        }

        fn model(&self) -> &str {
            "gpt-4o-mini"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Api("offline".into()))
        }
    }

    fn app() -> Router {
        let config = AgentConfig {
            provider: ProviderKind::OpenAI,
            model: "gpt-4o-mini".into(),
            api_key: Some("sk-secret".into()),
            ..AgentConfig::default()
        };
        let actions = ActionLibrary::new(Arc::new(MockDesktop::new()))
            .with_timing(ActionTiming::instant());
        let agent = Agent::new(Arc::new(config), Arc::new(Offline), Arc::new(actions));
        router(Arc::new(agent))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_agent(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/agent")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_request_text_precedence() {
        let request = AgentRequest {
            task: Some(String::new()),
            query: Some("open calculator".into()),
            message: Some("ignored".into()),
        };
        assert_eq!(request.text(), "open calculator");
        assert_eq!(AgentRequest::default().text(), "");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"status": "ok", "provider": "openai", "model": "gpt-4o-mini"})
        );
    }

    #[tokio::test]
    async fn test_config_hides_key() {
        let response = app()
            .oneshot(Request::builder().uri("/config").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["api_key"], "***hidden***");
        assert_eq!(body["provider"], "openai");
        assert!(!body.to_string().contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_agent_empty_task() {
        let response = app().oneshot(post_agent("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"success": false, "error": "No input provided"})
        );
    }

    #[tokio::test]
    async fn test_agent_message_field() {
        let response = app()
            .oneshot(post_agent(r#"{"message": "open calculator"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Opened calculator");
    }

    #[tokio::test]
    async fn test_agent_without_plan() {
        let response = app()
            .oneshot(post_agent(r#"{"task": "open chrome and search"}"#))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Could not create plan"));
    }

    #[tokio::test]
    async fn test_agent_malformed_body() {
        let response = app().oneshot(post_agent("not json")).await.unwrap();
        assert!(response.status().is_client_error());
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/agent")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
