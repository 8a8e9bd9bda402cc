//! End-to-end tests: HTTP API → router → planner (mock Ollama) → executor
//! → recorded desktop

use deskagent::actions::{ActionLibrary, ActionTiming, MockDesktop};
use deskagent::agent::{Agent, AgentReply};
use deskagent::api;
use deskagent::client::AgentClient;
use deskagent::core::{AgentConfig, ProviderKind};
use deskagent::providers;
use mockito::Matcher;
use std::sync::Arc;

const NOTEPAD_PLAN: &str = r#"```json
[
  {"action": "open_app", "params": {"name": "notepad"}, "description": "Open Notepad"},
  {"action": "wait", "params": {"seconds": 0}, "description": "Wait for Notepad to load"},
  {"action": "type", "params": {"text": "Hello World"}, "description": "Type Hello World"},
  {"action": "hotkey", "params": {"keys": "ctrl, s"}, "description": "Save"}
]
```"#;

fn write_config(dir: &tempfile::TempDir, ollama_url: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.json");
    let config = serde_json::json!({
        "provider": "ollama",
        "model": "qwen2.5:7b",
        "ollama_url": ollama_url,
    });
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

fn agent_for(config: AgentConfig, desktop: Arc<MockDesktop>, shots: &std::path::Path) -> Arc<Agent> {
    let provider = providers::from_config(&config);
    let actions = ActionLibrary::new(desktop)
        .with_timing(ActionTiming::instant())
        .with_screenshot_dir(shots);
    Arc::new(Agent::new(Arc::new(config), provider, Arc::new(actions)))
}

/// Serve the router on an ephemeral port and return its base URL
async fn spawn_service(agent: Arc<Agent>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(agent)).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_planned_task_over_http() {
    let mut ollama = mockito::Server::new_async().await;
    let generate = ollama
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(serde_json::json!({"model": "qwen2.5:7b", "stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(serde_json::json!({"response": NOTEPAD_PLAN, "done": true}).to_string())
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = AgentConfig::load_with_env(&write_config(&dir, &ollama.url()), |_| None);
    assert_eq!(config.provider, ProviderKind::Ollama);

    let desktop = Arc::new(MockDesktop::new());
    let url = spawn_service(agent_for(config, desktop.clone(), dir.path())).await;

    let reply = AgentClient::new(&url)
        .send("open notepad and type Hello World then save")
        .await
        .unwrap();

    assert!(reply.success, "{:?}", reply);
    let message = reply.message.unwrap();
    assert!(message.starts_with("Task: open notepad and type Hello World then save\n\nSteps:\n"));
    assert!(message.contains("  ✓ Save"));
    assert!(message.ends_with("All steps completed"));

    let calls = desktop.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].starts_with("launch "));
    assert_eq!(calls[1], "type Hello World");
    assert_eq!(calls[2], "hotkey ctrl+s");
    generate.assert_async().await;
}

#[tokio::test]
async fn test_direct_open_never_calls_provider() {
    let mut ollama = mockito::Server::new_async().await;
    let generate = ollama
        .mock("POST", "/api/generate")
        .expect(0)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = AgentConfig::load_with_env(&write_config(&dir, &ollama.url()), |_| None);
    let desktop = Arc::new(MockDesktop::new());
    let url = spawn_service(agent_for(config, desktop.clone(), dir.path())).await;
    let client = AgentClient::new(&url);

    let reply = client.send("open calculator").await.unwrap();
    assert_eq!(reply, AgentReply::ok("Opened calculator"));

    let reply = client.send("help").await.unwrap();
    assert!(reply.message.unwrap().contains("Powered by: OLLAMA"));

    generate.assert_async().await;
}

#[tokio::test]
async fn test_provider_down_reports_no_plan() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on the discard port
    let config = AgentConfig::load_with_env(&write_config(&dir, "http://127.0.0.1:9"), |_| None);
    let desktop = Arc::new(MockDesktop::new());
    let url = spawn_service(agent_for(config, desktop.clone(), dir.path())).await;

    let reply = AgentClient::new(&url)
        .send("open chrome and search for rust")
        .await
        .unwrap();

    assert!(!reply.success);
    assert_eq!(
        reply.error.as_deref(),
        Some("Could not create plan. Check your LLM configuration.")
    );
    assert!(desktop.calls().is_empty());
}

#[tokio::test]
async fn test_failing_step_stops_plan_and_screenshot_lands_in_dir() {
    let plan = r#"[
  {"action": "screenshot", "params": {}, "description": "Capture the screen"},
  {"action": "click", "params": {"x": 5000, "y": 10}, "description": "Click off screen"},
  {"action": "press", "params": {"key": "enter"}, "description": "Confirm"}
]"#;
    let mut ollama = mockito::Server::new_async().await;
    ollama
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(serde_json::json!({"response": plan}).to_string())
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let shots = dir.path().join("shots");
    let config = AgentConfig::load_with_env(&write_config(&dir, &ollama.url()), |_| None);
    let desktop = Arc::new(MockDesktop::new().with_screen(1280, 720));
    let agent = agent_for(config, desktop.clone(), &shots);

    let reply = agent.process("take a screenshot and click the corner").await;

    assert!(!reply.success);
    let message = reply.message.unwrap();
    assert!(message.contains("  ✓ Capture the screen\n  ✗ Click off screen"));
    let failed = message.lines().find(|l| l.contains('✗')).unwrap();
    assert!(failed.contains("outside"), "{}", failed);
    assert!(!message.contains("Confirm"));
    assert!(message.ends_with("Execution stopped due to error"));

    assert_eq!(desktop.calls(), vec!["screenshot"]);
    let saved: Vec<_> = std::fs::read_dir(&shots).unwrap().collect();
    assert_eq!(saved.len(), 1);
}
