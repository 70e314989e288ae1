//! Integration tests for the feedback HTTP endpoint.

use std::path::Path;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use switchboard::adapters::http::{chat_router, ChatAppState};
use switchboard::adapters::inference::MockInferenceProvider;
use switchboard::application::build_orchestrator;
use switchboard::config::{AppConfig, FeedbackBackend};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app_with(config: AppConfig) -> Router {
    let mock = MockInferenceProvider::new().respond_when("2+2", "4");
    let orchestrator = build_orchestrator(&config, Arc::new(mock)).unwrap();
    chat_router(ChatAppState::new(Arc::new(orchestrator), config.stream.clone()))
}

fn file_backed(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.feedback.backend = FeedbackBackend::File;
    config.feedback.data_dir = dir.to_path_buf();
    config
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn stored_lines(dir: &Path) -> Vec<Value> {
    let mut lines = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let text = std::fs::read_to_string(entry.unwrap().path()).unwrap();
        lines.extend(text.lines().map(|l| serde_json::from_str::<Value>(l).unwrap()));
    }
    lines
}

// =============================================================================
// POST /api/feedback
// =============================================================================

#[tokio::test]
async fn feedback_is_stored_and_acknowledged() {
    let dir = TempDir::new().unwrap();
    let app = app_with(file_backed(dir.path()));

    let response = app
        .oneshot(post(
            "/api/feedback",
            json!({
                "userId": "u1",
                "sessionId": "web-1",
                "type": "thumbs_up",
                "prompt": "What is 2+2?",
                "response": "4",
                "details": "quick and right"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);

    let lines = stored_lines(dir.path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], body["id"]);
    assert_eq!(lines[0]["type"], "thumbs_up");
    assert_eq!(lines[0]["details"], "quick and right");
}

#[tokio::test]
async fn feedback_can_reference_a_chat_answer() {
    let dir = TempDir::new().unwrap();
    let app = app_with(file_backed(dir.path()));

    let chat = app
        .clone()
        .oneshot(post(
            "/api/chat",
            json!({ "prompt": "What is 2+2?", "context": { "userId": "u1", "sessionId": "web-1" } }),
        ))
        .await
        .unwrap();
    let chat = json_body(chat).await;
    let request_id = chat["requestId"].clone();

    let response = app
        .oneshot(post(
            "/api/feedback",
            json!({
                "userId": "u1",
                "sessionId": "web-1",
                "type": "incorrect",
                "prompt": "What is 2+2?",
                "response": chat["response"],
                "requestId": request_id.clone()
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The chat request left its own implicit record next to the explicit one.
    let lines = stored_lines(dir.path());
    let kinds: Vec<&str> = lines.iter().map(|l| l["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["implicit_positive", "incorrect"]);
    assert!(lines.iter().all(|l| l["requestId"] == request_id));
}

#[tokio::test]
async fn invalid_feedback_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let app = app_with(file_backed(dir.path()));

    for body in [
        json!({ "userId": "u1", "sessionId": "web-1", "type": "meh", "prompt": "q" }),
        json!({ "userId": "", "sessionId": "web-1", "type": "helpful", "prompt": "q" }),
        json!({ "userId": "u1", "sessionId": "web-1", "type": "helpful", "prompt": "  " }),
        json!({ "userId": "u1", "sessionId": "web-1", "type": "implicit_negative", "prompt": "q" }),
        json!({ "userId": "u1", "type": "helpful", "prompt": "q" }),
    ] {
        let response = app.clone().oneshot(post("/api/feedback", body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "accepted {body}");
        assert_eq!(json_body(response).await["code"], "VALIDATION_FAILED");
    }

    assert!(!dir.path().exists() || stored_lines(dir.path()).is_empty());
}

#[tokio::test]
async fn disabled_feedback_is_unavailable() {
    let mut config = AppConfig::default();
    config.feedback.enabled = false;

    let response = app_with(config)
        .oneshot(post(
            "/api/feedback",
            json!({ "userId": "u1", "sessionId": "web-1", "type": "helpful", "prompt": "q" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["code"], "FEATURE_DISABLED");
}
