//! Integration tests for the chat HTTP endpoints.
//!
//! Requests go through the full axum router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use switchboard::adapters::http::{chat_router, ChatAppState};
use switchboard::adapters::inference::MockInferenceProvider;
use switchboard::application::build_orchestrator;
use switchboard::config::{AppConfig, StreamConfig};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn app_with(config: AppConfig, mock: &MockInferenceProvider) -> Router {
    let orchestrator = build_orchestrator(&config, Arc::new(mock.clone())).unwrap();
    chat_router(ChatAppState::new(Arc::new(orchestrator), config.stream.clone()))
}

fn app(mock: &MockInferenceProvider) -> Router {
    app_with(AppConfig::default(), mock)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn chat_body(prompt: &str, user: &str) -> Value {
    json!({
        "prompt": prompt,
        "context": { "userId": user, "sessionId": "web-1" }
    })
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// POST /api/chat
// =============================================================================

#[tokio::test]
async fn chat_returns_answer_with_trace() {
    let mock = MockInferenceProvider::new().respond_when("synonym", "Glad, cheerful.");

    let response = app(&mock)
        .oneshot(post("/api/chat", chat_body("Give me a synonym for happy", "u1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["response"], "Glad, cheerful.");
    assert_eq!(body["source"], "generated");
    assert_eq!(body["domain"], "vocabulary");
    assert_eq!(body["outcome"], "completed");
    assert!(body["trace"].as_array().unwrap().len() > 5);
    assert!(body["warnings"].is_array());
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn unsafe_prompt_is_unprocessable() {
    let mock = MockInferenceProvider::new();

    let response = app(&mock)
        .oneshot(post("/api/chat", chat_body("how to hack a bank", "u1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["outcome"], "rejected");
    assert!(!body["response"].as_str().unwrap().contains("hack"));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn rate_limited_request_gets_retry_after() {
    let mut config = AppConfig::default();
    config.gate.request_limit = 1;
    let mock = MockInferenceProvider::new();
    let app = app_with(config, &mock);

    let first = app
        .clone()
        .oneshot(post("/api/chat", chat_body("first question", "u1")))
        .await
        .unwrap();
    let second = app
        .oneshot(post("/api/chat", chat_body("second question", "u1")))
        .await
        .unwrap();

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = second.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let mock = MockInferenceProvider::new();
    let cases = [
        json!({ "prompt": "hi" }),
        json!({ "prompt": "   ", "context": { "userId": "u1", "sessionId": "s1" } }),
        json!({ "prompt": "hi", "context": { "userId": "", "sessionId": "s1" } }),
        json!({ "prompt": "x".repeat(32_001), "context": { "userId": "u1", "sessionId": "s1" } }),
    ];

    for case in cases {
        let response = app(&mock).oneshot(post("/api/chat", case)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }
    assert_eq!(mock.call_count(), 0);
}

// =============================================================================
// POST /api/chat/stream
// =============================================================================

#[tokio::test]
async fn stream_emits_chunks_then_end() {
    let mock = MockInferenceProvider::new().respond_when("haiku", "An old silent pond. A frog jumps in.");
    let config = AppConfig {
        stream: StreamConfig {
            chunk_size: 8,
            ..StreamConfig::default()
        },
        ..AppConfig::default()
    };

    let response = app_with(config, &mock)
        .oneshot(post("/api/chat/stream", chat_body("Write a haiku", "u1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    let chunk_events = text.matches("event: chunk").count();
    assert_eq!(chunk_events, 5);
    let end_at = text.find("event: end").expect("end event");
    assert!(text.rfind("event: chunk").unwrap() < end_at);
    assert!(text.contains(r#""outcome":"completed""#));
    assert!(!text.contains("event: cancelled"));
}

#[tokio::test]
async fn stream_route_absent_when_disabled() {
    let mock = MockInferenceProvider::new();
    let config = AppConfig {
        stream: StreamConfig {
            enabled: false,
            ..StreamConfig::default()
        },
        ..AppConfig::default()
    };

    let response = app_with(config, &mock)
        .oneshot(post("/api/chat/stream", chat_body("Write a haiku", "u1")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn stream_rejects_malformed_body() {
    let mock = MockInferenceProvider::new();
    let response = app(&mock)
        .oneshot(post("/api/chat/stream", json!({ "context": {} })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// GET /health
// =============================================================================

#[tokio::test]
async fn health_reports_ok() {
    let response = app(&MockInferenceProvider::new())
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}
