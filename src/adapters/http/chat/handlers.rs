//! HTTP handlers for the chat endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use super::dto::{ChatRequest, ChatResponse, ErrorResponse, HealthResponse};
use crate::application::Orchestrator;
use crate::config::StreamConfig;
use crate::domain::orchestration::{OrchestrationRequest, OrchestrationResponse, Outcome, Rejection};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for chat handlers.
#[derive(Clone)]
pub struct ChatAppState {
    pub orchestrator: Arc<Orchestrator>,
    pub stream: StreamConfig,
}

impl ChatAppState {
    pub fn new(orchestrator: Arc<Orchestrator>, stream: StreamConfig) -> Self {
        Self {
            orchestrator,
            stream,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// POST /api/chat
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/chat - Run one prompt through the pipeline.
///
/// # Status codes
/// - 200 OK: answered (possibly with partial failures, see `errors`)
/// - 400 Bad Request: malformed body, empty ids or prompt
/// - 422 Unprocessable Entity: unsafe content
/// - 429 Too Many Requests: rate limited, with `Retry-After`
/// - 500 Internal Server Error: critical failure, apology text
pub async fn chat(
    State(state): State<ChatAppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ChatApiError> {
    let request = parse_request(payload)?;
    let response = state.orchestrator.process(&request).await;
    Ok(render(response))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

pub(super) fn parse_request(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<OrchestrationRequest, ChatApiError> {
    let Json(body) = payload.map_err(|e| ChatApiError::BadRequest(e.body_text()))?;
    body.into_request()
        .map_err(|e| ChatApiError::BadRequest(e.to_string()))
}

fn render(response: OrchestrationResponse) -> Response {
    let (status, retry_after) = match &response.outcome {
        Outcome::Completed => (StatusCode::OK, None),
        Outcome::Rejected(Rejection::UnsafeContent { .. }) => (StatusCode::UNPROCESSABLE_ENTITY, None),
        Outcome::Rejected(Rejection::RateLimited { retry_after_ms }) => (
            StatusCode::TOO_MANY_REQUESTS,
            Some(retry_after_ms.div_ceil(1000).max(1)),
        ),
        Outcome::Failed => (StatusCode::INTERNAL_SERVER_ERROR, None),
    };

    let mut http = (status, Json(ChatResponse::from(response))).into_response();
    if let Some(seconds) = retry_after {
        http.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    }
    http
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Errors raised before the pipeline runs.
#[derive(Debug)]
pub enum ChatApiError {
    BadRequest(String),
}

impl IntoResponse for ChatApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ChatApiError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "rejected malformed chat request");
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
        };

        (status, Json(error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RequestId;
    use crate::domain::orchestration::ResponseSource;

    fn response(outcome: Outcome) -> OrchestrationResponse {
        OrchestrationResponse {
            request_id: RequestId::new(),
            response: "text".into(),
            source: ResponseSource::Generated,
            domain: None,
            outcome,
            trace: vec![],
            warnings: vec![],
            errors: vec![],
        }
    }

    #[test]
    fn maps_outcomes_to_status_codes() {
        assert_eq!(render(response(Outcome::Completed)).status(), StatusCode::OK);
        assert_eq!(
            render(response(Outcome::Rejected(Rejection::UnsafeContent {
                reason: "x".into()
            })))
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            render(response(Outcome::Failed)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn rate_limited_sets_retry_after() {
        let http = render(response(Outcome::Rejected(Rejection::RateLimited {
            retry_after_ms: 2_500,
        })));
        assert_eq!(http.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(http.headers()[header::RETRY_AFTER], "3");
    }
}
