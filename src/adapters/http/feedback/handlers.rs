//! HTTP handlers for the feedback endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::dto::{FeedbackRequest, FeedbackResponse};
use crate::adapters::http::chat::{ChatAppState, ErrorResponse};
use crate::ports::FeedbackError;

/// POST /api/feedback - Store explicit feedback on an answer.
///
/// # Status codes
/// - 201 Created: stored, body carries the record id
/// - 400 Bad Request: malformed body, unknown type, empty ids or prompt
/// - 503 Service Unavailable: feedback collection is disabled
/// - 500 Internal Server Error: the recorder failed
pub async fn submit_feedback(
    State(state): State<ChatAppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Response, FeedbackApiError> {
    let Json(body) = payload.map_err(|e| FeedbackApiError::BadRequest(e.body_text()))?;
    let record = body
        .into_record()
        .map_err(|e| FeedbackApiError::BadRequest(e.to_string()))?;

    state.orchestrator.submit_feedback(&record).await?;

    let body = FeedbackResponse {
        success: true,
        id: record.id,
    };
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Errors from the feedback endpoint.
#[derive(Debug)]
pub enum FeedbackApiError {
    BadRequest(String),
    Disabled,
    Internal(String),
}

impl From<FeedbackError> for FeedbackApiError {
    fn from(err: FeedbackError) -> Self {
        match err {
            FeedbackError::Disabled => FeedbackApiError::Disabled,
            other => FeedbackApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for FeedbackApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            FeedbackApiError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "rejected malformed feedback");
                (StatusCode::BAD_REQUEST, ErrorResponse::bad_request(msg))
            }
            FeedbackApiError::Disabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse::disabled("feedback collection is disabled"),
            ),
            FeedbackApiError::Internal(msg) => {
                tracing::error!(error = %msg, "feedback could not be stored");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::internal("feedback could not be stored"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}
