//! Axum routes for the feedback endpoint.

use axum::routing::post;
use axum::Router;

use super::handlers::submit_feedback;
use crate::adapters::http::chat::ChatAppState;

/// Routes relative to `/api`.
///
/// - POST /feedback - explicit feedback on an answer
pub fn feedback_routes() -> Router<ChatAppState> {
    Router::new().route("/feedback", post(submit_feedback))
}
