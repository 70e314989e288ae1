//! Axum routes for the chat endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{chat, health, ChatAppState};
use super::streaming::chat_stream;
use crate::adapters::http::feedback::feedback_routes;

/// Routes relative to `/api`.
///
/// - POST /chat - one-shot JSON answer
/// - POST /chat/stream - SSE answer, only when streaming is enabled
pub fn chat_routes(streaming: bool) -> Router<ChatAppState> {
    let router = Router::new().route("/chat", post(chat));
    if streaming {
        router.route("/chat/stream", post(chat_stream))
    } else {
        router
    }
}

/// Full router: chat and feedback routes under `/api` plus `/health`.
pub fn chat_router(state: ChatAppState) -> Router {
    let api = chat_routes(state.stream.enabled).merge(feedback_routes());
    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .with_state(state)
}
