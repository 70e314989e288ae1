//! Server-Sent Events endpoint.
//!
//! Events: `chunk` (`{index, delta}`), then `end` with the trace and
//! diagnostics, or `cancelled`. When the client disconnects axum drops
//! the stream, which cancels the producer.

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;

use super::dto::{ChatRequest, ChunkEventDto, EndEventDto};
use super::handlers::{parse_request, ChatApiError, ChatAppState};
use crate::application::StreamEvent;

/// POST /api/chat/stream - Stream the answer as SSE.
pub async fn chat_stream(
    State(state): State<ChatAppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ChatApiError> {
    let request = parse_request(payload)?;
    let stream = state
        .orchestrator
        .process_streaming(request, &state.stream)
        .map(|event| Ok(to_sse(event)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn json_event(name: &'static str, payload: &impl Serialize) -> Event {
    match Event::default().event(name).json_data(payload) {
        Ok(event) => event,
        Err(e) => {
            tracing::error!(event = name, error = %e, "failed to encode SSE payload");
            Event::default().event("error").data("encoding failed")
        }
    }
}

fn to_sse(event: StreamEvent) -> Event {
    match event {
        StreamEvent::Chunk { index, delta } => json_event("chunk", &ChunkEventDto { index, delta }),
        StreamEvent::End(end) => json_event("end", &EndEventDto::from(*end)),
        StreamEvent::Cancelled => Event::default().event("cancelled").data("{}"),
    }
}
