//! Streaming delivery of an orchestrated answer.
//!
//! A producer task runs the request, then feeds the answer through a
//! bounded mpsc channel in fixed-size chunks followed by one terminal
//! event. Dropping the consumer side cancels the producer.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::Orchestrator;
use crate::config::StreamConfig;
use crate::domain::foundation::RequestId;
use crate::domain::orchestration::{
    OrchestrationRequest, OrchestrationResponse, Outcome, ResponseSource,
};
use crate::domain::routing::DomainTag;
use crate::domain::trace::TraceStep;

/// Everything about a streamed response except its text.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEnd {
    pub request_id: RequestId,
    pub source: ResponseSource,
    pub domain: Option<DomainTag>,
    pub outcome: Outcome,
    pub trace: Vec<TraceStep>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl From<OrchestrationResponse> for StreamEnd {
    fn from(response: OrchestrationResponse) -> Self {
        Self {
            request_id: response.request_id,
            source: response.source,
            domain: response.domain,
            outcome: response.outcome,
            trace: response.trace,
            warnings: response.warnings,
            errors: response.errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Chunk { index: usize, delta: String },
    End(Box<StreamEnd>),
    Cancelled,
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamEvent::Chunk { .. })
    }
}

/// Consumer half. Yields `Chunk`s until exactly one `End` or `Cancelled`.
pub struct ResponseStream {
    receiver: ReceiverStream<StreamEvent>,
    cancel: CancellationToken,
}

impl ResponseStream {
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.next().await
    }

    /// Stops the producer; a `Cancelled` event follows if it was still running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Stream for ResponseStream {
    type Item = StreamEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.receiver).poll_next(cx)
    }
}

impl Drop for ResponseStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Splits `text` into pieces of at most `size` characters.
pub fn chunk_text(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(size.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}

impl Orchestrator {
    /// Spawns the request on the runtime and returns its event stream.
    pub fn process_streaming(
        self: &Arc<Self>,
        request: OrchestrationRequest,
        config: &StreamConfig,
    ) -> ResponseStream {
        let (sender, receiver) = mpsc::channel(config.channel_capacity.max(1));
        let cancel = CancellationToken::new();
        let chunk_size = config.chunk_size;

        let orchestrator = Arc::clone(self);
        let token = cancel.clone();
        tokio::spawn(async move {
            let response = orchestrator.process_with_cancel(&request, &token).await;
            produce(response, chunk_size, sender, token).await;
        });

        ResponseStream {
            receiver: ReceiverStream::new(receiver),
            cancel,
        }
    }
}

async fn produce(
    mut response: OrchestrationResponse,
    chunk_size: usize,
    sender: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
) {
    let request_id = response.request_id;
    let text = std::mem::take(&mut response.response);

    for (index, delta) in chunk_text(&text, chunk_size).into_iter().enumerate() {
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            result = sender.send(StreamEvent::Chunk { index, delta }) => result.is_ok(),
        };
        if !sent {
            tracing::debug!(request_id = %request_id, chunk = index, "stream consumer gone");
            let _ = sender.try_send(StreamEvent::Cancelled);
            return;
        }
    }

    let terminal = if cancel.is_cancelled() {
        StreamEvent::Cancelled
    } else {
        StreamEvent::End(Box::new(StreamEnd::from(response)))
    };
    if sender.send(terminal).await.is_err() {
        tracing::debug!(request_id = %request_id, "stream consumer gone before end");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::inference::MockInferenceProvider;
    use crate::application::bootstrap::build_orchestrator;
    use crate::config::AppConfig;
    use crate::domain::foundation::{SessionId, UserId};
    use crate::domain::orchestration::RequestContext;
    use std::time::Duration;

    fn request(prompt: &str) -> OrchestrationRequest {
        OrchestrationRequest::new(
            prompt,
            RequestContext::new(UserId::new("u1").unwrap(), SessionId::new("s1").unwrap()),
        )
        .unwrap()
    }

    fn stream_config(chunk_size: usize) -> StreamConfig {
        StreamConfig {
            chunk_size,
            ..StreamConfig::default()
        }
    }

    #[test]
    fn chunks_respect_char_boundaries() {
        assert_eq!(chunk_text("héllo!", 2), vec!["hé", "ll", "o!"]);
        assert_eq!(chunk_text("abc", 10), vec!["abc"]);
        assert!(chunk_text("", 4).is_empty());
    }

    #[tokio::test]
    async fn chunks_then_end() {
        let mock = MockInferenceProvider::new().respond_when("poem", "Roses are red, violets are blue.");
        let orchestrator =
            Arc::new(build_orchestrator(&AppConfig::default(), Arc::new(mock)).unwrap());

        let mut stream = orchestrator.process_streaming(request("Write a poem"), &stream_config(10));

        let mut text = String::new();
        let mut indexes = Vec::new();
        let end = loop {
            match stream.recv().await.expect("stream closed early") {
                StreamEvent::Chunk { index, delta } => {
                    assert!(delta.chars().count() <= 10);
                    indexes.push(index);
                    text.push_str(&delta);
                }
                other => break other,
            }
        };

        assert_eq!(text, "Roses are red, violets are blue.");
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        let StreamEvent::End(end) = end else {
            panic!("expected end, got {end:?}");
        };
        assert_eq!(end.outcome, Outcome::Completed);
        assert!(!end.trace.is_empty());
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancelling_ends_with_cancelled() {
        let mock = MockInferenceProvider::new().with_delay(Duration::from_millis(200));
        let orchestrator =
            Arc::new(build_orchestrator(&AppConfig::default(), Arc::new(mock)).unwrap());

        let mut stream = orchestrator.process_streaming(request("Tell me a long story"), &stream_config(5));
        stream.cancel();

        let mut last = None;
        while let Some(event) = stream.recv().await {
            last = Some(event);
        }
        assert_eq!(last, Some(StreamEvent::Cancelled));
    }
}
