//! Workflow-facing event constructors and the chunk-to-event pipeline.
//!
//! The case-analysis workflow streams each stage's output into one of two
//! UI panels. The constructors here build the events that drive that UI;
//! [`event_stream`] wraps a stream of [`StreamChunk`]s in the standard
//! `start` / `chunk`* / `end` framing, converting a failure into a terminal
//! `error` event.

use super::{into_object, SseEvent, SseEventType};
use crate::chunk::StreamChunk;
use crate::error::StreamingError;
use crate::logging::{log_debug, log_error};
use futures_util::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::pin::Pin;

/// Which UI panel a stage's output streams into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPanel {
    /// The step-by-step clinical reasoning panel.
    #[default]
    Reasoning,
    /// The conversational chat panel.
    Chat,
}

impl TargetPanel {
    /// Wire name of the panel (`"reasoning"` or `"chat"`).
    pub fn as_str(self) -> &'static str {
        match self {
            TargetPanel::Reasoning => "reasoning",
            TargetPanel::Chat => "chat",
        }
    }
}

impl fmt::Display for TargetPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SseEvent {
    /// A `chunk` event carrying one slice of streamed content.
    pub fn chunk(
        content: &str,
        position: usize,
        is_word_boundary: bool,
        stage_id: Option<&str>,
    ) -> Self {
        let mut data = into_object(json!({
            "content": content,
            "position": position,
            "length": content.len(),
            "is_word_boundary": is_word_boundary,
        }));
        if let Some(stage_id) = stage_id {
            data.insert("stage_id".to_string(), Value::from(stage_id));
        }
        SseEvent::new(SseEventType::Chunk, data)
    }

    /// A stage lifecycle event (`start`, `end`, `stage_complete`, ...).
    ///
    /// `extra` is merged into the payload after the standard
    /// `stage_id` / `stage_name` / `target_panel` keys, so callers can
    /// attach per-event fields such as chunk totals or persisted record ids.
    pub fn stage(
        event_type: SseEventType,
        stage_id: &str,
        stage_name: &str,
        target_panel: TargetPanel,
        extra: Map<String, Value>,
    ) -> Self {
        let mut data = into_object(json!({
            "stage_id": stage_id,
            "stage_name": stage_name,
            "target_panel": target_panel,
        }));
        data.extend(extra);
        SseEvent::new(event_type, data)
    }

    /// A `progress` event reporting how far a stage's stream has advanced.
    ///
    /// The payload's `progress_percent` is rounded to two decimal places and
    /// reads `0` when `total_chunks` is zero, so a stage whose size is not
    /// yet known still produces a well-formed event.
    pub fn progress(
        stage_id: &str,
        current_chunk: usize,
        total_chunks: usize,
        estimated_duration_ms: Option<u64>,
    ) -> Self {
        let progress_percent = if total_chunks == 0 {
            0.0
        } else {
            let percent = current_chunk as f64 / total_chunks as f64 * 100.0;
            (percent * 100.0).round() / 100.0
        };
        let mut data = into_object(json!({
            "stage_id": stage_id,
            "current_chunk": current_chunk,
            "total_chunks": total_chunks,
            "progress_percent": progress_percent,
        }));
        if let Some(duration_ms) = estimated_duration_ms {
            data.insert(
                "estimated_duration_ms".to_string(),
                Value::from(duration_ms),
            );
        }
        SseEvent::new(SseEventType::Progress, data)
    }

    /// An `error` event carrying a classified streaming failure.
    ///
    /// The payload keeps the fields the client's recovery logic keys on:
    /// the error code, the human-readable message, and whether the failure
    /// is recoverable.
    pub fn stream_error(
        error: &StreamingError,
        stage_id: Option<&str>,
        target_panel: TargetPanel,
    ) -> Self {
        let mut data = into_object(json!({
            "message": error.message,
            "code": error.code,
            "recoverable": error.recoverable,
            "target_panel": target_panel,
        }));
        if let Some(stage_id) = stage_id {
            data.insert("stage_id".to_string(), Value::from(stage_id));
        }
        SseEvent::new(SseEventType::Error, data)
    }
}

enum PipelineState<S> {
    Start { chunks: Pin<Box<S>> },
    Streaming { chunks: Pin<Box<S>>, emitted: usize },
    Done,
}

/// Wrap a chunk stream in the standard stage framing.
///
/// Emits a `start` event, then one `chunk` event per [`StreamChunk`], then
/// an `end` event whose payload reports `total_chunks`. If the underlying
/// stream yields an error, the pipeline emits a single `error` event in its
/// place and terminates; nothing follows an error.
///
/// ```rust,no_run
/// use futures_util::{stream, StreamExt};
/// use medstream::chunk::word_chunks;
/// use medstream::sse::{event_stream, TargetPanel};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let chunks = stream::iter(
///     word_chunks("Differential diagnosis follows", 8, 0)
///         .into_iter()
///         .map(Ok),
/// );
/// let events: Vec<_> = event_stream(chunks, "stage-1", TargetPanel::Reasoning)
///     .collect()
///     .await;
/// assert!(events.len() >= 2, "framing adds start and end events");
/// # }
/// ```
pub fn event_stream<S>(
    chunks: S,
    stage_id: impl Into<String>,
    target_panel: TargetPanel,
) -> impl Stream<Item = SseEvent>
where
    S: Stream<Item = Result<StreamChunk, StreamingError>>,
{
    let stage_id = stage_id.into();
    let state = PipelineState::Start {
        chunks: Box::pin(chunks),
    };
    stream::unfold(state, move |state| {
        let stage_id = stage_id.clone();
        async move {
            match state {
                PipelineState::Start { chunks } => {
                    log_debug!(stage_id = %stage_id, "Starting event stream");
                    let data = into_object(json!({
                        "stage_id": stage_id,
                        "target_panel": target_panel,
                    }));
                    let event = SseEvent::new(SseEventType::Start, data);
                    Some((event, PipelineState::Streaming { chunks, emitted: 0 }))
                }
                PipelineState::Streaming { mut chunks, emitted } => match chunks.next().await {
                    Some(Ok(chunk)) => {
                        let event = SseEvent::chunk(
                            &chunk.content,
                            chunk.position,
                            chunk.is_word_boundary,
                            Some(&stage_id),
                        );
                        let emitted = emitted + 1;
                        Some((event, PipelineState::Streaming { chunks, emitted }))
                    }
                    Some(Err(error)) => {
                        log_error!(
                            stage_id = %stage_id,
                            code = %error.code,
                            "Streaming failed, emitting error event"
                        );
                        let event =
                            SseEvent::stream_error(&error, Some(&stage_id), target_panel);
                        Some((event, PipelineState::Done))
                    }
                    None => {
                        log_debug!(
                            stage_id = %stage_id,
                            total_chunks = emitted,
                            "Event stream complete"
                        );
                        let data = into_object(json!({
                            "stage_id": stage_id,
                            "target_panel": target_panel,
                            "total_chunks": emitted,
                        }));
                        let event = SseEvent::new(SseEventType::End, data);
                        Some((event, PipelineState::Done))
                    }
                },
                PipelineState::Done => None,
            }
        }
    })
}
