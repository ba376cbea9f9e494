//! Server-sent event model and wire codec.
//!
//! Events are typed ([`SseEventType`] is the closed set the product uses),
//! carry a JSON object payload, and encode to the SSE wire format consumed
//! by the browser's `EventSource`:
//!
//! ```text
//! event: chunk
//! id: chunk-1712345678901-9f8a7b6c
//! data: {"content":"Patient presents with"}
//!
//! ```
//!
//! Event ids are generated automatically as
//! `{event_type}-{epoch_millis}-{uuid4 prefix}` so the client can resume and
//! de-duplicate; [`SseEvent::with_id`] overrides when the caller tracks its
//! own ids. Encoding never mangles payloads: data is serialized as a single
//! JSON line, so embedded newlines and quotes survive the frame.
//!
//! ```rust
//! use medstream::sse::{SseEvent, SseEventType};
//! use serde_json::{json, Map};
//!
//! let mut data = Map::new();
//! data.insert("content".to_string(), json!("Hello world"));
//!
//! let frame = SseEvent::new(SseEventType::Chunk, data).encode().unwrap();
//! assert!(frame.starts_with("event: chunk\n"));
//! assert!(frame.ends_with("\n\n"));
//! ```

use crate::logging::log_warn;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod generator;
pub mod workflow;

pub use generator::{stream_with_delay, SseEventGenerator};
pub use workflow::{event_stream, TargetPanel};

/// Payload size above which encoding logs a warning, in bytes.
const PAYLOAD_WARN_BYTES: usize = 50_000;

/// Convenient result type for SSE operations.
pub type SseResult<T> = std::result::Result<T, SseError>;

/// Errors produced by the SSE codec itself.
///
/// Streaming *failures* (timeouts, connection drops, ...) are not `SseError`s
/// — those are reported as [`crate::StreamingError`] values inside `error`
/// events. This type covers only the codec's own failure mode.
#[derive(Error, Debug)]
pub enum SseError {
    /// The event payload could not be serialized to JSON.
    #[error("failed to serialize event data: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

// ============================================================================
// Event types
// ============================================================================

/// The closed set of event types the assistant emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SseEventType {
    /// A slice of streamed content.
    Chunk,
    /// A workflow stage began streaming.
    Start,
    /// A workflow stage finished streaming.
    End,
    /// A streaming failure, payload carries the classified error.
    Error,
    /// Out-of-band stream information (chunk totals, stage progress).
    Metadata,
    /// Keep-alive frame on an idle stream.
    Heartbeat,
    /// Completion ratio update for a running stage.
    Progress,
    /// A workflow stage completed and was persisted.
    StageComplete,
}

impl SseEventType {
    /// Wire name of the event type (`"chunk"`, `"stage_complete"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            SseEventType::Chunk => "chunk",
            SseEventType::Start => "start",
            SseEventType::End => "end",
            SseEventType::Error => "error",
            SseEventType::Metadata => "metadata",
            SseEventType::Heartbeat => "heartbeat",
            SseEventType::Progress => "progress",
            SseEventType::StageComplete => "stage_complete",
        }
    }
}

impl fmt::Display for SseEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Events and the wire codec
// ============================================================================

/// One server-sent event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseEvent {
    /// The event type, written to the `event:` field.
    pub event_type: SseEventType,
    /// JSON object payload, written to the `data:` field.
    pub data: Map<String, Value>,
    /// Event id for client-side resume and de-duplication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client reconnection interval hint in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Build an event with an auto-generated id and no retry hint.
    pub fn new(event_type: SseEventType, data: Map<String, Value>) -> Self {
        Self {
            event_type,
            data,
            id: Some(generate_event_id(event_type)),
            retry: None,
        }
    }

    /// Replace the auto-generated id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach a reconnection interval hint, in milliseconds.
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }

    /// Encode this event as an SSE frame.
    ///
    /// Field order is `event:`, `id:` (if set), `retry:` (if set), `data:`,
    /// followed by the blank line that terminates the frame. Payloads larger
    /// than 50 KB encode fine but log a warning, since frames that big
    /// usually mean a missing chunking step upstream.
    pub fn encode(&self) -> SseResult<String> {
        let data_json = serde_json::to_string(&self.data)?;
        if data_json.len() > PAYLOAD_WARN_BYTES {
            log_warn!(
                event_type = %self.event_type,
                payload_bytes = data_json.len(),
                "Large SSE event payload"
            );
        }

        let mut frame = String::with_capacity(data_json.len() + 64);
        frame.push_str("event: ");
        frame.push_str(self.event_type.as_str());
        frame.push('\n');
        if let Some(id) = &self.id {
            frame.push_str("id: ");
            frame.push_str(id);
            frame.push('\n');
        }
        if let Some(retry) = self.retry {
            frame.push_str("retry: ");
            frame.push_str(&retry.to_string());
            frame.push('\n');
        }
        frame.push_str("data: ");
        frame.push_str(&data_json);
        frame.push_str("\n\n");
        Ok(frame)
    }
}

/// `{event_type}-{epoch_millis}-{uuid4 prefix}`, unique per event.
fn generate_event_id(event_type: SseEventType) -> String {
    let millis = Utc::now().timestamp_millis();
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", event_type, millis, &uuid[..8])
}

/// Unwrap a `json!({...})` literal into the payload map shape.
pub(crate) fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
