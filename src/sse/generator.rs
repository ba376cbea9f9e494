//! Buffered event delivery with keep-alive heartbeats.
//!
//! [`SseEventGenerator`] sits between a producer (the workflow pushing
//! events) and a consumer (the response body draining frames). Events queue
//! up to a bounded buffer; when the buffer overflows, the oldest event is
//! dropped so a slow consumer degrades instead of exhausting memory. While
//! the queue is idle the generator emits `heartbeat` frames so proxies and
//! the browser keep the connection open.

use super::{into_object, SseError, SseEvent, SseEventType, TargetPanel};
use crate::error::{ErrorCode, StreamingError};
use crate::logging::{log_debug, log_warn};
use chrono::Utc;
use futures_util::{stream, Stream, StreamExt};
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Default queue capacity, in events.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Default idle interval between heartbeat frames.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// How long an idle generator sleeps between queue polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Bounded event queue that yields encoded SSE frames.
#[derive(Debug)]
pub struct SseEventGenerator {
    buffer_size: usize,
    heartbeat_interval: Duration,
    queue: VecDeque<SseEvent>,
    last_heartbeat: Instant,
    active: bool,
}

impl SseEventGenerator {
    /// Build a generator with the given queue capacity and heartbeat
    /// interval. A zero capacity is pinned to one slot.
    pub fn new(buffer_size: usize, heartbeat_interval: Duration) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            heartbeat_interval,
            queue: VecDeque::new(),
            last_heartbeat: Instant::now(),
            active: true,
        }
    }

    /// Queue an event for delivery.
    ///
    /// When the buffer is full the oldest queued event is dropped to make
    /// room, and the drop is logged. Delivery order is FIFO.
    pub fn push(&mut self, event: SseEvent) {
        if self.queue.len() >= self.buffer_size {
            self.queue.pop_front();
            log_warn!(
                buffer_size = self.buffer_size,
                "Event buffer full, dropping oldest event"
            );
        }
        self.queue.push_back(event);
    }

    /// Number of events waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Whether the generator is still producing frames.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Resume a stopped generator. Resets the heartbeat clock so the first
    /// idle heartbeat fires a full interval from now.
    pub fn start(&mut self) {
        self.active = true;
        self.last_heartbeat = Instant::now();
    }

    /// Stop the generator. [`next_event`](Self::next_event) returns `None`
    /// from the next call on, even if events are still queued.
    pub fn stop(&mut self) {
        self.active = false;
        log_debug!(pending = self.queue.len(), "Event generator stopped");
    }

    /// Produce the next encoded frame.
    ///
    /// Drains the queue in order. While the queue is empty, waits in
    /// [`POLL_INTERVAL`] steps and emits a `heartbeat` frame whenever
    /// [`heartbeat_interval`](Self::new) has elapsed since the last one.
    /// Returns `None` once the generator is stopped.
    ///
    /// An event that fails to encode deactivates the generator: the failure
    /// is reported to the client as a final `error` frame so the consumer
    /// is not left waiting on a stream that silently died.
    pub async fn next_event(&mut self) -> Option<String> {
        loop {
            if !self.active {
                return None;
            }
            if let Some(event) = self.queue.pop_front() {
                match event.encode() {
                    Ok(frame) => return Some(frame),
                    Err(error) => {
                        self.active = false;
                        return failure_frame(&error);
                    }
                }
            }
            if self.last_heartbeat.elapsed() >= self.heartbeat_interval {
                self.last_heartbeat = Instant::now();
                match heartbeat_event().encode() {
                    Ok(frame) => return Some(frame),
                    Err(error) => {
                        log_warn!(error = %error, "Failed to encode heartbeat frame");
                    }
                }
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Drive the generator as a stream of frames.
    ///
    /// The stream borrows the generator, so the caller can drop it and then
    /// [`stop`](Self::stop) or keep [`push`](Self::push)ing between polls.
    pub fn stream_frames(&mut self) -> impl Stream<Item = String> + '_ {
        stream::unfold(self, |generator| async move {
            let frame = generator.next_event().await?;
            Some((frame, generator))
        })
    }
}

impl Default for SseEventGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE, DEFAULT_HEARTBEAT_INTERVAL)
    }
}

/// Keep-alive frame payload: the current epoch timestamp in milliseconds.
fn heartbeat_event() -> SseEvent {
    let data = into_object(json!({
        "timestamp": Utc::now().timestamp_millis(),
    }));
    SseEvent::new(SseEventType::Heartbeat, data)
}

/// Terminal `error` frame emitted when a queued event cannot be encoded.
fn failure_frame(source: &SseError) -> Option<String> {
    let error = StreamingError::new(
        ErrorCode::ParsingError,
        format!("failed to encode queued event: {source}"),
    );
    SseEvent::stream_error(&error, None, TargetPanel::default())
        .encode()
        .ok()
}

/// Emit pre-built events as encoded frames with a fixed pause between them.
///
/// The first frame is emitted immediately; each later frame waits `delay`
/// first. Events that fail to encode are skipped with a warning rather than
/// tearing down the stream.
pub fn stream_with_delay(events: Vec<SseEvent>, delay: Duration) -> impl Stream<Item = String> {
    let mut first = true;
    stream::iter(events).filter_map(move |event| {
        let pause = if first { Duration::ZERO } else { delay };
        first = false;
        async move {
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
            match event.encode() {
                Ok(frame) => Some(frame),
                Err(error) => {
                    log_warn!(error = %error, "Skipping event that failed to encode");
                    None
                }
            }
        }
    })
}
