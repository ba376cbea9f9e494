//! # medstream
//!
//! Streaming support for the clinical case-analysis assistant: a typed SSE
//! event codec, word-boundary chunking for LLM output, and classified
//! streaming errors with recovery advice.
//!
//! ## Key Features
//!
//! - **Typed Events**: Closed event vocabulary with an exact SSE wire codec
//! - **Word-Boundary Chunking**: Splits LLM deltas without breaking words mid-stream
//! - **Error Classification**: Stable error codes mapped to categories and recoverability
//! - **Recovery Advice**: Per-code retry, backoff, and fallback strategies for clients
//! - **Buffered Delivery**: Bounded event queue with keep-alive heartbeats
//!
//! ## Example
//!
//! ```rust
//! use medstream::{ErrorCode, RecoveryAction, StreamingError};
//!
//! let error = StreamingError::new(ErrorCode::ConnectionFailed, "connection refused");
//! assert!(error.is_recoverable());
//!
//! let strategy = error.recovery_strategy();
//! assert_eq!(strategy.action, RecoveryAction::RetryWithBackoff);
//! assert!(strategy.backoff_ms.is_some());
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

pub mod chunk;
pub mod error;

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod recovery;
pub mod sse;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use chunk::{chunk_deltas, word_chunks, StreamChunk, DEFAULT_CHUNK_SIZE};
pub use error::{ErrorCategory, ErrorCode, StreamingError};
pub use recovery::{RecoveryAction, RecoveryPolicy, RecoveryStrategy};
pub use sse::{
    event_stream, stream_with_delay, SseError, SseEvent, SseEventGenerator, SseEventType,
    SseResult, TargetPanel,
};
