//! Streaming error taxonomy for the case-analysis assistant.
//!
//! This module provides structured error handling for the SSE streaming path,
//! including error codes, category grouping, and recoverability policy.
//!
//! # Error Model
//!
//! Every failure on the streaming path is reported as a [`StreamingError`]
//! carrying a closed [`ErrorCode`]. The code alone determines the error's
//! [`ErrorCategory`] and whether it is recoverable:
//!
//! | code | category | recoverable |
//! |------|----------|-------------|
//! | `CONNECTION_FAILED` | `NETWORK` | yes |
//! | `NETWORK_ERROR` | `NETWORK` | yes |
//! | `STREAM_TIMEOUT` | `TIMEOUT` | yes |
//! | `RATE_LIMIT_EXCEEDED` | `RATE_LIMIT` | yes |
//! | `AUTHENTICATION_ERROR` | `AUTHENTICATION` | no |
//! | `PARSING_ERROR` | `PARSING` | no |
//! | `INVALID_EVENT` | `PARSING` | no |
//! | `CHUNK_SEQUENCE_ERROR` | `CLIENT` | no |
//! | `SERVER_ERROR` | `SERVER` | no |
//! | `UNKNOWN_ERROR` | `UNKNOWN` | no |
//!
//! `SERVER_ERROR` and `UNKNOWN_ERROR` are deliberately non-recoverable: the
//! product falls back to the batch request path for those rather than
//! retrying a stream that just failed for an unexplained reason.
//!
//! # Example
//!
//! ```rust
//! use medstream::{ErrorCategory, ErrorCode, StreamingError};
//!
//! let err = StreamingError::new(ErrorCode::StreamTimeout, "Stream timed out after 30 seconds");
//!
//! assert_eq!(err.category, ErrorCategory::Timeout);
//! assert!(err.is_recoverable());
//! ```
//!
//! Diagnostic payloads ride along without affecting classification:
//!
//! ```rust
//! use medstream::{ErrorCode, StreamingError};
//!
//! let err = StreamingError::new(ErrorCode::ParsingError, "JSON parse failed")
//!     .with_context_value("eventData", "invalid-json")
//!     .with_metadata_value("parseAttempts", 2);
//!
//! assert!(!err.is_recoverable());
//! ```

use crate::logging::{log_error, log_warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Error code and category enumerations
// ============================================================================

/// Precise failure condition detected on the streaming path.
///
/// This is a closed set: the transport layer reports the most specific code
/// it can determine, falling back to [`ErrorCode::UnknownError`]. Codes
/// serialize in SCREAMING_SNAKE_CASE to match the wire shape the client
/// consumes (`"CONNECTION_FAILED"`, `"STREAM_TIMEOUT"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The streaming connection could not be established.
    ConnectionFailed,
    /// An established stream produced no data within the allowed window.
    StreamTimeout,
    /// A received event failed structural validation.
    InvalidEvent,
    /// A received payload could not be parsed.
    ParsingError,
    /// Credentials were rejected while opening or continuing the stream.
    AuthenticationError,
    /// The service is throttling requests.
    RateLimitExceeded,
    /// Chunks arrived out of order or with gaps.
    ChunkSequenceError,
    /// The connection dropped mid-stream.
    NetworkError,
    /// The service reported an internal failure.
    ServerError,
    /// Anything that does not match a more specific code.
    UnknownError,
}

impl ErrorCode {
    /// Every code, in declaration order. Handy for exhaustiveness checks in
    /// callers that build dispatch tables.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::ConnectionFailed,
        ErrorCode::StreamTimeout,
        ErrorCode::InvalidEvent,
        ErrorCode::ParsingError,
        ErrorCode::AuthenticationError,
        ErrorCode::RateLimitExceeded,
        ErrorCode::ChunkSequenceError,
        ErrorCode::NetworkError,
        ErrorCode::ServerError,
        ErrorCode::UnknownError,
    ];

    /// The handling family this code belongs to.
    ///
    /// Total mapping: every code has exactly one category, enforced by the
    /// exhaustive match. Adding a code forces a decision here.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorCode::ConnectionFailed => ErrorCategory::Network,
            ErrorCode::NetworkError => ErrorCategory::Network,
            ErrorCode::AuthenticationError => ErrorCategory::Authentication,
            ErrorCode::ParsingError => ErrorCategory::Parsing,
            ErrorCode::InvalidEvent => ErrorCategory::Parsing,
            ErrorCode::StreamTimeout => ErrorCategory::Timeout,
            ErrorCode::RateLimitExceeded => ErrorCategory::RateLimit,
            ErrorCode::ServerError => ErrorCategory::Server,
            ErrorCode::ChunkSequenceError => ErrorCategory::Client,
            ErrorCode::UnknownError => ErrorCategory::Unknown,
        }
    }

    /// Whether automated retry is sanctioned for this code.
    ///
    /// Explicit allow-list rather than a category-derived rule: server and
    /// unknown errors stay non-recoverable even though they look transient,
    /// because the product prefers a batch fallback over re-streaming them.
    pub fn is_recoverable(self) -> bool {
        match self {
            ErrorCode::ConnectionFailed
            | ErrorCode::StreamTimeout
            | ErrorCode::NetworkError
            | ErrorCode::RateLimitExceeded => true,
            ErrorCode::InvalidEvent
            | ErrorCode::ParsingError
            | ErrorCode::AuthenticationError
            | ErrorCode::ChunkSequenceError
            | ErrorCode::ServerError
            | ErrorCode::UnknownError => false,
        }
    }

    /// Wire name of the code (`"CONNECTION_FAILED"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ConnectionFailed => "CONNECTION_FAILED",
            ErrorCode::StreamTimeout => "STREAM_TIMEOUT",
            ErrorCode::InvalidEvent => "INVALID_EVENT",
            ErrorCode::ParsingError => "PARSING_ERROR",
            ErrorCode::AuthenticationError => "AUTHENTICATION_ERROR",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::ChunkSequenceError => "CHUNK_SEQUENCE_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-level grouping of error codes for routing and display decisions.
///
/// Derived from [`ErrorCode`] via [`ErrorCode::category`]; never assigned
/// independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    /// Connection establishment and connectivity failures.
    Network,
    /// Credential and session failures.
    Authentication,
    /// Malformed or unparseable event payloads.
    Parsing,
    /// Silence past the allowed window.
    Timeout,
    /// Service-side throttling.
    RateLimit,
    /// Service-side internal failures.
    Server,
    /// Failures attributable to this client (e.g. sequence tracking).
    Client,
    /// Unclassifiable failures.
    Unknown,
}

impl ErrorCategory {
    /// Wire name of the category (`"NETWORK"`, `"RATE_LIMIT"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NETWORK",
            ErrorCategory::Authentication => "AUTHENTICATION",
            ErrorCategory::Parsing => "PARSING",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::RateLimit => "RATE_LIMIT",
            ErrorCategory::Server => "SERVER",
            ErrorCategory::Client => "CLIENT",
            ErrorCategory::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// StreamingError value object
// ============================================================================

/// A classified streaming failure.
///
/// Constructed once per failure occurrence and treated as immutable
/// afterwards. `category` and `recoverable` are snapshots of the pure
/// [`ErrorCode`] mappings taken at construction; two errors with the same
/// code always agree on both, regardless of message or payload.
///
/// `context` carries diagnostic payload (raw event data, workflow stage);
/// `metadata` carries operational counters (attempt counts, last-attempt
/// timestamps). Both stay absent, not empty, when nothing is attached.
///
/// # Creating Errors
///
/// ```rust
/// use medstream::{ErrorCode, StreamingError};
///
/// let err = StreamingError::new(ErrorCode::RateLimitExceeded, "Rate limit exceeded");
/// assert!(err.recoverable);
/// assert!(err.context.is_none());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct StreamingError {
    /// Precise failure condition.
    pub code: ErrorCode,
    /// Handling family, derived from `code`.
    pub category: ErrorCategory,
    /// Human-readable description, preserved verbatim from the reporter.
    pub message: String,
    /// Milliseconds since the Unix epoch at construction time.
    pub timestamp: i64,
    /// Whether automated retry is sanctioned, derived from `code`.
    pub recoverable: bool,
    /// Diagnostic payload attached by the reporter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
    /// Operational counters attached by the reporter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl StreamingError {
    /// Classify a failure. Cannot fail for any valid code.
    ///
    /// Derives `category` and `recoverable` from the code tables, stamps the
    /// current wall-clock time, and logs the occurrence with structured
    /// fields (warn for recoverable codes, error otherwise).
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let category = code.category();
        let recoverable = code.is_recoverable();

        if recoverable {
            log_warn!(
                code = %code,
                category = %category,
                message = %message,
                "Recoverable streaming error"
            );
        } else {
            log_error!(
                code = %code,
                category = %category,
                message = %message,
                "Non-recoverable streaming error"
            );
        }

        Self {
            code,
            category,
            message,
            timestamp: chrono::Utc::now().timestamp_millis(),
            recoverable,
            context: None,
            metadata: None,
        }
    }

    /// Attach a full diagnostic context map, replacing any existing one.
    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach a full operational metadata map, replacing any existing one.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a single diagnostic context entry.
    ///
    /// Values that fail to serialize are silently skipped; diagnostics never
    /// take down the error path itself.
    pub fn with_context_value(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.get_or_insert_with(Map::new).insert(key.into(), v);
        }
        self
    }

    /// Add a single operational metadata entry.
    pub fn with_metadata_value(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.metadata.get_or_insert_with(Map::new).insert(key.into(), v);
        }
        self
    }

    /// Whether automated retry is sanctioned for this error, as classified
    /// at construction.
    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }
}
