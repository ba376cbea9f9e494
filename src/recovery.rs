//! Recovery strategy selection for streaming errors.
//!
//! The advisor converts a classified [`StreamingError`] into exactly one
//! [`RecoveryStrategy`]: a recommended action plus the retry budget and
//! timing parameters that go with it. It recommends only — the retry loop,
//! timers, and cancellation belong to the transport layer that owns the
//! connection.
//!
//! Dispatch is keyed on the error *code*, not the category: `STREAM_TIMEOUT`
//! gets a plain bounded retry while `RATE_LIMIT_EXCEEDED` gets a fixed
//! server-respecting delay, even though both are transient at the category
//! level. Every non-recoverable code maps to [`RecoveryAction::FallbackToBatch`],
//! which tells the caller to abandon the stream and re-issue the request on
//! the synchronous batch path.
//!
//! # Example
//!
//! ```rust
//! use medstream::{ErrorCode, RecoveryAction, StreamingError};
//!
//! let err = StreamingError::new(ErrorCode::ConnectionFailed, "Connection failed");
//! let strategy = err.recovery_strategy();
//!
//! assert_eq!(strategy.action, RecoveryAction::RetryWithBackoff);
//! assert!(strategy.backoff_ms.unwrap() > 0);
//! ```
//!
//! # Acting on a strategy
//!
//! A caller-owned retry loop typically looks like:
//!
//! ```rust,no_run
//! use medstream::StreamingError;
//!
//! async fn resume_stream(err: StreamingError) {
//!     let strategy = err.recovery_strategy();
//!     if !strategy.action.is_retrying() {
//!         // Switch to the batch request path instead.
//!         return;
//!     }
//!     for attempt in 1..=strategy.max_attempts.unwrap_or(1) {
//!         if let Some(delay) = strategy.delay_for_attempt(attempt) {
//!             tokio::time::sleep(delay).await;
//!         }
//!         // Re-issue the streaming request here.
//!     }
//! }
//! ```

use crate::error::{ErrorCode, StreamingError};
use crate::logging::log_debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Ceiling for scaled backoff delays, matching the retry ladder the rest of
/// the product uses (1s, 2s, 4s, 8s, 16s max).
const MAX_SCALED_BACKOFF_MS: u64 = 16_000;

// ============================================================================
// Recovery actions and strategies
// ============================================================================

/// What the caller should do about a streaming error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryAction {
    /// Retry immediately, up to the attempt budget.
    Retry,
    /// Retry with an escalating delay seeded from `backoff_ms`.
    RetryWithBackoff,
    /// Retry after the fixed `delay_ms` wait.
    RetryAfterDelay,
    /// Abandon the stream and re-issue the request on the batch path.
    FallbackToBatch,
    /// Surface the failure and wait for the user to act.
    ///
    /// Never produced by the advisor today; reserved for callers that
    /// escalate after exhausting a retry budget.
    UserIntervention,
    /// Give up on the request entirely.
    ///
    /// Never produced by the advisor today; reserved for caller escalation.
    Abort,
}

impl RecoveryAction {
    /// Whether this action asks the caller to attempt the stream again.
    pub fn is_retrying(self) -> bool {
        matches!(
            self,
            RecoveryAction::Retry
                | RecoveryAction::RetryWithBackoff
                | RecoveryAction::RetryAfterDelay
        )
    }

    /// Wire name of the action (`"RETRY_WITH_BACKOFF"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            RecoveryAction::Retry => "RETRY",
            RecoveryAction::RetryWithBackoff => "RETRY_WITH_BACKOFF",
            RecoveryAction::RetryAfterDelay => "RETRY_AFTER_DELAY",
            RecoveryAction::FallbackToBatch => "FALLBACK_TO_BATCH",
            RecoveryAction::UserIntervention => "USER_INTERVENTION",
            RecoveryAction::Abort => "ABORT",
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete recovery recommendation.
///
/// Field presence follows the action: retrying actions carry `max_attempts`,
/// `backoff_ms` only accompanies [`RecoveryAction::RetryWithBackoff`], and
/// `delay_ms` only accompanies [`RecoveryAction::RetryAfterDelay`]. All three
/// are positive whenever present. [`RecoveryAction::FallbackToBatch`]
/// carries none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryStrategy {
    /// Recommended action.
    pub action: RecoveryAction,
    /// Retry budget, for retrying actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// Base delay to scale between backoff retries, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backoff_ms: Option<u64>,
    /// Fixed wait before the next attempt, in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl RecoveryStrategy {
    /// Wait to observe before retry number `attempt` (1-based).
    ///
    /// - [`RecoveryAction::Retry`]: no wait.
    /// - [`RecoveryAction::RetryWithBackoff`]: `backoff_ms` doubled per
    ///   attempt, capped at 16s, with up to 10% jitter so parallel clients
    ///   don't retry in lockstep.
    /// - [`RecoveryAction::RetryAfterDelay`]: the fixed `delay_ms`, as-is —
    ///   the service asked for that exact wait.
    /// - Non-retrying actions (and strategies missing their timing field):
    ///   `None`.
    ///
    /// Computes only; never sleeps. The attempt budget is the caller's to
    /// enforce against `max_attempts`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        match self.action {
            RecoveryAction::Retry => Some(Duration::ZERO),
            RecoveryAction::RetryWithBackoff => {
                let base_ms = self.backoff_ms? as f64;
                let exponent = attempt.saturating_sub(1).min(31) as i32;
                let scaled_ms = (base_ms * 2f64.powi(exponent)).min(MAX_SCALED_BACKOFF_MS as f64);

                // Up to 10% jitter to prevent thundering herd
                let jitter = fastrand::f64() * 0.1;
                Some(Duration::from_secs_f64(scaled_ms * (1.0 + jitter) / 1000.0))
            }
            RecoveryAction::RetryAfterDelay => self.delay_ms.map(Duration::from_millis),
            RecoveryAction::FallbackToBatch
            | RecoveryAction::UserIntervention
            | RecoveryAction::Abort => None,
        }
    }
}

// ============================================================================
// Policy constants and dispatch
// ============================================================================

/// Numeric policy for strategy construction.
///
/// The defaults are the product's standard tuning; the classifier contract
/// only requires that every value stays positive. Callers with their own
/// tuning pass a custom policy to [`RecoveryPolicy::strategy_for`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPolicy {
    /// Attempt budget for plain retries (stream timeouts).
    pub retry_max_attempts: u32,
    /// Attempt budget for backoff retries (connection/network failures).
    pub backoff_max_attempts: u32,
    /// Base backoff delay in milliseconds.
    pub backoff_ms: u64,
    /// Attempt budget for delayed retries (rate limiting).
    pub delay_max_attempts: u32,
    /// Fixed rate-limit wait in milliseconds.
    pub delay_ms: u64,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            backoff_max_attempts: 5,
            backoff_ms: 1000,
            delay_max_attempts: 3,
            delay_ms: 5000,
        }
    }
}

impl RecoveryPolicy {
    /// Select the recovery strategy for an error under this policy.
    ///
    /// Total over [`ErrorCode`] and deterministic: equal errors under the
    /// same policy always produce structurally equal strategies.
    pub fn strategy_for(&self, error: &StreamingError) -> RecoveryStrategy {
        let strategy = match error.code {
            ErrorCode::StreamTimeout => RecoveryStrategy {
                action: RecoveryAction::Retry,
                max_attempts: Some(self.retry_max_attempts),
                backoff_ms: None,
                delay_ms: None,
            },
            ErrorCode::ConnectionFailed | ErrorCode::NetworkError => RecoveryStrategy {
                action: RecoveryAction::RetryWithBackoff,
                max_attempts: Some(self.backoff_max_attempts),
                backoff_ms: Some(self.backoff_ms),
                delay_ms: None,
            },
            ErrorCode::RateLimitExceeded => RecoveryStrategy {
                action: RecoveryAction::RetryAfterDelay,
                max_attempts: Some(self.delay_max_attempts),
                backoff_ms: None,
                delay_ms: Some(self.delay_ms),
            },
            ErrorCode::InvalidEvent
            | ErrorCode::ParsingError
            | ErrorCode::AuthenticationError
            | ErrorCode::ChunkSequenceError
            | ErrorCode::ServerError
            | ErrorCode::UnknownError => RecoveryStrategy {
                action: RecoveryAction::FallbackToBatch,
                max_attempts: None,
                backoff_ms: None,
                delay_ms: None,
            },
        };

        log_debug!(
            code = %error.code,
            action = %strategy.action,
            "Selected recovery strategy"
        );

        strategy
    }
}

impl StreamingError {
    /// Recovery strategy for this error under the default policy.
    ///
    /// Shorthand for `RecoveryPolicy::default().strategy_for(self)`.
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        RecoveryPolicy::default().strategy_for(self)
    }
}
