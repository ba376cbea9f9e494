// Unit Tests for Recovery Strategy Selection
//
// UNIT UNDER TEST: RecoveryPolicy, RecoveryStrategy, RecoveryAction
//
// BUSINESS RESPONSIBILITY:
//   - Converts classified streaming errors into one actionable recovery
//     recommendation
//   - Keys dispatch on the error code so timeouts, connection drops, and
//     rate limits each get the right retry shape
//   - Routes every non-recoverable failure to the batch fallback path
//   - Computes backoff delays with jitter without ever sleeping itself
//
// TEST COVERAGE:
//   - Per-code strategy selection under the default policy
//   - Field presence matching the action shape for all ten codes
//   - Deterministic selection for equal errors
//   - Exponential backoff progression, jitter envelope, and the 16s cap
//   - Custom policy tuning flowing into strategies
//   - camelCase wire serialization with sparse optional fields

use crate::error::{ErrorCode, StreamingError};
use crate::recovery::{RecoveryAction, RecoveryPolicy, RecoveryStrategy};
use std::time::Duration;

/// Helper to build a classified error with a throwaway message.
fn error_with(code: ErrorCode) -> StreamingError {
    StreamingError::new(code, "test failure")
}

#[cfg(test)]
mod strategy_selection_tests {
    use super::*;

    #[test]
    fn test_stream_timeout_gets_plain_bounded_retry() {
        // Test verifies timeouts retry immediately without added delay
        // Ensures a silent stream is re-attempted before giving up

        // Arrange
        let error = error_with(ErrorCode::StreamTimeout);

        // Act
        let strategy = error.recovery_strategy();

        // Assert
        assert_eq!(strategy.action, RecoveryAction::Retry);
        assert_eq!(
            strategy.max_attempts,
            Some(3),
            "Timeout retries should use the plain retry budget"
        );
        assert_eq!(strategy.backoff_ms, None, "Plain retry carries no backoff");
        assert_eq!(strategy.delay_ms, None, "Plain retry carries no fixed delay");
    }

    #[test]
    fn test_connection_failures_get_exponential_backoff() {
        // Test verifies failed connections back off before re-dialing
        // Ensures a flapping network is not hammered at full speed

        // Arrange
        let error = error_with(ErrorCode::ConnectionFailed);

        // Act
        let strategy = error.recovery_strategy();

        // Assert
        assert_eq!(strategy.action, RecoveryAction::RetryWithBackoff);
        assert_eq!(strategy.max_attempts, Some(5));
        assert_eq!(
            strategy.backoff_ms,
            Some(1000),
            "Backoff should seed from the 1s base delay"
        );
        assert_eq!(strategy.delay_ms, None);
    }

    #[test]
    fn test_network_errors_share_the_backoff_strategy() {
        // Test verifies mid-stream drops recover the same way as failed dials
        // Ensures both network codes follow one reconnection posture

        // Arrange & Act
        let dropped = error_with(ErrorCode::NetworkError).recovery_strategy();
        let refused = error_with(ErrorCode::ConnectionFailed).recovery_strategy();

        // Assert
        assert_eq!(
            dropped, refused,
            "Both network codes should produce identical strategies"
        );
    }

    #[test]
    fn test_rate_limits_wait_out_the_throttle_window() {
        // Test verifies rate limiting produces a fixed, server-respecting wait
        // Ensures the client does not convert throttling into more pressure

        // Arrange
        let error = error_with(ErrorCode::RateLimitExceeded);

        // Act
        let strategy = error.recovery_strategy();

        // Assert
        assert_eq!(strategy.action, RecoveryAction::RetryAfterDelay);
        assert_eq!(strategy.max_attempts, Some(3));
        assert_eq!(
            strategy.delay_ms,
            Some(5000),
            "Rate limit waits should use the fixed 5s window"
        );
        assert_eq!(strategy.backoff_ms, None);
    }

    #[test]
    fn test_non_recoverable_codes_fall_back_to_batch() {
        // Test verifies every non-recoverable code abandons the stream
        // Ensures auth, parsing, sequence, server, and unknown failures all
        // re-issue on the synchronous path instead of retrying

        for code in ErrorCode::ALL.into_iter().filter(|c| !c.is_recoverable()) {
            // Act
            let strategy = error_with(code).recovery_strategy();

            // Assert
            assert_eq!(
                strategy.action,
                RecoveryAction::FallbackToBatch,
                "{code} should fall back to the batch path"
            );
            assert_eq!(
                strategy.max_attempts, None,
                "{code} fallback carries no retry budget"
            );
            assert_eq!(strategy.backoff_ms, None);
            assert_eq!(strategy.delay_ms, None);
        }
    }

    #[test]
    fn test_strategy_fields_match_the_action_shape() {
        // Test verifies the field presence contract across all codes
        // Ensures clients can rely on which optional fields accompany which action

        for code in ErrorCode::ALL {
            // Act
            let strategy = error_with(code).recovery_strategy();

            // Assert
            match strategy.action {
                RecoveryAction::Retry => {
                    assert!(strategy.max_attempts.is_some(), "{code}: budget expected");
                    assert!(strategy.backoff_ms.is_none(), "{code}: no backoff expected");
                    assert!(strategy.delay_ms.is_none(), "{code}: no delay expected");
                }
                RecoveryAction::RetryWithBackoff => {
                    assert!(strategy.max_attempts.is_some(), "{code}: budget expected");
                    assert!(strategy.backoff_ms.is_some(), "{code}: backoff expected");
                    assert!(strategy.delay_ms.is_none(), "{code}: no delay expected");
                }
                RecoveryAction::RetryAfterDelay => {
                    assert!(strategy.max_attempts.is_some(), "{code}: budget expected");
                    assert!(strategy.backoff_ms.is_none(), "{code}: no backoff expected");
                    assert!(strategy.delay_ms.is_some(), "{code}: delay expected");
                }
                RecoveryAction::FallbackToBatch => {
                    assert!(strategy.max_attempts.is_none(), "{code}: no budget expected");
                    assert!(strategy.backoff_ms.is_none(), "{code}: no backoff expected");
                    assert!(strategy.delay_ms.is_none(), "{code}: no delay expected");
                }
                RecoveryAction::UserIntervention | RecoveryAction::Abort => {
                    panic!("{code}: advisor should never select {:?}", strategy.action)
                }
            }

            // Retrying strategies expose positive parameters only
            for value in [strategy.backoff_ms, strategy.delay_ms] {
                if let Some(ms) = value {
                    assert!(ms > 0, "{code}: timing parameters must stay positive");
                }
            }
            if let Some(attempts) = strategy.max_attempts {
                assert!(attempts > 0, "{code}: attempt budget must stay positive");
            }
        }
    }

    #[test]
    fn test_equal_errors_select_equal_strategies() {
        // Test verifies strategy selection is deterministic
        // Ensures recovery advice does not flap between evaluations

        // Arrange
        let error = error_with(ErrorCode::ConnectionFailed);

        // Act
        let first = error.recovery_strategy();
        let second = error.recovery_strategy();

        // Assert
        assert_eq!(first, second, "Same error should always get the same advice");
    }

    #[test]
    fn test_custom_policy_tuning_flows_into_strategies() {
        // Test verifies callers can swap the numeric policy without touching dispatch
        // Ensures deployment-specific tuning stays a data change

        // Arrange
        let policy = RecoveryPolicy {
            retry_max_attempts: 1,
            backoff_max_attempts: 8,
            backoff_ms: 250,
            delay_max_attempts: 2,
            delay_ms: 60_000,
        };

        // Act
        let backoff = policy.strategy_for(&error_with(ErrorCode::NetworkError));
        let delayed = policy.strategy_for(&error_with(ErrorCode::RateLimitExceeded));

        // Assert
        assert_eq!(backoff.max_attempts, Some(8));
        assert_eq!(backoff.backoff_ms, Some(250));
        assert_eq!(delayed.max_attempts, Some(2));
        assert_eq!(delayed.delay_ms, Some(60_000));
    }

    #[test]
    fn test_retrying_action_predicate() {
        // Test verifies is_retrying partitions the action set correctly
        // Ensures callers branch between retry loops and fallback handling

        // Act & Assert
        assert!(RecoveryAction::Retry.is_retrying());
        assert!(RecoveryAction::RetryWithBackoff.is_retrying());
        assert!(RecoveryAction::RetryAfterDelay.is_retrying());
        assert!(!RecoveryAction::FallbackToBatch.is_retrying());
        assert!(!RecoveryAction::UserIntervention.is_retrying());
        assert!(!RecoveryAction::Abort.is_retrying());
    }
}

#[cfg(test)]
mod delay_computation_tests {
    use super::*;

    #[test]
    fn test_plain_retry_waits_nothing() {
        // Test verifies immediate retries compute a zero delay
        // Ensures timeout recovery does not add latency of its own

        // Arrange
        let strategy = error_with(ErrorCode::StreamTimeout).recovery_strategy();

        // Act & Assert
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::ZERO));
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::ZERO));
    }

    #[test]
    fn test_backoff_doubles_per_attempt_within_jitter_envelope() {
        // Test verifies retry delays follow exponential backoff with randomization
        // Ensures parallel clients don't create synchronized retry storms

        // Arrange
        let strategy = error_with(ErrorCode::ConnectionFailed).recovery_strategy();

        // Act
        let delay1 = strategy.delay_for_attempt(1).expect("backoff computes a delay");
        let delay2 = strategy.delay_for_attempt(2).expect("backoff computes a delay");
        let delay3 = strategy.delay_for_attempt(3).expect("backoff computes a delay");

        // Assert - each delay sits in [base, base * 1.1) for its attempt
        assert!(
            delay1.as_secs_f64() >= 1.0 && delay1.as_secs_f64() <= 1.1,
            "First backoff should be ~1s with jitter, got {delay1:?}"
        );
        assert!(
            delay2.as_secs_f64() >= 2.0 && delay2.as_secs_f64() <= 2.2,
            "Second backoff should be ~2s with jitter, got {delay2:?}"
        );
        assert!(
            delay3.as_secs_f64() >= 4.0 && delay3.as_secs_f64() <= 4.4,
            "Third backoff should be ~4s with jitter, got {delay3:?}"
        );
    }

    #[test]
    fn test_backoff_caps_at_sixteen_seconds() {
        // Test verifies deep retry attempts stop doubling at the ceiling
        // Ensures a long outage cannot produce multi-minute waits

        // Arrange
        let strategy = error_with(ErrorCode::NetworkError).recovery_strategy();

        // Act - attempt 10 would scale 1s to 512s uncapped
        let delay = strategy
            .delay_for_attempt(10)
            .expect("backoff computes a delay");

        // Assert
        assert!(
            delay.as_secs_f64() >= 16.0 && delay.as_secs_f64() <= 17.6,
            "Deep attempts should cap at 16s plus jitter, got {delay:?}"
        );
    }

    #[test]
    fn test_rate_limit_delay_is_fixed_and_unjittered() {
        // Test verifies the throttle wait is exactly the advertised window
        // Ensures the service-requested wait is honored as-is

        // Arrange
        let strategy = error_with(ErrorCode::RateLimitExceeded).recovery_strategy();

        // Act & Assert - no scaling across attempts
        assert_eq!(strategy.delay_for_attempt(1), Some(Duration::from_millis(5000)));
        assert_eq!(strategy.delay_for_attempt(3), Some(Duration::from_millis(5000)));
    }

    #[test]
    fn test_fallback_computes_no_delay() {
        // Test verifies non-retrying advice yields no wait at all
        // Ensures callers cannot accidentally sleep before a batch fallback

        // Arrange
        let strategy = error_with(ErrorCode::AuthenticationError).recovery_strategy();

        // Act & Assert
        assert_eq!(strategy.delay_for_attempt(1), None);
    }

    #[test]
    fn test_backoff_without_base_yields_no_delay() {
        // Test verifies a hand-built strategy missing its timing field is inert
        // Ensures malformed advice degrades to "no wait" instead of panicking

        // Arrange
        let strategy = RecoveryStrategy {
            action: RecoveryAction::RetryWithBackoff,
            max_attempts: Some(2),
            backoff_ms: None,
            delay_ms: None,
        };

        // Act & Assert
        assert_eq!(strategy.delay_for_attempt(1), None);
    }
}

#[cfg(test)]
mod strategy_wire_format_tests {
    use super::*;

    #[test]
    fn test_strategy_serializes_camel_case_with_sparse_fields() {
        // Test verifies the client-facing JSON shape of a backoff strategy
        // Ensures field names and omissions match what the frontend reads

        // Arrange
        let strategy = error_with(ErrorCode::ConnectionFailed).recovery_strategy();

        // Act
        let wire = serde_json::to_value(&strategy).expect("strategy should serialize");

        // Assert
        assert_eq!(wire["action"], "RETRY_WITH_BACKOFF");
        assert_eq!(wire["maxAttempts"], 5);
        assert_eq!(wire["backoffMs"], 1000);
        assert!(
            wire.get("delayMs").is_none(),
            "Unused timing fields should be omitted, not null"
        );
    }

    #[test]
    fn test_fallback_serializes_to_action_only() {
        // Test verifies batch fallback advice is a single-field object
        // Ensures the sparsest strategy stays sparse on the wire

        // Arrange
        let strategy = error_with(ErrorCode::ServerError).recovery_strategy();

        // Act
        let wire = serde_json::to_value(&strategy).expect("strategy should serialize");
        let object = wire.as_object().expect("strategy should be a JSON object");

        // Assert
        assert_eq!(object.len(), 1, "Fallback should carry only the action");
        assert_eq!(wire["action"], "FALLBACK_TO_BATCH");
    }

    #[test]
    fn test_strategy_round_trips_through_json() {
        // Test verifies strategies parse back from their own wire form
        // Ensures recovery advice can be echoed between client and server

        // Arrange
        let strategy = error_with(ErrorCode::RateLimitExceeded).recovery_strategy();

        // Act
        let wire = serde_json::to_string(&strategy).expect("strategy should serialize");
        let restored: RecoveryStrategy =
            serde_json::from_str(&wire).expect("strategy should deserialize");

        // Assert
        assert_eq!(restored, strategy);
    }
}
