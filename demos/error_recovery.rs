//! Error classification and recovery advice walkthrough.
//!
//! This example shows how to:
//! - Classify streaming failures with stable error codes
//! - Read the category and recoverability a code implies
//! - Turn an error into a concrete recovery strategy
//! - Drive a retry loop from the advised wait schedule
//! - Put a classified error on the SSE wire
//!
//! # Running
//!
//! ```bash
//! cargo run --example error_recovery
//! ```
//!
//! # Recovery Map
//!
//! | Code | Action | Parameters |
//! |------|--------|------------|
//! | STREAM_TIMEOUT | RETRY | maxAttempts |
//! | CONNECTION_FAILED, NETWORK_ERROR | RETRY_WITH_BACKOFF | maxAttempts, backoffMs |
//! | RATE_LIMIT_EXCEEDED | RETRY_AFTER_DELAY | maxAttempts, delayMs |
//! | all non-recoverable codes | FALLBACK_TO_BATCH | none |
//!
//! # Key Methods
//!
//! - `StreamingError::new(code, message)` - Classify a failure
//! - `error.is_recoverable()` - Check if retry is sanctioned
//! - `error.recovery_strategy()` - Get the advised plan
//! - `strategy.delay_for_attempt(n)` - Compute the wait before attempt n

use medstream::{
    ErrorCode, RecoveryPolicy, SseEvent, StreamingError, TargetPanel,
};

/// Print detailed information about a classified error
fn print_error_info(error: &StreamingError) {
    println!("{}:", error.code);
    println!("  Display: {}", error);
    println!("  Category: {}", error.category);
    println!("  Recoverable: {}", error.is_recoverable());
    println!();
}

/// Demonstrates classifying different streaming failures
fn demonstrate_classification() {
    println!("=== Error Classification ===\n");

    // Recoverable network-side failures
    let connection = StreamingError::new(ErrorCode::ConnectionFailed, "connection refused");
    print_error_info(&connection);

    let timeout = StreamingError::new(ErrorCode::StreamTimeout, "no data for 30 seconds");
    print_error_info(&timeout);

    let rate_limit = StreamingError::new(ErrorCode::RateLimitExceeded, "429 from upstream");
    print_error_info(&rate_limit);

    // Terminal failures that route to the batch path
    let auth = StreamingError::new(ErrorCode::AuthenticationError, "token expired");
    print_error_info(&auth);

    let server = StreamingError::new(ErrorCode::ServerError, "HTTP 500 mid-stream");
    print_error_info(&server);
}

/// Demonstrates the full code-to-strategy map
fn demonstrate_recovery_advice() {
    println!("=== Recovery Advice per Code ===\n");

    for code in ErrorCode::ALL {
        let error = StreamingError::new(code, "demo failure");
        let strategy = error.recovery_strategy();

        print!("{:22} -> {}", code.to_string(), strategy.action);
        if let Some(attempts) = strategy.max_attempts {
            print!(" (attempts: {attempts}");
            if let Some(backoff) = strategy.backoff_ms {
                print!(", backoff: {backoff}ms");
            }
            if let Some(delay) = strategy.delay_ms {
                print!(", delay: {delay}ms");
            }
            print!(")");
        }
        println!();
    }
    println!();
}

/// Demonstrates the advised wait schedule for a backoff strategy
fn demonstrate_wait_schedule() {
    println!("=== Backoff Wait Schedule ===\n");

    let error = StreamingError::new(ErrorCode::ConnectionFailed, "connection refused");
    let strategy = error.recovery_strategy();

    println!("Advice: {} with up to {:?} attempts\n", strategy.action, strategy.max_attempts);
    for attempt in 1..=strategy.max_attempts.unwrap_or(1) {
        if let Some(wait) = strategy.delay_for_attempt(attempt) {
            println!("  attempt {attempt}: wait {:.2}s", wait.as_secs_f64());
        }
    }
    println!("\nDelays double per attempt, cap at 16s, and carry up to 10% jitter.\n");
}

/// Demonstrates a retry loop driven entirely by the advice
async fn demonstrate_advised_retry_loop() {
    println!("=== Advised Retry Loop ===\n");

    // A snappy policy for the demo; production uses RecoveryPolicy::default()
    let policy = RecoveryPolicy {
        backoff_ms: 50,
        ..RecoveryPolicy::default()
    };

    let error = StreamingError::new(ErrorCode::NetworkError, "connection reset");
    let strategy = policy.strategy_for(&error);
    println!("Failure: {error}");
    println!("Advice: {}\n", strategy.action);

    // Simulated reconnect that succeeds on the third attempt
    let mut attempts_made = 0;
    let budget = strategy.max_attempts.unwrap_or(1);
    for attempt in 1..=budget {
        if let Some(wait) = strategy.delay_for_attempt(attempt) {
            println!("  attempt {attempt}: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        attempts_made += 1;
        if attempts_made >= 3 {
            println!("  attempt {attempt}: reconnected\n");
            return;
        }
        println!("  attempt {attempt}: still failing");
    }
    println!("  budget exhausted, escalating to the batch path\n");
}

/// Demonstrates putting a classified error on the SSE wire
fn demonstrate_error_event() -> anyhow::Result<()> {
    println!("=== Error Event on the Wire ===\n");

    let error = StreamingError::new(ErrorCode::RateLimitExceeded, "throttled by provider")
        .with_metadata_value("attempt", 2);
    let event = SseEvent::stream_error(&error, Some("stage-differential"), TargetPanel::Reasoning);

    let frame = event.encode()?;
    println!("{frame}");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Section 1: Codes, categories, recoverability
    demonstrate_classification();

    // Section 2: The complete code-to-strategy map
    demonstrate_recovery_advice();

    // Section 3: Backoff schedule with jitter and cap
    demonstrate_wait_schedule();

    // Section 4: Acting on advice
    demonstrate_advised_retry_loop();

    // Section 5: The wire shape the client sees
    demonstrate_error_event()?;

    println!("=== Recovery Patterns Summary ===\n");
    println!("1. Classify once with StreamingError::new; the code decides everything");
    println!("2. Check error.is_recoverable() before entering any retry loop");
    println!("3. Let recovery_strategy() pick the action and budget");
    println!("4. Compute waits with delay_for_attempt; the advisor never sleeps");
    println!("5. Route every non-recoverable failure to the batch request path");

    Ok(())
}
