//! Attempt-counting tests for the retry executor

use artforge::retry::{run_with_retry, AttemptFailure, RetryError, RetryPolicy};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
#[error("simulated failure #{0}")]
struct Simulated(u32);

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(5), 2.0)
}

#[tokio::test(start_paused = true)]
async fn test_fails_n_minus_one_times_then_succeeds() {
    // With max_attempts >= N, exactly N attempts are made and the result is Ok
    let n = 4;
    let calls = AtomicU32::new(0);

    let result = run_with_retry(&policy(6), || async {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call < n {
            Err(AttemptFailure::Transient(Simulated(call)))
        } else {
            Ok("done")
        }
    })
    .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), n);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_makes_exactly_m_attempts() {
    let m = 3;
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = run_with_retry(&policy(m), || async {
        let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
        Err(AttemptFailure::Transient(Simulated(call)))
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), m);
    match result {
        Err(RetryError::Exhausted { attempts, last }) => {
            assert_eq!(attempts, m);
            // The final error wraps the last underlying cause
            assert_eq!(last.to_string(), format!("simulated failure #{m}"));
        }
        other => panic!("expected exhausted retries, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_backoff_schedule_is_exponential() {
    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);

    let _: Result<(), _> = run_with_retry(
        &RetryPolicy::new(4, Duration::from_secs(1), 2.0),
        || async {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(AttemptFailure::Transient(Simulated(call)))
        },
    )
    .await;

    // Waits of 1s + 2s + 4s between the four attempts
    assert_eq!(start.elapsed(), Duration::from_secs(7));
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_hint_overrides_schedule() {
    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);

    let result = run_with_retry(
        &RetryPolicy::new(3, Duration::from_secs(60), 2.0),
        || async {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == 1 {
                Err(AttemptFailure::RateLimited {
                    retry_after: Some(Duration::from_secs(3)),
                    source: Simulated(call),
                })
            } else {
                Ok(call)
            }
        },
    )
    .await;

    assert_eq!(result.unwrap(), 2);
    // The 60s exponential schedule was replaced by the 3s hint
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_independent_attempt_budgets() {
    // Two wrapped calls each get their own counter
    let policy = policy(2);

    let first = AtomicU32::new(0);
    let _: Result<(), _> = run_with_retry(&policy, || async {
        first.fetch_add(1, Ordering::SeqCst);
        Err(AttemptFailure::Transient(Simulated(1)))
    })
    .await;

    let second = AtomicU32::new(0);
    let _: Result<(), _> = run_with_retry(&policy, || async {
        second.fetch_add(1, Ordering::SeqCst);
        Err(AttemptFailure::Transient(Simulated(2)))
    })
    .await;

    assert_eq!(first.load(Ordering::SeqCst), 2);
    assert_eq!(second.load(Ordering::SeqCst), 2);
}
