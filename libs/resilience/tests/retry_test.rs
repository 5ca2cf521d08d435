use std::time::Duration;

use resilience::{
    Backoff, CancellationToken, ResilienceExecutor, RetryError, RetryPolicy,
};
use test_utils::{
    CallCounter, EventRecorder, TestResult, TransientError, fail_first,
};
use tokio::time::Instant;
use tracing::Level;

fn executor(backoff: Backoff, base_delay: Duration) -> ResilienceExecutor {
    ResilienceExecutor::new(
        RetryPolicy::builder()
            .base_delay(base_delay)
            .backoff(backoff)
            .build(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_transient_failures() -> TestResult {
    let recorder = EventRecorder::new();
    let _guard = recorder.install();
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let value = ResilienceExecutor::default()
        .execute(&cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, 2) }
        })
        .await?;

    assert_eq!(value, 3);
    assert_eq!(counter.count(), 3);

    // Linear backoff with a 1s base: 1s after the first failure, 2s after
    // the second.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3100), "elapsed {elapsed:?}");

    let warnings: Vec<_> = recorder
        .events_for("resilience")
        .into_iter()
        .filter(|event| event.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(
        warnings[0].message,
        "Operation failed, attempt 1/3. Retrying..."
    );
    assert_eq!(warnings[1].field("delay_ms"), Some("2000"));
    assert_eq!(
        warnings[1].field("error"),
        Some("transient failure on call 2")
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_attempt_numbers_are_one_based() -> TestResult {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();

    let result = ResilienceExecutor::default()
        .execute(&cancel, |attempt| {
            let counter = counter.clone();
            async move {
                let call = counter.hit();
                assert_eq!(attempt, call);
                Err::<(), _>(TransientError { call })
            }
        })
        .await;

    assert_eq!(result.unwrap_err().attempts(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_wraps_only_the_last_error() {
    let recorder = EventRecorder::new();
    let _guard = recorder.install();
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();

    let err = ResilienceExecutor::default()
        .execute(&cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, u32::MAX) }
        })
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.last_error(), Some(&TransientError { call: 3 }));
    assert_eq!(
        err.to_string(),
        "Operation failed after 3 attempts: transient failure on call 3"
    );
    assert_eq!(counter.count(), 3);

    let errors: Vec<_> = recorder
        .events_for("resilience")
        .into_iter()
        .filter(|event| event.level == Level::ERROR)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("attempts"), Some("3"));
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_does_not_retry() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let err = ResilienceExecutor::default()
        .execute_with_retry(1, &cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, 1) }
        })
        .await
        .unwrap_err();

    assert_eq!(err.into_last_error(), Some(TransientError { call: 1 }));
    assert_eq!(counter.count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_is_a_configuration_error() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();

    let err = ResilienceExecutor::default()
        .execute_with_retry(0, &cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, 0) }
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RetryError::InvalidConfiguration { max_attempts: 0 }
    ));
    assert_eq!(err.attempts(), 0);
    assert_eq!(counter.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exponential_backoff_doubles_between_attempts() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let err = executor(Backoff::Exponential, Duration::from_millis(100))
        .execute_with_retry(4, &cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, u32::MAX) }
        })
        .await
        .unwrap_err();

    assert_eq!(err.attempts(), 4);

    // 200ms + 400ms + 800ms
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1400), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(1500), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_token_skips_every_attempt() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = ResilienceExecutor::default()
        .execute(&cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, 0) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RetryError::Cancelled { attempts: 0 }));
    assert_eq!(counter.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_between_attempts_stops_retrying() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();

    let err = ResilienceExecutor::default()
        .execute_with_retry(5, &cancel, |_| {
            let counter = counter.clone();
            let cancel = cancel.clone();
            async move {
                let call = counter.hit();
                if call == 2 {
                    cancel.cancel();
                }
                Err::<(), _>(TransientError { call })
            }
        })
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.attempts(), 2);
    assert_eq!(counter.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_interrupts_sleep() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        canceller.cancel();
    });

    let err = executor(Backoff::Fixed, Duration::from_secs(10))
        .execute(&cancel, |_| {
            let counter = counter.clone();
            async move { fail_first(&counter, u32::MAX) }
        })
        .await
        .unwrap_err();

    assert!(matches!(err, RetryError::Cancelled { attempts: 1 }));
    assert_eq!(counter.count(), 1);
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_final_failure_wins_over_late_cancellation() {
    let counter = CallCounter::new();
    let cancel = CancellationToken::new();

    let err = ResilienceExecutor::default()
        .execute_with_retry(1, &cancel, |_| {
            let counter = counter.clone();
            let cancel = cancel.clone();
            async move {
                cancel.cancel();
                fail_first(&counter, 1)
            }
        })
        .await
        .unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 1);
}
