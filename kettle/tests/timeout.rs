mod common;

use common::{Never, init_test_logging};
use kettle::time::{instrumented, sleep, timeout};
use kettle::{Elapsed, Priority, TaskError, task};
use std::time::{Duration, Instant};

#[kettle::test]
async fn sleep_waits_at_least_the_duration() {
    let start = Instant::now();
    sleep(Duration::from_millis(20)).await;
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[kettle::test]
async fn timeout_expires_on_slow_future() {
    let out = timeout(Duration::from_millis(10), sleep(Duration::from_secs(1))).await;
    assert_eq!(out, Err(Elapsed(Duration::from_millis(10))));
}

#[kettle::test]
async fn timeout_passes_fast_future_through() {
    let out = timeout(Duration::from_millis(200), async { 42 }).await;
    assert_eq!(out, Ok(42));
}

#[kettle::test]
async fn join_timeout_cancels_the_loser() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |token| async move {
        token.cancelled().await;
        Err::<(), Never>(TaskError::Cancelled)
    });

    let out = handle.join_timeout(Duration::from_millis(10)).await;

    assert!(matches!(out, Err(Elapsed(_))));
    assert!(handle.is_cancelled());
    assert_eq!(handle.await, Err(TaskError::Cancelled));
}

#[kettle::test]
async fn join_timeout_returns_the_winner() {
    let handle = task::spawn(Priority::High, |_| async {
        sleep(Duration::from_millis(5)).await;
        Ok::<_, Never>(3)
    });

    assert_eq!(handle.join_timeout(Duration::from_secs(2)).await, Ok(Ok(3)));
    assert!(!handle.is_cancelled());
}

#[kettle::test]
async fn instrumented_measures_the_wrapped_future() {
    let (value, took) = instrumented(async {
        sleep(Duration::from_millis(15)).await;
        "noodles"
    })
    .await;

    assert_eq!(value, "noodles");
    assert!(took >= Duration::from_millis(15));
}
