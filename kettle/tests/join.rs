use kettle::time::sleep;
use kettle::{RuntimeBuilder, join};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[test]
fn join_single_future() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async { join!(async { 42 }) });

    assert_eq!(result, 42);
}

#[test]
fn join_different_types_with_trailing_comma() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        join!(async { 100i32 }, async { String::from("miso") }, async { vec![1, 2, 3] },)
    });

    assert_eq!(result, (100, String::from("miso"), vec![1, 2, 3]));
}

#[kettle::test]
async fn join_runs_branches_concurrently() {
    let counter = Arc::new(AtomicUsize::new(0));
    let (c1, c2, c3) = (counter.clone(), counter.clone(), counter.clone());

    let start = Instant::now();
    join!(
        async move {
            sleep(Duration::from_millis(50)).await;
            c1.fetch_add(1, Ordering::SeqCst);
        },
        async move {
            sleep(Duration::from_millis(50)).await;
            c2.fetch_add(10, Ordering::SeqCst);
        },
        async move {
            sleep(Duration::from_millis(50)).await;
            c3.fetch_add(100, Ordering::SeqCst);
        }
    );

    assert_eq!(counter.load(Ordering::SeqCst), 111);
    assert!(start.elapsed() < Duration::from_millis(140));
}

#[kettle::test]
async fn join_keeps_argument_order() {
    let (slow, fast) = join!(
        async {
            sleep(Duration::from_millis(20)).await;
            "slow"
        },
        async { "fast" }
    );

    assert_eq!((slow, fast), ("slow", "fast"));
}
