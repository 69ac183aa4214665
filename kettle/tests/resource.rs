mod common;

use common::{Never, init_test_logging};
use kettle::sync::Mutex;
use kettle::time::sleep;
use kettle::{
    ExclusiveResource, Priority, ResourceExhausted, Runtime, RuntimeBuilder, TaskError, TaskState,
    task, yield_now,
};
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| RuntimeBuilder::new().worker_threads(4).build())
}

/// Takes two cups, then runs three short steps.
async fn cook(water: Arc<ExclusiveResource<u64>>) -> Result<(), TaskError<ResourceExhausted>> {
    water.consume(2).await.map_err(TaskError::Failed)?;
    for _ in 0..3 {
        sleep(Duration::from_millis(2)).await;
    }
    Ok(())
}

#[kettle::test]
async fn two_pots_share_the_water() {
    init_test_logging();

    let water = Arc::new(ExclusiveResource::new(10u64));

    let first = task::spawn(Priority::Normal, {
        let water = water.clone();
        move |_| cook(water)
    });
    let second = task::spawn(Priority::Normal, {
        let water = water.clone();
        move |_| cook(water)
    });

    let (a, b) = kettle::join!(first.join(), second.join());
    assert_eq!(a, Ok(()));
    assert_eq!(b, Ok(()));
    assert_eq!(first.state(), TaskState::Completed);
    assert_eq!(second.state(), TaskState::Completed);
    assert_eq!(water.read().await, 6);
}

#[kettle::test]
async fn oversized_request_leaves_the_value_untouched() {
    let water = ExclusiveResource::new(10u64);

    assert_eq!(
        water.consume(100).await,
        Err(ResourceExhausted {
            requested: 100,
            available: 10,
        })
    );
    assert_eq!(water.read().await, 10);
    assert_eq!(water.consume(10).await, Ok(0));
    assert_eq!(water.into_inner(), 0);
}

#[kettle::test]
async fn failed_mutation_surfaces_the_closure_error() {
    let stock = ExclusiveResource::new(vec!["nori"]);

    let out = stock
        .mutate(|items| {
            if items.contains(&"egg") {
                Ok(items.clone())
            } else {
                Err("no egg")
            }
        })
        .await;

    assert_eq!(out, Err("no egg"));
    assert_eq!(stock.read().await, vec!["nori"]);

    stock
        .mutate(|items| {
            let mut next = items.clone();
            next.push("egg");
            Ok::<_, ()>(next)
        })
        .await
        .expect("mutation succeeds");
    assert_eq!(stock.read().await, vec!["nori", "egg"]);
}

#[kettle::test]
async fn concurrent_mutations_never_lose_an_update() {
    init_test_logging();

    let counter = Arc::new(ExclusiveResource::new(0u64));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let counter = counter.clone();
            task::spawn(Priority::ALL[i % Priority::ALL.len()], move |_| async move {
                counter
                    .mutate(|value| Ok::<_, ()>(value + 1))
                    .await
                    .map_err(TaskError::Failed)?;
                yield_now().await;
                Ok::<_, TaskError<()>>(())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await, Ok(()));
    }

    assert_eq!(counter.read().await, 50);
}

#[kettle::test(worker_threads = 1)]
async fn waiters_are_served_in_arrival_order() {
    init_test_logging();

    let log = Arc::new(Mutex::new(Vec::new()));
    let guard = log.lock().await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let log = log.clone();
        // Priorities must not reorder the lock queue.
        let priority = Priority::ALL[(Priority::ALL.len() - 1) - i % Priority::ALL.len()];
        let handle = task::spawn(priority, move |_| async move {
            log.lock().await.push(i);
            Ok::<_, Never>(())
        });

        // With a single worker, a polled task is already queued on the lock.
        while handle.state() == TaskState::Created {
            yield_now().await;
        }
        handles.push(handle);
    }

    drop(guard);

    for handle in handles {
        assert_eq!(handle.await, Ok(()));
    }

    assert_eq!(*log.lock().await, vec![0, 1, 2, 3, 4, 5]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn consume_never_goes_negative(capacity in 0u64..50, requests in prop::collection::vec(0u64..15, 0..20)) {
        let outcomes = runtime().block_on({
            let requests = requests.clone();
            async move {
                let water = ExclusiveResource::new(capacity);
                let mut outcomes = Vec::with_capacity(requests.len());
                for amount in requests {
                    outcomes.push((water.consume(amount).await, water.read().await));
                }
                outcomes
            }
        });

        let mut model = capacity;
        for (amount, (outcome, after)) in requests.into_iter().zip(outcomes) {
            if amount <= model {
                model -= amount;
                prop_assert_eq!(outcome, Ok(model));
            } else {
                prop_assert_eq!(outcome, Err(ResourceExhausted { requested: amount, available: model }));
            }
            prop_assert_eq!(after, model);
            prop_assert!(after <= capacity);
        }
    }

    #[test]
    fn concurrent_increments_all_land(start in 0u64..1_000, increments in 1usize..40) {
        let total = runtime().block_on(async move {
            let value = Arc::new(ExclusiveResource::new(start));

            let handles: Vec<_> = (0..increments)
                .map(|_| {
                    let value = value.clone();
                    task::spawn(Priority::Normal, move |_| async move {
                        value.mutate(|v| Ok::<_, ()>(v + 1)).await.map_err(TaskError::Failed)
                    })
                })
                .collect();

            for handle in handles {
                let _ = handle.await;
            }

            value.read().await
        });

        prop_assert_eq!(total, start + increments as u64);
    }
}
