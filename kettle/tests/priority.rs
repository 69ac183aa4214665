mod common;

use common::{Never, init_test_logging};
use kettle::{Priority, RuntimeBuilder, TaskHandle, task};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A high-priority task that re-spawns itself `remaining` more times.
fn flood(counter: Arc<AtomicUsize>, remaining: usize) -> TaskHandle<(), Infallible> {
    task::spawn(Priority::High, move |_| async move {
        counter.fetch_add(1, Ordering::SeqCst);
        if remaining > 0 {
            flood(counter, remaining - 1);
        }
        Ok::<_, Never>(())
    })
}

#[test]
fn ready_tasks_run_by_priority() {
    init_test_logging();

    let runtime = RuntimeBuilder::new().worker_threads(1).build();

    let order = runtime.block_on(async {
        let order = Arc::new(Mutex::new(Vec::new()));

        let spawn = |priority: Priority| {
            let order = order.clone();
            task::spawn(priority, move |_| async move {
                order.lock().unwrap().push(priority);
                Ok::<_, Never>(())
            })
        };

        // Queued while this task keeps the only worker busy.
        let handles = [
            spawn(Priority::Background),
            spawn(Priority::Low),
            spawn(Priority::Normal),
            spawn(Priority::High),
        ];

        for handle in handles {
            handle.await.unwrap();
        }

        let order = order.lock().unwrap().clone();
        order
    });

    assert_eq!(order, Priority::ALL.to_vec());
}

#[test]
fn background_task_is_not_starved_by_a_high_priority_stream() {
    init_test_logging();

    let runtime = RuntimeBuilder::new()
        .worker_threads(1)
        .starvation_limit(4)
        .build();

    let counter = Arc::new(AtomicUsize::new(0));
    let total = 3 * 301;

    let seen = runtime.block_on({
        let counter = counter.clone();
        async move {
            for _ in 0..3 {
                flood(counter.clone(), 300);
            }

            let background = task::spawn(Priority::Background, move |_| async move {
                Ok::<_, Never>(counter.load(Ordering::SeqCst))
            });

            background.await
        }
    });

    let seen = seen.expect("background task completes");
    assert!(
        seen < 50,
        "background task waited behind {seen} high-priority dispatches"
    );
    assert!(seen < total);
}

#[test]
fn stealing_workers_drain_every_priority() {
    init_test_logging();

    let runtime = RuntimeBuilder::new().worker_threads(4).build();

    let done = runtime.block_on(async {
        let done = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..200)
            .map(|i| {
                let done = done.clone();
                task::spawn(Priority::ALL[i % 4], move |_| async move {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Never>(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        done.load(Ordering::SeqCst)
    });

    assert_eq!(done, 200);
}
