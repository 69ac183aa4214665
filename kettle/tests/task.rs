mod common;

use common::{Never, init_test_logging};
use kettle::time::sleep;
use kettle::{Priority, RuntimeBuilder, TaskError, TaskState, task, yield_now};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Burnt;

#[kettle::test]
async fn awaiting_twice_returns_the_same_result() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |_| async {
        sleep(Duration::from_millis(5)).await;
        Ok::<_, Never>(String::from("broth"))
    });
    let other = handle.clone();

    let first = handle.join().await;
    let second = handle.join().await;
    let third = other.await;

    assert_eq!(first, Ok(String::from("broth")));
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(handle.state(), TaskState::Completed);
    assert!(handle.is_finished());
}

#[kettle::test]
async fn domain_failure_is_surfaced_to_the_awaiter() {
    init_test_logging();

    let handle = task::spawn(Priority::High, |_| async {
        Err::<(), _>(TaskError::Failed(Burnt))
    });

    assert_eq!(handle.clone().await, Err(TaskError::Failed(Burnt)));
    assert_eq!(handle.state(), TaskState::Failed);
    assert_eq!(handle.try_result(), Some(Err(TaskError::Failed(Burnt))));
}

#[kettle::test]
async fn checked_cancellation_ends_cancelled() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |token| async move {
        for _ in 0..1_000 {
            token.checkpoint()?;
            sleep(Duration::from_millis(2)).await;
        }
        Ok::<_, Never>(())
    });

    sleep(Duration::from_millis(10)).await;
    handle.cancel();

    assert!(handle.is_cancelled());
    assert_eq!(handle.clone().await, Err(TaskError::Cancelled));
    assert_eq!(handle.state(), TaskState::Cancelled);
}

#[kettle::test]
async fn ignored_cancellation_runs_to_completion() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |_| async {
        sleep(Duration::from_millis(20)).await;
        Ok::<_, Never>(7)
    });

    handle.cancel();
    handle.cancel();

    assert!(handle.is_cancelled());
    assert_eq!(handle.clone().await, Ok(7));
    assert_eq!(handle.state(), TaskState::Completed);
}

#[kettle::test]
async fn panicking_body_is_reported_as_panicked() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |_| async {
        if Duration::ZERO.is_zero() {
            panic!("pot boiled over");
        }
        Ok::<(), Never>(())
    });

    match handle.clone().await {
        Err(TaskError::Panicked(message)) => assert!(message.contains("pot boiled over")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(handle.state(), TaskState::Failed);

    // The worker that caught the panic keeps serving tasks.
    let next = task::spawn(Priority::Normal, |_| async { Ok::<_, Never>(1) });
    assert_eq!(next.await, Ok(1));
}

#[kettle::test(worker_threads = 1)]
async fn state_moves_from_created_to_running_to_completed() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |token| async move {
        token.cancelled().await;
        Ok::<_, Never>("done")
    });

    // The only worker is busy running this test body.
    assert_eq!(handle.state(), TaskState::Created);

    for _ in 0..1_000 {
        if handle.state() != TaskState::Created {
            break;
        }
        yield_now().await;
    }
    assert_eq!(handle.state(), TaskState::Running);

    handle.cancel();
    assert_eq!(handle.clone().await, Ok("done"));
    assert_eq!(handle.state(), TaskState::Completed);
}

#[kettle::test]
async fn cancelling_a_parent_reaches_its_children() {
    init_test_logging();

    let parent = task::spawn(Priority::Normal, |token| async move {
        let child = task::spawn(Priority::Low, |child_token| async move {
            child_token.cancelled().await;
            Err::<(), Never>(TaskError::Cancelled)
        });

        token.cancelled().await;
        child.await
    });

    parent.cancel();
    assert_eq!(parent.await, Err(TaskError::Cancelled));
}

#[kettle::test]
async fn free_functions_see_the_current_task() {
    init_test_logging();

    let handle = task::spawn(Priority::Normal, |token| async move {
        token.cancelled().await;
        Ok::<_, Never>((task::is_cancelled(), task::current_token().is_some()))
    });

    handle.cancel();
    assert_eq!(handle.await, Ok((true, true)));
}

#[kettle::test]
async fn ids_are_unique_and_priority_is_kept() {
    let a = task::spawn(Priority::High, |_| async { Ok::<_, Never>(()) });
    let b = task::spawn(Priority::Background, |_| async { Ok::<_, Never>(()) });

    assert_ne!(a.id(), b.id());
    assert_eq!(a.priority(), Priority::High);
    assert_eq!(b.priority(), Priority::Background);
    assert_eq!(a.id().to_string(), format!("task#{}", a.id().as_u64()));

    let _ = kettle::join!(a.join(), b.join());
}

#[test]
fn free_functions_outside_a_task() {
    assert!(task::current_token().is_none());
    assert!(!task::is_cancelled());
}

#[test]
fn runtime_spawn_from_outside() {
    init_test_logging();

    let runtime = RuntimeBuilder::new().worker_threads(2).build();
    let handle = runtime.spawn(Priority::Background, |_| async { Ok::<_, Never>(5) });

    assert_eq!(runtime.block_on(handle.clone()), Ok(5));
    assert_eq!(handle.try_result(), Some(Ok(5)));
    assert_eq!(handle.priority(), Priority::Background);
}

#[test]
#[should_panic(expected = "inside block_on")]
fn block_on_reraises_panics() {
    let runtime = RuntimeBuilder::new().worker_threads(1).build();
    let fail = true;
    runtime.block_on(async move {
        if fail {
            panic!("inside block_on");
        }
    });
}
