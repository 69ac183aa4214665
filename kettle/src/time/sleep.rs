use crate::reactor::command::Command;
use crate::reactor::{ReactorHandle, TimerSlot};
use crate::runtime::context;

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The returned sleep future registers a timer with the current
/// runtime's timer reactor on first poll.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(Instant::now() + duration)
}

/// A future that completes once a specific deadline is reached.
///
/// Dropping it before completion unregisters the timer and releases the
/// waker, so an abandoned sleep neither wakes nor keeps alive its task.
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Set once the timer has been handed to the reactor.
    registration: Option<Registration>,
}

struct Registration {
    reactor: ReactorHandle,
    slot: TimerSlot,
}

impl Sleep {
    pub(crate) fn new(deadline: Instant) -> Self {
        Self {
            deadline,
            registration: None,
        }
    }

    /// The instant at which this sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    /// The timer is registered on the first poll; later polls only refresh
    /// the stored waker if the task's waker changed.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        match &this.registration {
            Some(registration) => {
                let mut waker = registration.slot.lock();
                if !waker.as_ref().is_some_and(|w| w.will_wake(cx.waker())) {
                    *waker = Some(cx.waker().clone());
                }
            }
            None => {
                let runtime = context::current().expect("sleep polled outside of a runtime");
                let slot: TimerSlot = Arc::new(Mutex::new(Some(cx.waker().clone())));

                let _ = runtime.reactor.send(Command::SetTimer {
                    deadline: this.deadline,
                    slot: slot.clone(),
                });

                this.registration = Some(Registration {
                    reactor: runtime.reactor,
                    slot,
                });
            }
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        let Some(registration) = self.registration.take() else {
            return;
        };

        // An empty slot means the timer already fired and left the heap.
        let armed = registration.slot.lock().take();
        if armed.is_some() {
            let _ = registration.reactor.send(Command::CancelTimer {
                slot: registration.slot,
            });
        }
    }
}
