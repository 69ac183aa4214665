use crate::error::Elapsed;
use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Requires `future` to complete within `duration`.
///
/// Resolves to `Ok(output)` if the future wins the race, or
/// `Err(Elapsed)` once the deadline passes first. The losing future is
/// dropped with the `Timeout`; to stop a spawned task as well, use
/// [`TaskHandle::join_timeout`](crate::task::TaskHandle::join_timeout).
///
/// # Examples
///
/// ```rust,ignore
/// let out = timeout(Duration::from_millis(50), sleep(Duration::from_secs(1))).await;
/// assert!(out.is_err());
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout {
        future,
        sleep: sleep(duration),
        duration,
    }
}

/// Future returned by [`timeout`].
pub struct Timeout<F> {
    future: F,
    sleep: Sleep,
    duration: Duration,
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output, Elapsed>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is never moved out of the pinned `Timeout`.
        let this = unsafe { self.get_unchecked_mut() };

        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(output) = future.poll(cx) {
            return Poll::Ready(Ok(output));
        }

        match Pin::new(&mut this.sleep).poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(Elapsed(this.duration))),
            Poll::Pending => Poll::Pending,
        }
    }
}
