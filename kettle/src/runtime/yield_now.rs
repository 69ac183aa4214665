use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Yields execution back to the scheduler once.
///
/// The task is re-queued behind the work that is already ready, which
/// gives other tasks (and overdue lower-priority ones) a chance to run.
/// Long-running loops should call it, together with a cancellation
/// checkpoint, between units of work.
///
/// # Examples
///
/// ```rust,ignore
/// for chunk in chunks {
///     token.checkpoint()?;
///     process(chunk);
///     yield_now().await;
/// }
/// ```
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
