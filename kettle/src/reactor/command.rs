use super::timer::TimerSlot;

use std::time::Instant;

/// Messages accepted by the timer reactor.
pub(crate) enum Command {
    /// Wake the waker held in `slot` once `deadline` is reached.
    SetTimer { deadline: Instant, slot: TimerSlot },

    /// Forget the timer registered with `slot`; its sleep was dropped first.
    CancelTimer { slot: TimerSlot },

    /// Stop the reactor thread. Pending timers are dropped without firing.
    Shutdown,
}
