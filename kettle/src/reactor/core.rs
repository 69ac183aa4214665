use super::command::Command;
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::thread;
use std::time::Instant;

/// Sending half used by the runtime to talk to the reactor thread.
pub(crate) type ReactorHandle = Sender<Command>;

/// The timer reactor.
///
/// Owns a min-heap of pending timers and blocks on its command channel
/// until either a new command arrives or the earliest deadline passes.
pub(crate) struct Reactor {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
    seq: u64,
}

impl Reactor {
    fn new(receiver: Receiver<Command>) -> Self {
        Self {
            receiver,
            timers: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Spawns the reactor thread and returns a handle to it.
    ///
    /// The thread exits on [`Command::Shutdown`] or once every handle has
    /// been dropped.
    pub(crate) fn start() -> io::Result<ReactorHandle> {
        let (transmitter, receiver) = channel();

        thread::Builder::new()
            .name("kettle-timer".into())
            .spawn(move || Reactor::new(receiver).run())?;

        Ok(transmitter)
    }

    fn run(&mut self) {
        tracing::trace!("timer reactor started");

        loop {
            let next = match self.timers.peek() {
                Some(timer) => {
                    let timeout = timer.deadline.saturating_duration_since(Instant::now());
                    self.receiver.recv_timeout(timeout)
                }
                None => self
                    .receiver
                    .recv()
                    .map_err(|_| RecvTimeoutError::Disconnected),
            };

            match next {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            self.fire_expired();
        }

        tracing::trace!(pending = self.timers.len(), "timer reactor stopped");
    }

    /// Applies one command. Returns `false` on shutdown.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::SetTimer { deadline, slot } => {
                self.seq += 1;
                self.timers.push(TimerEntry {
                    deadline,
                    seq: self.seq,
                    slot,
                });
            }
            Command::CancelTimer { slot } => {
                self.timers.retain(|timer| !Arc::ptr_eq(&timer.slot, &slot));
            }
            Command::Shutdown => return false,
        }

        true
    }

    /// Wakes every timer whose deadline has passed. Timers whose sleep is
    /// gone have an empty slot and are discarded silently.
    fn fire_expired(&mut self) {
        let now = Instant::now();

        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }

            let Some(timer) = self.timers.pop() else {
                break;
            };

            let waker = timer.slot.lock().take();
            if let Some(waker) = waker {
                waker.wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactor::TimerSlot;
    use parking_lot::Mutex;
    use std::task::Waker;
    use std::time::Duration;

    fn slot() -> TimerSlot {
        Arc::new(Mutex::new(Some(Waker::noop().clone())))
    }

    #[test]
    fn cancelled_timer_leaves_the_heap() {
        let (_transmitter, receiver) = channel();
        let mut reactor = Reactor::new(receiver);
        let deadline = Instant::now() + Duration::from_secs(3600);

        let kept = slot();
        let dropped = slot();
        assert!(reactor.handle(Command::SetTimer { deadline, slot: kept.clone() }));
        assert!(reactor.handle(Command::SetTimer { deadline, slot: dropped.clone() }));
        assert_eq!(reactor.timers.len(), 2);

        assert!(reactor.handle(Command::CancelTimer { slot: dropped }));
        assert_eq!(reactor.timers.len(), 1);
        assert!(Arc::ptr_eq(&reactor.timers.peek().map(|t| t.slot.clone()).unwrap(), &kept));

        assert!(!reactor.handle(Command::Shutdown));
    }

    #[test]
    fn expired_timer_empties_its_slot() {
        let (_transmitter, receiver) = channel();
        let mut reactor = Reactor::new(receiver);

        let fired = slot();
        reactor.handle(Command::SetTimer {
            deadline: Instant::now(),
            slot: fired.clone(),
        });
        reactor.fire_expired();

        assert!(reactor.timers.is_empty());
        assert!(fired.lock().is_none());
    }
}
