//! Timer reactor.
//!
//! The reactor is a dedicated thread that owns every pending timer and
//! wakes the corresponding task once its deadline is reached. Tasks talk to
//! it exclusively through [`Command`](command::Command) messages sent over a
//! channel, so it never touches executor state directly.
//!
//! Most runtime users do not interact with the reactor directly; it backs
//! [`crate::time::sleep`] and everything built on top of it.

mod core;
mod timer;

pub(crate) mod command;

pub(crate) use self::core::{Reactor, ReactorHandle};
pub(crate) use timer::TimerSlot;
