//! Core runtime components.
//!
//! This module contains the building blocks of the runtime:
//! - the executor and its worker threads,
//! - the priority run queues and work stealing,
//! - the thread-local runtime context,
//! - task primitives and cooperative yielding,
//! - runtime diagnostics.
//!
//! Most users interact with [`RuntimeBuilder`](builder::RuntimeBuilder),
//! [`Runtime`] and the [`task`] module rather than with the internals.

mod core;
mod executor;
mod work_stealing;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod diagnostics;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::Runtime;
