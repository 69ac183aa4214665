//! Synchronization primitives for tasks.
//!
//! - [`Mutex`]: an asynchronous mutex with strict FIFO hand-off.
//! - [`ExclusiveResource`]: a value whose reads and updates are serialized
//!   in arrival order, with all-or-nothing updates.
//!
//! Neither primitive blocks a worker thread: a task that has to wait is
//! suspended and woken when its turn comes.

mod mutex;
mod resource;

pub use mutex::{LockFuture, Mutex, MutexGuard};
pub use resource::ExclusiveResource;
