use crate::runtime::task::{Priority, Runnable};

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// A queued task together with the dispatch count at which it was queued.
struct Entry {
    task: Arc<dyn Runnable>,
    stamp: u64,
}

/// A priority run queue with bounded waiting.
///
/// One FIFO lane per [`Priority`]. `pop` serves the highest non-empty lane,
/// except when a lane head has already waited `starvation_limit` dispatches
/// or more: the oldest such overdue head is served first. Lanes are FIFO
/// and stamps only grow, so every queued task is dispatched after a bounded
/// number of pops no matter how much higher-priority work keeps arriving.
pub(crate) struct RunQueue {
    lanes: [VecDeque<Entry>; Priority::LEVELS],
    dispatched: u64,
    starvation_limit: u64,
}

impl RunQueue {
    pub(crate) fn new(starvation_limit: u64) -> Self {
        Self {
            lanes: Default::default(),
            dispatched: 0,
            starvation_limit,
        }
    }

    pub(crate) fn push(&mut self, task: Arc<dyn Runnable>) {
        let lane = task.priority().lane();
        self.lanes[lane].push_back(Entry {
            task,
            stamp: self.dispatched,
        });
    }

    pub(crate) fn pop(&mut self) -> Option<Arc<dyn Runnable>> {
        let lane = self.overdue_lane().or_else(|| self.lanes.iter().position(|l| !l.is_empty()))?;

        self.dispatched += 1;
        self.lanes[lane].pop_front().map(|entry| entry.task)
    }

    /// Lane whose head has waited the longest, among heads that waited at
    /// least `starvation_limit` dispatches.
    fn overdue_lane(&self) -> Option<usize> {
        self.lanes
            .iter()
            .enumerate()
            .filter_map(|(lane, entries)| entries.front().map(|e| (lane, e.stamp)))
            .filter(|(_, stamp)| self.dispatched - stamp >= self.starvation_limit)
            .min_by_key(|(_, stamp)| *stamp)
            .map(|(lane, _)| lane)
    }

    pub(crate) fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    /// Removes every queued task and hands them back to the caller.
    ///
    /// Used at shutdown to break reference cycles between tasks and the
    /// queues that hold them. The tasks must be dropped after the queue
    /// lock is released: dropping a task may wake another one.
    pub(crate) fn drain(&mut self) -> Vec<Arc<dyn Runnable>> {
        self.lanes
            .iter_mut()
            .flat_map(|lane| lane.drain(..).map(|entry| entry.task))
            .collect()
    }
}

/// A per-worker local task queue.
///
/// The owning worker pops from it first; idle workers steal from it. Both
/// go through the same priority rule, so stealing never bypasses a more
/// urgent or an overdue task.
pub(crate) struct LocalQueue {
    inner: Mutex<RunQueue>,
}

impl LocalQueue {
    pub(crate) fn new(starvation_limit: u64) -> Self {
        Self {
            inner: Mutex::new(RunQueue::new(starvation_limit)),
        }
    }

    pub(crate) fn push(&self, task: Arc<dyn Runnable>) {
        self.inner.lock().push(task);
    }

    pub(crate) fn pop(&self) -> Option<Arc<dyn Runnable>> {
        self.inner.lock().pop()
    }

    /// Takes a task on behalf of another worker.
    pub(crate) fn steal(&self) -> Option<Arc<dyn Runnable>> {
        let mut inner = self.inner.lock();

        // Leave the last task to its owner; it is about to run it anyway.
        if inner.len() < 2 {
            return None;
        }

        inner.pop()
    }

    pub(crate) fn clear(&self) {
        let stale = self.inner.lock().drain();
        drop(stale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::task::TaskId;
    use std::collections::HashMap;

    struct Probe {
        id: TaskId,
        priority: Priority,
    }

    impl Runnable for Probe {
        fn run(self: Arc<Self>) {}

        fn id(&self) -> TaskId {
            self.id
        }

        fn priority(&self) -> Priority {
            self.priority
        }
    }

    /// Hands out probe tasks and remembers their names.
    #[derive(Default)]
    struct Names(HashMap<TaskId, &'static str>);

    impl Names {
        fn task(&mut self, name: &'static str, priority: Priority) -> Arc<dyn Runnable> {
            let id = TaskId::next();
            self.0.insert(id, name);
            Arc::new(Probe { id, priority })
        }

        fn of(&self, task: Option<Arc<dyn Runnable>>) -> Option<&'static str> {
            task.map(|t| self.0[&t.id()])
        }

        fn drain(&self, queue: &mut RunQueue) -> Vec<&'static str> {
            std::iter::from_fn(|| self.of(queue.pop())).collect()
        }
    }

    #[test]
    fn higher_priority_first_fifo_within_lane() {
        let mut names = Names::default();
        let mut queue = RunQueue::new(100);
        queue.push(names.task("low", Priority::Low));
        queue.push(names.task("normal-1", Priority::Normal));
        queue.push(names.task("high", Priority::High));
        queue.push(names.task("normal-2", Priority::Normal));
        queue.push(names.task("bg", Priority::Background));

        assert_eq!(queue.len(), 5);
        assert_eq!(
            names.drain(&mut queue),
            vec!["high", "normal-1", "normal-2", "low", "bg"]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn overdue_task_is_served_despite_fresh_high_priority_work() {
        let mut names = Names::default();
        let mut queue = RunQueue::new(3);
        queue.push(names.task("bg", Priority::Background));

        let mut served = Vec::new();
        for _ in 0..10 {
            queue.push(names.task("high", Priority::High));
            served.extend(names.of(queue.pop()));
        }

        let position = served.iter().position(|name| *name == "bg");
        assert_eq!(position, Some(3), "served order: {served:?}");
    }

    #[test]
    fn oldest_overdue_head_wins() {
        let mut names = Names::default();
        let mut queue = RunQueue::new(1);
        queue.push(names.task("low", Priority::Low));
        queue.push(names.task("bg", Priority::Background));
        queue.push(names.task("high-1", Priority::High));

        // Nothing has waited yet, so priority decides.
        assert_eq!(names.of(queue.pop()), Some("high-1"));

        // Both remaining heads are overdue; `low` was queued first.
        queue.push(names.task("high-2", Priority::High));
        assert_eq!(names.drain(&mut queue), vec!["low", "bg", "high-2"]);
    }

    #[test]
    fn steal_leaves_last_task_to_owner() {
        let mut names = Names::default();
        let local = LocalQueue::new(16);
        local.push(names.task("a", Priority::Normal));
        assert!(local.steal().is_none());

        local.push(names.task("b", Priority::High));
        assert_eq!(names.of(local.steal()), Some("b"));
        assert_eq!(names.of(local.pop()), Some("a"));
    }
}
