use std::fmt;

/// Advisory scheduling priority attached to a task at spawn time.
///
/// The scheduler prefers higher priorities when several tasks are ready,
/// but it never lets a lower priority starve: a task that has waited too
/// long is dispatched ahead of fresher, higher-priority work (see
/// [`RuntimeBuilder::starvation_limit`](crate::RuntimeBuilder::starvation_limit)).
/// Priority affects latency only, never correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Priority {
    /// Latency-sensitive work.
    High,
    /// The default priority.
    #[default]
    Normal,
    /// Work that can wait behind normal tasks.
    Low,
    /// Housekeeping such as timers and status checks.
    Background,
}

impl Priority {
    /// Number of distinct priorities, one run-queue lane each.
    pub(crate) const LEVELS: usize = 4;

    /// All priorities, from most to least urgent.
    pub const ALL: [Priority; Self::LEVELS] = [
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Background,
    ];

    /// Lane index of this priority; `0` is dispatched first.
    pub(crate) const fn lane(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
            Priority::Background => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Normal => write!(f, "normal"),
            Priority::Low => write!(f, "low"),
            Priority::Background => write!(f, "background"),
        }
    }
}
