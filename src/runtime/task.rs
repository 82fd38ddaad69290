//! Deferred task records and handles

use std::fmt;

use super::clock::Millis;

/// Work deferred by the scheduler, run against the scheduler's context type
///
/// Returning an error marks the task as failed; the scheduler logs it and
/// keeps draining the remaining due tasks.
pub type TaskAction<C> = Box<dyn FnOnce(&mut C) -> anyhow::Result<()>>;

/// Identifies one scheduled task instance
///
/// Handles order by deadline first and scheduling sequence second, which is
/// also the order in which due tasks run. A handle never owns its task: once
/// the task has fired or been cancelled the handle is stale and cancelling it
/// again reports `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle {
    deadline: Millis,
    sequence: u64,
}

impl TaskHandle {
    pub(crate) fn new(deadline: Millis, sequence: u64) -> Self {
        Self { deadline, sequence }
    }

    /// Absolute time at which the task becomes eligible to run
    pub fn deadline(&self) -> Millis {
        self.deadline
    }

    /// Scheduling order, strictly increasing per scheduler
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}ms", self.sequence, self.deadline)
    }
}

/// A pending task owned by the scheduler
pub(crate) struct Task<C> {
    pub(crate) label: &'static str,
    pub(crate) action: TaskAction<C>,
}

impl<C> fmt::Debug for Task<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish()
    }
}
