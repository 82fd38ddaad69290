//! Time-ordered deferred task scheduler driven by idle polling
//!
//! The host never interrupts us, so time only "passes" when [`Scheduler::pump`]
//! is called from the idle entry point. Every pump runs all tasks whose
//! deadline has been reached at that moment, in deadline order, with
//! scheduling order breaking ties.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{error, trace, warn};

use super::clock::{Clock, Millis};
use super::panic_message;
use super::task::{Task, TaskHandle};

/// Context types that own a scheduler for themselves
///
/// Deferred actions receive the whole context mutably, which lets them touch
/// application state and schedule or cancel further tasks without aliasing.
pub trait Scheduled: Sized {
    /// The scheduler whose tasks run against this context
    fn scheduler(&mut self) -> &mut Scheduler<Self>;
}

/// Outcome of one [`Scheduler::pump`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Tasks taken off the queue and run
    pub executed: usize,
    /// Tasks that returned an error or panicked
    pub failed: usize,
}

impl PumpReport {
    /// Tasks that ran to completion without error
    pub fn succeeded(&self) -> usize {
        self.executed - self.failed
    }
}

/// Deferred task queue for a context type `C`
///
/// Not thread-safe, and not meant to be: the host calls us from exactly one
/// thread and the shared `Rc` clock keeps this type `!Send`.
pub struct Scheduler<C> {
    clock: Rc<dyn Clock>,
    tasks: BTreeMap<TaskHandle, Task<C>>,
    next_sequence: u64,
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler reading time from `clock`
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            tasks: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    /// Current time on the scheduler's clock
    pub fn now(&self) -> Millis {
        self.clock.now_ms()
    }

    /// The clock shared by this scheduler
    pub fn clock(&self) -> Rc<dyn Clock> {
        Rc::clone(&self.clock)
    }

    /// Schedules `action` to run `delay_ms` from now
    pub fn schedule<F>(&mut self, delay_ms: Millis, action: F) -> TaskHandle
    where
        F: FnOnce(&mut C) -> anyhow::Result<()> + 'static,
    {
        self.schedule_named("task", delay_ms, action)
    }

    /// Schedules `action` with a label used in diagnostics
    pub fn schedule_named<F>(&mut self, label: &'static str, delay_ms: Millis, action: F) -> TaskHandle
    where
        F: FnOnce(&mut C) -> anyhow::Result<()> + 'static,
    {
        let deadline = self.now().saturating_add(delay_ms);
        let handle = TaskHandle::new(deadline, self.next_sequence);
        self.next_sequence += 1;

        trace!(task = label, %handle, "scheduled");
        self.tasks.insert(
            handle,
            Task {
                label,
                action: Box::new(action),
            },
        );
        handle
    }

    /// Removes a pending task
    ///
    /// Returns `true` only if the task was still pending. Stale handles (already
    /// fired or already cancelled) return `false`, so at most one call per
    /// handle ever succeeds.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.tasks.remove(&handle) {
            Some(task) => {
                trace!(task = task.label, %handle, "cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether `handle` still refers to a pending task
    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.contains_key(&handle)
    }

    /// Number of pending tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Deadline of the earliest pending task
    pub fn next_deadline(&self) -> Option<Millis> {
        self.tasks.keys().next().map(TaskHandle::deadline)
    }

    /// Drops every pending task, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let dropped = self.tasks.len();
        self.tasks.clear();
        dropped
    }

    /// Takes the earliest task if it is due and was scheduled before the pump began
    fn pop_due(&mut self, now: Millis, horizon: u64) -> Option<(TaskHandle, Task<C>)> {
        let (handle, _) = self.tasks.first_key_value()?;
        if handle.deadline() > now || handle.sequence() >= horizon {
            return None;
        }
        self.tasks.pop_first()
    }
}

impl<C: Scheduled> Scheduler<C> {
    /// Runs every task that is due, in order
    ///
    /// "Due" means the deadline is at or before the time read at the start of
    /// this call. Each task is removed before its action runs, so an action
    /// that reschedules itself gets a fresh handle. Tasks scheduled while
    /// pumping wait for the next pump even when they are already due, which
    /// keeps a zero-delay self-rescheduling task from spinning forever.
    ///
    /// Errors and panics are logged per task and never stop the drain.
    pub fn pump(ctx: &mut C) -> PumpReport {
        let (now, horizon) = {
            let scheduler = ctx.scheduler();
            (scheduler.now(), scheduler.next_sequence)
        };

        let mut report = PumpReport::default();
        while let Some((handle, task)) = ctx.scheduler().pop_due(now, horizon) {
            report.executed += 1;
            let Task { label, action } = task;
            trace!(task = label, %handle, now, "running");

            match panic::catch_unwind(AssertUnwindSafe(|| action(ctx))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    report.failed += 1;
                    warn!(task = label, %handle, error = %format!("{err:#}"), "deferred task failed");
                }
                Err(payload) => {
                    report.failed += 1;
                    error!(
                        task = label,
                        %handle,
                        panic = %panic_message(payload.as_ref()),
                        "deferred task panicked"
                    );
                }
            }
        }
        report
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("pending", &self.tasks.len())
            .field("next_sequence", &self.next_sequence)
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}
