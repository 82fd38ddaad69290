//! Deferred task scheduler health check

use std::rc::Rc;

use crate::health::check::{CheckResult, SystemCheck};
use crate::runtime::{ManualClock, Scheduled, Scheduler};

struct TaskBench {
    scheduler: Scheduler<TaskBench>,
    fired: Vec<&'static str>,
}

impl Scheduled for TaskBench {
    fn scheduler(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

/// Checks ordering, cancellation and reentrant scheduling on a manual clock
pub struct SchedulerCheck;

impl SchedulerCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SchedulerCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for SchedulerCheck {
    fn name(&self) -> &'static str {
        "Scheduler"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates task ordering, cancellation and failure isolation")
    }

    fn check(&self) -> CheckResult {
        let mut details = Vec::new();
        let clock = ManualClock::new();
        let mut bench = TaskBench {
            scheduler: Scheduler::new(Rc::new(clock.clone())),
            fired: Vec::new(),
        };

        bench.scheduler.schedule(10, |p: &mut TaskBench| {
            p.fired.push("second");
            Ok(())
        });
        bench.scheduler.schedule(5, |p: &mut TaskBench| {
            p.fired.push("first");
            Ok(())
        });
        bench.scheduler.schedule(10, |p: &mut TaskBench| {
            p.fired.push("third");
            p.scheduler.schedule(0, |p: &mut TaskBench| {
                p.fired.push("rescheduled");
                Ok(())
            });
            Ok(())
        });
        bench
            .scheduler
            .schedule(10, |_: &mut TaskBench| Err(anyhow::anyhow!("deliberate failure")));
        let doomed = bench.scheduler.schedule(10, |p: &mut TaskBench| {
            p.fired.push("cancelled");
            Ok(())
        });

        let first_cancel = bench.scheduler.cancel(doomed);
        let second_cancel = bench.scheduler.cancel(doomed);
        if !first_cancel || second_cancel {
            details.push("  ✗ Cancel should succeed exactly once".to_string());
            return CheckResult::fail("Cancellation broken").with_details(details.join("\n"));
        }
        details.push("  ✓ Cancel succeeds once, then reports stale".to_string());

        clock.advance(10);
        let report = Scheduler::pump(&mut bench);
        if bench.fired != ["first", "second", "third"] {
            details.push(format!("  ✗ Fired out of order: {:?}", bench.fired));
            return CheckResult::fail("Task ordering broken").with_details(details.join("\n"));
        }
        details.push("  ✓ Deadline then insertion order".to_string());

        if report.failed != 1 || report.executed != 4 {
            details.push(format!("  ✗ Unexpected pump report: {report:?}"));
            return CheckResult::fail("Failure isolation broken").with_details(details.join("\n"));
        }
        details.push("  ✓ Failing task isolated".to_string());

        let second = Scheduler::pump(&mut bench);
        if bench.fired.last() != Some(&"rescheduled") || !bench.scheduler.is_empty() {
            details.push("  ✗ Task scheduled from a task did not run on the next pump".to_string());
            return CheckResult::fail("Reentrant scheduling broken")
                .with_details(details.join("\n"));
        }
        details.push("  ✓ Reentrant schedule runs on the next pump".to_string());

        CheckResult::pass("Scheduler operational")
            .with_details(details.join("\n"))
            .with_metric("tasks_run", report.executed + second.executed)
            .with_metric("tasks_failed", report.failed + second.failed)
            .with_metric("tasks_cancelled", u32::from(first_cancel))
    }
}
