//! Runs the self-checks in order and keeps what each one saw

use std::time::Instant;

use tracing::{debug, info, warn};

use super::check::{CheckResult, CheckStatus, SystemCheck};

/// One check as it ran
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub name: &'static str,
    pub description: Option<&'static str>,
    pub result: CheckResult,
}

/// Everything a health run produced, in registration order
#[derive(Debug, Clone, Default)]
pub struct HealthCheckReport {
    pub outcomes: Vec<CheckOutcome>,
}

impl HealthCheckReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Checks that ended with `status`
    pub fn count(&self, status: CheckStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.status == status)
            .count()
    }

    /// No check failed; warnings are allowed
    pub fn is_healthy(&self) -> bool {
        self.count(CheckStatus::Fail) == 0
    }

    pub fn has_warnings(&self) -> bool {
        self.count(CheckStatus::Warn) > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.status.is_fail())
    }

    /// Sum of a counter over every check that recorded it
    pub fn metric_total(&self, name: &str) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.metric(name))
            .fold(0, u64::saturating_add)
    }

    /// Process exit code: 1 on any failure, 2 on warnings only, else 0
    pub fn exit_code(&self) -> u8 {
        if !self.is_healthy() {
            1
        } else if self.has_warnings() {
            2
        } else {
            0
        }
    }
}

/// Ordered list of checks to run
#[derive(Default)]
pub struct HealthCheckRunner {
    checks: Vec<Box<dyn SystemCheck>>,
}

impl HealthCheckRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_check<C: SystemCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs every check, timing each one
    ///
    /// A failing check does not stop the ones after it.
    pub fn run(self) -> HealthCheckReport {
        let outcomes: Vec<CheckOutcome> = self.checks.iter().map(|check| run_one(check.as_ref())).collect();
        let report = HealthCheckReport { outcomes };
        info!(
            total = report.total(),
            failed = report.count(CheckStatus::Fail),
            tasks_run = report.metric_total("tasks_run"),
            messages_consumed = report.metric_total("messages_consumed"),
            "health checks finished"
        );
        report
    }
}

fn run_one(check: &dyn SystemCheck) -> CheckOutcome {
    let name = check.name();
    let start = Instant::now();
    let result = check.check().with_duration(start.elapsed());

    match result.status {
        CheckStatus::Pass => debug!(check = name, duration = ?result.duration, metrics = ?result.metrics, "passed"),
        CheckStatus::Warn | CheckStatus::Fail => {
            warn!(check = name, status = %result.status, message = %result.message, "not passing")
        }
    }

    CheckOutcome {
        name,
        description: check.description(),
        result,
    }
}
