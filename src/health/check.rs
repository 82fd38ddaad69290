//! What a self-check returns

use std::fmt;
use std::time::Duration;

use colored::{ColoredString, Colorize};

/// Verdict of one check; `Warn` still counts as healthy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn is_ok(self) -> bool {
        self != Self::Fail
    }

    pub fn is_fail(self) -> bool {
        self == Self::Fail
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
        }
    }

    /// Label colored green, yellow or red for the terminal
    pub fn colored(self) -> ColoredString {
        let label = self.label();
        match self {
            Self::Pass => label.green(),
            Self::Warn => label.yellow(),
            Self::Fail => label.red(),
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A counter a check observed while exercising its subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metric {
    pub name: &'static str,
    pub value: u64,
}

/// Verdict, one-line summary, step list and counters of a check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub status: CheckStatus,
    pub message: String,
    /// Steps the check went through, one per line
    pub details: Option<String>,
    /// Tasks run, messages routed and the like, in the order recorded
    pub metrics: Vec<Metric>,
    /// Filled in by the runner
    pub duration: Duration,
}

impl CheckResult {
    pub fn new(status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            metrics: Vec::new(),
            duration: Duration::ZERO,
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Pass, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Warn, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(CheckStatus::Fail, message)
    }

    pub fn with_details(self, details: impl Into<String>) -> Self {
        Self {
            details: Some(details.into()),
            ..self
        }
    }

    /// Records a counter; a name recorded twice keeps the last value
    pub fn with_metric(mut self, name: &'static str, value: impl TryInto<u64>) -> Self {
        let value = value.try_into().unwrap_or(u64::MAX);
        match self.metrics.iter_mut().find(|metric| metric.name == name) {
            Some(metric) => metric.value = value,
            None => self.metrics.push(Metric { name, value }),
        }
        self
    }

    pub fn metric(&self, name: &str) -> Option<u64> {
        self.metrics
            .iter()
            .find(|metric| metric.name == name)
            .map(|metric| metric.value)
    }

    pub fn with_duration(self, duration: Duration) -> Self {
        Self { duration, ..self }
    }
}

/// One self-check of a subsystem
///
/// Checks build everything they need themselves, on a manual clock where
/// time matters, so they can run at any point.
pub trait SystemCheck {
    fn name(&self) -> &'static str;

    fn check(&self) -> CheckResult;

    /// One line on what the check drives, shown above its step list
    fn description(&self) -> Option<&'static str> {
        None
    }
}
