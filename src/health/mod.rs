//! Startup self-checks
//!
//! Each check drives one subsystem on a manual clock and reports a status
//! plus the counters it saw (tasks run, messages consumed). `keylab health`
//! prints both and exits non-zero when a check fails.
//!
//! ```no_run
//! use keylab_router::health::{HealthCheckRunner, checks::{RoutingCheck, SchedulerCheck}};
//!
//! let report = HealthCheckRunner::new()
//!     .add_check(SchedulerCheck::new())
//!     .add_check(RoutingCheck::new())
//!     .run();
//! println!("{} scheduled tasks ran", report.metric_total("tasks_run"));
//! ```

pub mod check;
pub mod checks;
pub mod reporter;
pub mod runner;

pub use check::{CheckResult, CheckStatus, Metric, SystemCheck};
pub use reporter::{format_report, print_report};
pub use runner::{CheckOutcome, HealthCheckReport, HealthCheckRunner};

/// The checks `keylab health` runs, in report order
pub fn run_all_checks() -> HealthCheckReport {
    let runner = HealthCheckRunner::new()
        .add_check(checks::ConfigCheck::new())
        .add_check(checks::SchedulerCheck::new())
        .add_check(checks::RoutingCheck::new())
        .add_check(checks::BuildInfoCheck::new());
    runner.run()
}
