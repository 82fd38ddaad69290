//! Terminal rendering of a health run
//!
//! One row per check, then the counters the checks recorded, then a
//! verdict line.

use colored::Colorize;
use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};

use super::check::CheckStatus;
use super::runner::HealthCheckReport;

fn rounded(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

fn checks_table(report: &HealthCheckReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Check", "Status", "Time", "Result"]);
    for outcome in &report.outcomes {
        builder.push_record([
            outcome.name.to_string(),
            outcome.result.status.colored().to_string(),
            format!("{:.2?}", outcome.result.duration),
            outcome.result.message.clone(),
        ]);
    }
    rounded(builder)
}

/// Counters per check; empty when no check recorded any
fn metrics_table(report: &HealthCheckReport) -> Option<String> {
    let mut builder = Builder::default();
    builder.push_record(["Check", "Counter", "Value"]);
    let mut rows = 0;
    for outcome in &report.outcomes {
        for metric in &outcome.result.metrics {
            builder.push_record([outcome.name.to_string(), metric.name.replace('_', " "), metric.value.to_string()]);
            rows += 1;
        }
    }
    (rows > 0).then(|| rounded(builder))
}

fn verdict(report: &HealthCheckReport) -> String {
    let failed = report.count(CheckStatus::Fail);
    let warned = report.count(CheckStatus::Warn);
    let counts = format!(
        "{} checks, {} passed, {warned} warned, {failed} failed",
        report.total(),
        report.count(CheckStatus::Pass),
    );

    let mut out = String::new();
    for outcome in report.failures() {
        out.push_str(&format!("  {} {}: {}\n", "✗".red(), outcome.name, outcome.result.message));
    }
    let label = match (failed, warned) {
        (0, 0) => "HEALTHY".green().bold(),
        (0, _) => "HEALTHY (with warnings)".yellow().bold(),
        _ => "UNHEALTHY".red().bold(),
    };
    out.push_str(&format!("{label}: {counts}\n"));
    out
}

/// Renders the whole report
pub fn format_report(report: &HealthCheckReport) -> String {
    let mut out = checks_table(report);
    out.push('\n');
    if let Some(metrics) = metrics_table(report) {
        out.push_str(&metrics);
        out.push('\n');
    }
    out.push_str(&verdict(report));
    out
}

/// Prints the report, followed by the step list of every check
pub fn print_report(report: &HealthCheckReport) {
    println!("{}", format_report(report));
    for outcome in &report.outcomes {
        let Some(details) = &outcome.result.details else {
            continue;
        };
        match outcome.description {
            Some(description) => println!("{} ({description})", outcome.name.bold()),
            None => println!("{}", outcome.name.bold()),
        }
        println!("{details}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::check::CheckResult;
    use crate::health::runner::CheckOutcome;

    fn report(results: Vec<(&'static str, CheckResult)>) -> HealthCheckReport {
        HealthCheckReport {
            outcomes: results
                .into_iter()
                .map(|(name, result)| CheckOutcome {
                    name,
                    description: None,
                    result,
                })
                .collect(),
        }
    }

    #[test]
    fn test_metrics_rendered_per_check() {
        colored::control::set_override(false);
        let text = format_report(&report(vec![(
            "Scheduler",
            CheckResult::pass("Scheduler operational").with_metric("tasks_failed", 1u32),
        )]));

        assert!(text.contains("tasks failed"));
        assert!(text.contains("HEALTHY: 1 checks, 1 passed, 0 warned, 0 failed"));
    }

    #[test]
    fn test_no_metrics_table_without_counters() {
        colored::control::set_override(false);
        let text = format_report(&report(vec![("Build", CheckResult::fail("missing target"))]));

        assert!(!text.contains("Counter"));
        assert!(text.contains("Build: missing target"));
        assert!(text.contains("UNHEALTHY"));
    }
}
