//! Integration tests for the health check system

use keylab_router::health::{self, CheckResult, CheckStatus, HealthCheckRunner, SystemCheck, checks::*};
use keylab_router::surface::SurfaceSettings;

#[test]
fn test_all_health_checks() {
    let report = health::run_all_checks();

    // Print report for debugging if tests fail
    if !report.is_healthy() {
        eprintln!("\n{}", health::format_report(&report));
    }

    assert!(
        report.is_healthy(),
        "Health checks failed: {} failures, {} warnings",
        report.count(CheckStatus::Fail),
        report.count(CheckStatus::Warn)
    );
    assert_eq!(report.total(), 4);
    assert!(report.metric_total("tasks_run") >= 5);
}

#[test]
fn test_config_check() {
    let result = ConfigCheck::new().check();
    assert!(result.status.is_ok(), "Config check failed: {}", result.message);
}

#[test]
fn test_scheduler_check() {
    let result = SchedulerCheck::new().check();
    assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
    assert_eq!(result.metric("tasks_run"), Some(5));
    assert_eq!(result.metric("tasks_failed"), Some(1));
    assert_eq!(result.metric("tasks_cancelled"), Some(1));
}

#[test]
fn test_routing_check() {
    let result = RoutingCheck::new().check();
    assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
    assert_eq!(result.metric("messages_consumed"), Some(8));
    assert_eq!(result.metric("messages_passed_on"), Some(2));
}

#[test]
fn test_routing_check_with_short_hold() {
    let settings = SurfaceSettings {
        long_press_ms: 40,
        ..SurfaceSettings::default()
    };
    let result = RoutingCheck::with_settings(settings).check();
    assert_eq!(result.status, CheckStatus::Pass, "{:?}", result.details);
}

#[test]
fn test_build_info_check() {
    let result = BuildInfoCheck::new().check();
    assert!(result.status.is_ok(), "Build info check failed: {}", result.message);
}

struct Broken;

impl SystemCheck for Broken {
    fn name(&self) -> &'static str {
        "Broken"
    }

    fn check(&self) -> CheckResult {
        CheckResult::fail("always fails")
    }
}

#[test]
fn test_report_exit_codes() {
    let healthy = HealthCheckRunner::new().add_check(SchedulerCheck::new()).run();
    assert_eq!(healthy.exit_code(), 0);

    let broken = HealthCheckRunner::new()
        .add_check(SchedulerCheck::new())
        .add_check(Broken)
        .run();
    assert_eq!(broken.total(), 2);
    assert_eq!(broken.exit_code(), 1);
    assert_eq!(broken.failures().map(|outcome| outcome.name).collect::<Vec<_>>(), vec!["Broken"]);
    assert!(health::format_report(&broken).contains("always fails"));
}
