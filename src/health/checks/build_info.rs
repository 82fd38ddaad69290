//! Build information health check

use crate::build_info;
use crate::health::check::{CheckResult, SystemCheck};

/// Checks that build metadata was captured
pub struct BuildInfoCheck;

impl BuildInfoCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BuildInfoCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for BuildInfoCheck {
    fn name(&self) -> &'static str {
        "Build Info"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates build metadata (package, rustc, target)")
    }

    fn check(&self) -> CheckResult {
        let details = [
            format!("  Package: {} {}", build_info::PKG_NAME, build_info::PKG_VERSION),
            format!("  Build time: {}", build_info::BUILD_TIMESTAMP),
            format!(
                "  Rustc: {} ({})",
                build_info::RUSTC_SEMVER,
                build_info::RUSTC_CHANNEL
            ),
            format!("  Target: {}", build_info::CARGO_TARGET_TRIPLE),
            format!("  Opt level: {}", build_info::CARGO_OPT_LEVEL),
        ];

        if build_info::RUSTC_SEMVER.is_empty() || build_info::CARGO_TARGET_TRIPLE.is_empty() {
            return CheckResult::warn("Build metadata incomplete").with_details(details.join("\n"));
        }
        CheckResult::pass(build_info::version_string()).with_details(details.join("\n"))
    }
}
