//! Build-time information
//!
//! Metadata captured by the build script: build timestamp, cargo
//! configuration and compiler version.

/// Package name from Cargo.toml
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Package version from Cargo.toml
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build timestamp (when the binary was compiled)
pub const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");

/// Cargo optimization level (0, 1, 2, 3, s, z)
pub const CARGO_OPT_LEVEL: &str = env!("VERGEN_CARGO_OPT_LEVEL");

/// Target triple (e.g., x86_64-unknown-linux-gnu)
pub const CARGO_TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");

/// Rust compiler version (e.g., 1.85.0)
pub const RUSTC_SEMVER: &str = env!("VERGEN_RUSTC_SEMVER");

/// Rust channel (stable, beta, or nightly)
pub const RUSTC_CHANNEL: &str = env!("VERGEN_RUSTC_CHANNEL");

/// Version string for `--version`
///
/// Format: `{version} ({target_triple}-opt{opt_level})`
pub fn version_string() -> String {
    format!("{PKG_VERSION} ({CARGO_TARGET_TRIPLE}-opt{CARGO_OPT_LEVEL})")
}

/// Multi-line build summary
pub fn detailed_info() -> String {
    format!(
        "{PKG_NAME} {PKG_VERSION}\nBuilt: {BUILD_TIMESTAMP}\nTarget: {CARGO_TARGET_TRIPLE}\nOptimization: {CARGO_OPT_LEVEL}\nRustc: {RUSTC_SEMVER} ({RUSTC_CHANNEL})"
    )
}
