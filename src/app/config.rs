//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, Map};
use serde::{Deserialize, Serialize};

use crate::runtime::Millis;
use crate::surface::{MacroOverride, SurfaceSettings};

/// Hold times and refresh intervals, in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub long_press_ms: Millis,
    pub navigation_long_press_ms: Millis,
    pub hint_expiry_ms: Millis,
    pub navigation_display_ms: Millis,
    pub blink_interval_ms: Millis,
    pub scroll_interval_ms: Millis,
    pub pad_long_press_ms: Millis,
    /// Pause between the last note of a looped pad pattern and its restart
    pub pad_loop_gap_ms: Millis,
    /// Poll interval of the live runner
    pub idle_interval_ms: Millis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let surface = SurfaceSettings::default();
        Self {
            long_press_ms: surface.long_press_ms,
            navigation_long_press_ms: surface.navigation_long_press_ms,
            hint_expiry_ms: surface.hint_expiry_ms,
            navigation_display_ms: surface.navigation_display_ms,
            blink_interval_ms: surface.blink_interval_ms,
            scroll_interval_ms: surface.scroll_interval_ms,
            pad_long_press_ms: surface.pad_long_press_ms,
            pad_loop_gap_ms: surface.pad_loop_gap_ms,
            idle_interval_ms: 20,
        }
    }
}

/// Text display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Characters per display line
    pub line_width: usize,
    /// Whether hints are shown in upper case
    pub hint_all_caps: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_width: 16,
            hint_all_caps: false,
        }
    }
}

/// Control behavior switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Whether long presses on the arrows toggle the channel rack and mixer
    pub navigation_buttons_toggle_windows: bool,
    /// Whether unconsumed messages are logged
    pub log_unhandled: bool,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            navigation_buttons_toggle_windows: true,
            log_unhandled: true,
        }
    }
}

/// User chord bindings applied over the built-in layout
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MacrosConfig {
    pub overrides: Vec<MacroOverride>,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub macros: MacrosConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Profiles are loaded from config files in the following order:
    /// 1. config/{profile}.toml (profile-specific configuration)
    /// 2. Environment variables with prefix APP_ (e.g., APP_TIMING__LONG_PRESS_MS=600)
    ///
    /// Config files are searched for in:
    /// 1. Next to the executable (target/debug/config or target/release/config)
    /// 2. In the current directory (./config)
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        match Self::find_config_dir() {
            Some(dir) => Self::load_from_dir(&dir, profile),
            None => Self::build(
                Config::builder()
                    .add_source(File::with_name(&format!("config/{profile}")).required(false)),
                environment(None),
                profile,
            ),
        }
    }

    /// Loads `{dir}/{profile}.toml` plus environment overrides
    pub fn load_from_dir(dir: &Path, profile: &str) -> Result<Self, ConfigError> {
        Self::build(Self::profile_file(dir, profile), environment(None), profile)
    }

    /// Like [`AppConfig::load_from_dir`], reading overrides from `vars`
    /// instead of the process environment
    pub fn load_from_dir_with_vars(
        dir: &Path,
        profile: &str,
        vars: Map<String, String>,
    ) -> Result<Self, ConfigError> {
        Self::build(Self::profile_file(dir, profile), environment(Some(vars)), profile)
    }

    fn profile_file(dir: &Path, profile: &str) -> config::ConfigBuilder<config::builder::DefaultState> {
        let profile_path = dir.join(profile);
        Config::builder().add_source(File::from(profile_path.as_path()).required(false))
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: Environment,
        profile: &str,
    ) -> Result<Self, ConfigError> {
        let config = builder
            .add_source(environment)
            .set_override("profile", profile)?
            .build()?;

        config.try_deserialize()
    }

    /// Finds the config directory by searching in multiple locations
    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        None
    }

    /// Loads configuration using the APP_PROFILE environment variable,
    /// defaulting to "release"
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let profile = std::env::var("APP_PROFILE").unwrap_or_else(|_| "release".to_string());
        Self::load(&profile)
    }

    /// Built-in values, without touching files or the environment
    pub fn builtin(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            timing: TimingConfig::default(),
            display: DisplayConfig::default(),
            controls: ControlsConfig::default(),
            macros: MacrosConfig::default(),
        }
    }

    /// Surface settings derived from this configuration
    pub fn surface_settings(&self) -> SurfaceSettings {
        SurfaceSettings::from(self)
    }
}

/// `APP_` variables, with `__` between nested keys (`APP_TIMING__LONG_PRESS_MS`)
fn environment(vars: Option<Map<String, String>>) -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(vars)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::load("release").unwrap_or_else(|_| Self::builtin("release"))
    }
}

impl From<&AppConfig> for SurfaceSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            long_press_ms: config.timing.long_press_ms,
            navigation_long_press_ms: config.timing.navigation_long_press_ms,
            hint_expiry_ms: config.timing.hint_expiry_ms,
            navigation_display_ms: config.timing.navigation_display_ms,
            blink_interval_ms: config.timing.blink_interval_ms,
            scroll_interval_ms: config.timing.scroll_interval_ms,
            pad_long_press_ms: config.timing.pad_long_press_ms,
            pad_loop_gap_ms: config.timing.pad_loop_gap_ms,
            line_width: config.display.line_width,
            hint_all_caps: config.display.hint_all_caps,
            navigation_buttons_toggle_windows: config.controls.navigation_buttons_toggle_windows,
            log_unhandled: config.controls.log_unhandled,
        }
    }
}
