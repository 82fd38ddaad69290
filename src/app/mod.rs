//! Application layer
//!
//! Configuration, recorded event scripts, the offline replay runner and
//! the live stdin runner.

pub mod config;
mod live;
mod runner;
mod script;

pub use config::{AppConfig, ControlsConfig, DisplayConfig, MacrosConfig, TimingConfig};
pub use live::{LiveSummary, LoggingFeedback, LoggingWorkstation, run_live};
pub use runner::{
    Replay, ReplayOutcome, effective_chords, format_bindings, format_commands, format_feedback,
    format_outcome,
};
pub use script::{Script, ScriptError, Step, StepKind};
