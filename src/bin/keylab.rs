use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use keylab_router::app::{self, AppConfig, Replay, Script};
use keylab_router::{build_info, health};

#[derive(Parser)]
#[command(author, version, about = "KeyLab control surface router")]
struct Cli {
    /// Config profile to load (defaults to APP_PROFILE, then "release")
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded event script on a simulated clock
    Replay {
        /// Script file: `<time_ms> <status> <data1> <data2>` or `<time_ms> idle` per line
        script: PathBuf,
    },
    /// Route messages read from stdin in real time
    Live,
    /// Print the effective chord bindings
    Bindings,
    /// Run the startup self-checks
    Health,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .init();
}

fn load_config(profile: Option<&str>) -> Result<AppConfig> {
    let config = match profile {
        Some(profile) => AppConfig::load(profile),
        None => AppConfig::load_from_env(),
    }
    .context("failed to load configuration")?;
    info!(profile = %config.profile, overrides = config.macros.overrides.len(), "configuration loaded");
    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!(build = %build_info::version_string(), "keylab starting");

    match cli.command {
        Commands::Replay { script } => {
            let config = load_config(cli.profile.as_deref())?;
            let script = Script::load(&script)?;
            let mut replay = Replay::new(&config).context("invalid macro override")?;
            let outcome = replay.run(&script);
            print!("{}", app::format_outcome(&outcome));
            if outcome.tasks_failed > 0 {
                warn!(failed = outcome.tasks_failed, "some deferred tasks failed");
            }
        }
        Commands::Live => {
            let config = load_config(cli.profile.as_deref())?;
            let summary = app::run_live(&config, io::BufReader::new(io::stdin()))?;
            println!(
                "{} messages, {} consumed, {} rejected lines, {} tasks run",
                summary.messages, summary.consumed, summary.rejected_lines, summary.tasks_run
            );
        }
        Commands::Bindings => {
            let config = load_config(cli.profile.as_deref())?;
            let chords = app::effective_chords(&config).context("invalid macro override")?;
            println!("{}", app::format_bindings(&chords));
        }
        Commands::Health => {
            let report = health::run_all_checks();
            health::print_report(&report);
            return Ok(ExitCode::from(report.exit_code()));
        }
    }

    Ok(ExitCode::SUCCESS)
}
