//! Live runner: messages from a reader, idle ticks from a real clock
//!
//! The surface stays on the calling thread. A reader thread only parses
//! lines and forwards events over a channel, which the loop drains between
//! idle ticks.

use std::io::BufRead;
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, info, warn};

use super::config::AppConfig;
use super::runner::effective_chords;
use super::script::parse_message;
use crate::input::InputEvent;
use crate::runtime::{Clock, MonotonicClock};
use crate::surface::{Command, Feedback, Light, Port, Surface, Workstation};

/// Workstation that only logs what it is asked to do
#[derive(Debug, Default)]
pub struct LoggingWorkstation;

impl Workstation for LoggingWorkstation {
    fn perform(&mut self, command: &Command, value: i32) -> anyhow::Result<()> {
        info!(%command, value, "perform");
        Ok(())
    }
}

/// Feedback sink that logs display and light changes
#[derive(Debug, Default)]
pub struct LoggingFeedback;

impl Feedback for LoggingFeedback {
    fn show_lines(&mut self, line1: &str, line2: &str) {
        info!(line1, line2, "display");
    }

    fn set_light(&mut self, light: Light, on: bool) {
        info!(?light, on, "light");
    }
}

/// Totals of a live session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveSummary {
    pub messages: usize,
    pub consumed: usize,
    pub rejected_lines: usize,
    pub tasks_run: usize,
}

/// Runs until `input` is exhausted and every pending task has run
///
/// Each line is `[keys] <status> <data1> <data2>`; blank lines and `#`
/// comments are skipped, bad lines are logged and counted. Once input ends
/// the surface is closed, so blinking locks and pad loops do not keep the
/// session alive.
pub fn run_live<R>(config: &AppConfig, input: R) -> anyhow::Result<LiveSummary>
where
    R: BufRead + Send + 'static,
{
    let chords = effective_chords(config).context("invalid macro override")?;
    let clock: Rc<dyn Clock> = Rc::new(MonotonicClock::new());
    let mut surface = Surface::new(
        config.surface_settings(),
        chords,
        clock,
        Box::new(LoggingWorkstation),
        Box::new(LoggingFeedback),
    );

    let (sender, receiver) = mpsc::channel::<Result<(Port, InputEvent), String>>();
    let reader = thread::Builder::new()
        .name("keylab-input".to_string())
        .spawn(move || {
            for (index, line) in input.lines().enumerate() {
                let Ok(line) = line else { break };
                let content = line.split('#').next().unwrap_or_default().trim();
                if content.is_empty() {
                    continue;
                }
                let parsed = parse_message(index + 1, content).map_err(|err| err.to_string());
                if sender.send(parsed).is_err() {
                    break;
                }
            }
        })
        .context("failed to start input reader")?;

    let interval = Duration::from_millis(config.timing.idle_interval_ms.max(1));
    let mut summary = LiveSummary::default();
    let mut input_open = true;

    while input_open || surface.controller().pending_tasks() > 0 {
        let mut batch = Vec::new();
        if input_open {
            match receiver.recv_timeout(interval) {
                Ok(first) => {
                    batch.push(first);
                    batch.extend(receiver.try_iter());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    input_open = false;
                    surface.close();
                    debug!(pending = surface.controller().pending_tasks(), "input closed");
                }
            }
        } else {
            thread::sleep(interval);
        }

        let mut events = Vec::with_capacity(batch.len());
        for parsed in batch {
            match parsed {
                Ok(event) => events.push(event),
                Err(err) => {
                    warn!(error = %err, "skipping input line");
                    summary.rejected_lines += 1;
                }
            }
        }

        let report = surface.on_port_tick(events.iter().map(|(port, event)| (*port, event)));
        summary.messages += events.len();
        summary.consumed += report.consumed;
        summary.tasks_run += report.pump.executed;
    }

    if reader.join().is_err() {
        warn!("input reader panicked");
    }
    info!(?summary, "live session finished");
    Ok(summary)
}
