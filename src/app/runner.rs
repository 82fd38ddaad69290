//! Offline replay of event scripts against a simulated clock

use std::rc::Rc;

use tabled::{
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Rows},
};
use tracing::{debug, info};

use super::config::AppConfig;
use super::script::{Script, StepKind};
use crate::input::{BindingError, ChordTable, InputEvent};
use crate::runtime::{Clock, ManualClock};
use crate::surface::{
    Command, CommandLog, FeedbackEvent, FeedbackLog, Performed, Port, Surface, apply_overrides,
    default_chords,
};

/// Chord table after the config's overrides are applied
pub fn effective_chords(config: &AppConfig) -> Result<ChordTable<Command>, BindingError> {
    let mut chords = default_chords();
    let applied = apply_overrides(&mut chords, &config.macros.overrides)?;
    debug!(applied, bindings = chords.len(), "chord table ready");
    Ok(chords)
}

/// What a replay produced
#[derive(Debug, Clone, Default)]
pub struct ReplayOutcome {
    pub commands: Vec<Performed>,
    pub feedback: Vec<FeedbackEvent>,
    pub consumed: usize,
    pub unconsumed: usize,
    pub tasks_run: usize,
    pub tasks_failed: usize,
}

/// A surface wired to recording collaborators and a manual clock
pub struct Replay {
    clock: ManualClock,
    commands: CommandLog,
    feedback: FeedbackLog,
    surface: Surface,
}

impl Replay {
    pub fn new(config: &AppConfig) -> Result<Self, BindingError> {
        let chords = effective_chords(config)?;
        let clock = ManualClock::new();
        let shared: Rc<dyn Clock> = Rc::new(clock.clone());
        let commands = CommandLog::new(Rc::clone(&shared));
        let feedback = FeedbackLog::new(Rc::clone(&shared));
        let surface = Surface::new(
            config.surface_settings(),
            chords,
            shared,
            Box::new(commands.clone()),
            Box::new(feedback.clone()),
        );

        Ok(Self {
            clock,
            commands,
            feedback,
            surface,
        })
    }

    /// Plays `script` from its first step to its last
    ///
    /// Steps sharing a timestamp form one host tick: their messages are
    /// routed first, then due tasks run.
    pub fn run(&mut self, script: &Script) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();
        let steps = script.steps();
        let mut start = 0;

        while start < steps.len() {
            let at_ms = steps[start].at_ms;
            let end = steps[start..]
                .iter()
                .position(|step| step.at_ms != at_ms)
                .map_or(steps.len(), |offset| start + offset);

            self.clock.set(at_ms);
            let events: Vec<(Port, InputEvent)> = steps[start..end]
                .iter()
                .filter_map(|step| match step.kind {
                    StepKind::Message(port, event) => Some((port, event)),
                    StepKind::Idle => None,
                })
                .collect();

            let report = self
                .surface
                .on_port_tick(events.iter().map(|(port, event)| (*port, event)));
            outcome.consumed += report.consumed;
            outcome.unconsumed += report.unconsumed;
            outcome.tasks_run += report.pump.executed;
            outcome.tasks_failed += report.pump.failed;
            start = end;
        }

        outcome.commands = self.commands.entries();
        outcome.feedback = self.feedback.events();
        info!(
            steps = steps.len(),
            commands = outcome.commands.len(),
            consumed = outcome.consumed,
            "replay finished"
        );
        outcome
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Formats performed commands as a table
pub fn format_commands(commands: &[Performed]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Time", "Command", "Value"]);
    for entry in commands {
        builder.push_record([
            format!("{}ms", entry.at_ms),
            entry.command.to_string(),
            entry.value.to_string(),
        ]);
    }
    styled(builder)
}

/// Formats display and light output as a table
pub fn format_feedback(events: &[FeedbackEvent]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Time", "Output", "State"]);
    for event in events {
        match event {
            FeedbackEvent::Lines {
                at_ms,
                line1,
                line2,
            } => builder.push_record([format!("{at_ms}ms"), "display".to_string(), format!("{line1} | {line2}")]),
            FeedbackEvent::Light { at_ms, light, on } => builder.push_record([
                format!("{at_ms}ms"),
                format!("{light:?}"),
                if *on { "on" } else { "off" }.to_string(),
            ]),
        }
    }
    styled(builder)
}

/// Formats a chord table, one binding per row
pub fn format_bindings(chords: &ChordTable<Command>) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Modifiers", "Slot", "Command", "Doc"]);
    for (key, binding) in chords.iter() {
        builder.push_record([
            key.modifiers.to_string(),
            key.slot.to_string(),
            binding.action.to_string(),
            binding.doc.clone(),
        ]);
    }
    styled(builder)
}

/// Formats a whole replay: commands, then output, then totals
pub fn format_outcome(outcome: &ReplayOutcome) -> String {
    format!(
        "{}\n{}\nconsumed {} / unconsumed {} messages, {} tasks run ({} failed)\n",
        format_commands(&outcome.commands),
        format_feedback(&outcome.feedback),
        outcome.consumed,
        outcome.unconsumed,
        outcome.tasks_run,
        outcome.tasks_failed,
    )
}
