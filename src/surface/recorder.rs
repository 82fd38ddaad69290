//! Drum pad recorder
//!
//! Holding a pad (or pressing it with record held) starts capturing the
//! notes played on the keys into that pad. Tapping the pad later plays the
//! capture back through the scheduler, looping while the sustain pedal was
//! down when it started.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::{debug, warn};

use super::commands::Command;
use super::controller::Controller;
use super::controls::{Light, PADS};
use crate::input::{ControlId, Modifiers};
use crate::runtime::{Millis, Scheduled, TaskHandle};

/// A pad, by the note it sends
pub type Pad = ControlId;

/// One captured note; velocity zero is a note off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedNote {
    pub at_ms: Millis,
    pub note: u8,
    pub velocity: u8,
}

/// Captured patterns and the state of the pad gesture
#[derive(Debug, Default)]
pub struct PadRecorder {
    recording: Option<Pad>,
    capture: Vec<RecordedNote>,
    patterns: BTreeMap<Pad, Rc<[RecordedNote]>>,
    looping: BTreeSet<Pad>,
    holds: BTreeMap<Pad, TaskHandle>,
    /// Pad whose next release belongs to the gesture that started recording
    swallow_release: Option<Pad>,
    sustain: bool,
}

impl PadRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts capturing into `pad`, dropping what it held before
    pub fn start(&mut self, pad: Pad) {
        self.recording = Some(pad);
        self.capture.clear();
        self.patterns.remove(&pad);
        self.swallow_release = Some(pad);
    }

    /// Stops capturing; returns the pad and how many notes it got
    pub fn stop(&mut self) -> Option<(Pad, usize)> {
        let pad = self.recording.take()?;
        let notes = std::mem::take(&mut self.capture);
        let count = notes.len();
        if !notes.is_empty() {
            self.patterns.insert(pad, notes.into());
        }
        Some((pad, count))
    }

    pub fn recording(&self) -> Option<Pad> {
        self.recording
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Adds a note to the running capture; ignored when not recording
    pub fn capture(&mut self, at_ms: Millis, note: u8, velocity: u8) -> bool {
        if self.recording.is_none() {
            return false;
        }
        self.capture.push(RecordedNote {
            at_ms,
            note,
            velocity,
        });
        true
    }

    pub fn pattern(&self, pad: Pad) -> Option<Rc<[RecordedNote]>> {
        self.patterns.get(&pad).cloned()
    }

    pub fn is_looping(&self, pad: Pad) -> bool {
        self.looping.contains(&pad)
    }

    /// Ends every loop; returns how many were running
    pub fn stop_loops(&mut self) -> usize {
        let count = self.looping.len();
        self.looping.clear();
        count
    }

    pub fn sustain(&self) -> bool {
        self.sustain
    }

    pub fn set_sustain(&mut self, held: bool) {
        self.sustain = held;
    }

    /// Pending hold timers, for the caller to cancel
    pub(super) fn take_holds(&mut self) -> Vec<TaskHandle> {
        self.swallow_release = None;
        std::mem::take(&mut self.holds).into_values().collect()
    }

    fn take_swallowed_release(&mut self, pad: Pad) -> bool {
        if self.swallow_release == Some(pad) {
            self.swallow_release = None;
            return true;
        }
        false
    }
}

/// Pad pressed with `velocity`
///
/// The tap acts right away; a hold timer decides whether recording starts.
pub fn pad_pressed(ctx: &mut Controller, pad: Pad, velocity: u8) -> anyhow::Result<()> {
    if ctx.recorder().swallow_release == Some(pad) {
        return Ok(());
    }
    if ctx.input().active().contains(Modifiers::RECORD) {
        ctx.router_mut().commit();
        return toggle_recording(ctx, pad);
    }

    if !ctx.recorder().holds.contains_key(&pad) {
        let delay = ctx.settings().pad_long_press_ms;
        let handle = ctx
            .scheduler()
            .schedule_named("pad-hold", delay, move |ctx: &mut Controller| {
                ctx.recorder_mut().holds.remove(&pad);
                toggle_recording(ctx, pad)
            });
        ctx.recorder_mut().holds.insert(pad, handle);
    }
    pad_tapped(ctx, pad, velocity)
}

/// Pad released
pub fn pad_released(ctx: &mut Controller, pad: Pad) -> anyhow::Result<()> {
    if ctx.recorder_mut().take_swallowed_release(pad) {
        return Ok(());
    }
    stop_recording(ctx);
    if let Some(handle) = ctx.recorder_mut().holds.remove(&pad) {
        ctx.scheduler().cancel(handle);
    }
    Ok(())
}

/// Records a note from the keys if a capture is running
pub fn capture_note(ctx: &mut Controller, note: u8, velocity: u8) -> bool {
    let now = ctx.now();
    ctx.recorder_mut().capture(now, note, velocity)
}

/// Ends the running capture, if any
pub fn stop_recording(ctx: &mut Controller) {
    if let Some((pad, notes)) = ctx.recorder_mut().stop() {
        ctx.stop_recording_blink();
        debug!(pad, notes, "pad recording stopped");
    }
}

/// Stop button: ends a capture, otherwise every loop
pub fn stop_pads(ctx: &mut Controller) {
    if ctx.recorder().is_recording() {
        stop_recording(ctx);
        return;
    }
    let stopped = ctx.recorder_mut().stop_loops();
    if stopped > 0 {
        debug!(stopped, "pad loops stopped");
    }
}

fn toggle_recording(ctx: &mut Controller, pad: Pad) -> anyhow::Result<()> {
    if ctx.recorder().is_recording() {
        stop_recording(ctx);
        return Ok(());
    }
    ctx.recorder_mut().start(pad);
    if let Some(light) = Light::for_pad(pad) {
        ctx.start_recording_blink(light);
    }
    ctx.show_hint("Recording", &format!("Pad {}", pad.saturating_sub(PADS.start) + 1));
    debug!(pad, "pad recording started");
    Ok(())
}

fn pad_tapped(ctx: &mut Controller, pad: Pad, velocity: u8) -> anyhow::Result<()> {
    if ctx.recorder().is_recording() {
        stop_recording(ctx);
        return Ok(());
    }
    let looped = ctx.recorder().sustain();
    if play_pattern(ctx, pad, looped) {
        return Ok(());
    }
    ctx.perform(&Command::PlayNote(pad), i32::from(velocity))
}

/// Plays the pattern captured in `pad`
///
/// Tapping a looping pad ends its loop instead. Returns `false` if the
/// pad holds nothing.
pub fn play_pattern(ctx: &mut Controller, pad: Pad, looped: bool) -> bool {
    if ctx.recorder_mut().looping.remove(&pad) {
        debug!(pad, "pad loop stopped");
        return true;
    }
    let Some(notes) = ctx.recorder().pattern(pad) else {
        return false;
    };
    if looped {
        ctx.recorder_mut().looping.insert(pad);
    }
    play_pass(ctx, pad, notes);
    true
}

/// Schedules one pass of `notes` relative to the first, then the next
/// pass if the pad is looping
fn play_pass(ctx: &mut Controller, pad: Pad, notes: Rc<[RecordedNote]>) {
    let Some(first) = notes.first() else {
        return;
    };
    let base = first.at_ms;
    let mut last_delay = 0;

    for note in notes.iter().copied() {
        let delay = note.at_ms.saturating_sub(base);
        last_delay = delay;
        if delay == 0 {
            play_note(ctx, note);
        } else {
            ctx.scheduler()
                .schedule_named("pad-note", delay, move |ctx: &mut Controller| {
                    play_note(ctx, note);
                    Ok(())
                });
        }
    }

    if ctx.recorder().is_looping(pad) {
        let restart = last_delay + ctx.settings().pad_loop_gap_ms;
        ctx.scheduler()
            .schedule_named("pad-loop", restart, move |ctx: &mut Controller| {
                if ctx.recorder().is_looping(pad) {
                    play_pass(ctx, pad, notes);
                }
                Ok(())
            });
    }
}

fn play_note(ctx: &mut Controller, note: RecordedNote) {
    if let Err(err) = ctx.perform(&Command::PlayNote(note.note), i32::from(note.velocity)) {
        warn!(note = note.note, error = %err, "pad note failed");
    }
}
