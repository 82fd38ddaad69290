//! Controller context shared by every handler and deferred task

use std::rc::Rc;

use tracing::{debug, trace};

use super::commands::{Command, Workstation};
use super::controls::Light;
use super::display::PagedDisplay;
use super::feedback::Feedback;
use super::navigation::Navigation;
use super::pages::ControlPages;
use super::recorder::{self, PadRecorder};
use crate::input::{ChordTable, InputRouter, Resolution, RouterHost};
use crate::runtime::{Clock, Millis, Scheduled, Scheduler, TaskHandle};

/// Timing and behavior knobs of a surface
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceSettings {
    /// Hold time that turns a press into a long press
    pub long_press_ms: Millis,
    /// Hold time for the navigation arrows
    pub navigation_long_press_ms: Millis,
    /// How long a hint covers the main page
    pub hint_expiry_ms: Millis,
    /// How long a navigation page stays up after a change
    pub navigation_display_ms: Millis,
    /// Half period of a blinking light
    pub blink_interval_ms: Millis,
    /// Time between scroll steps of lines wider than the display
    pub scroll_interval_ms: Millis,
    /// Hold time that starts recording into a pad
    pub pad_long_press_ms: Millis,
    /// Pause before a looping pad pattern starts over
    pub pad_loop_gap_ms: Millis,
    pub line_width: usize,
    pub hint_all_caps: bool,
    /// Long presses on the arrows toggle the channel rack and mixer
    pub navigation_buttons_toggle_windows: bool,
    /// Log every message the surface did not consume
    pub log_unhandled: bool,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            long_press_ms: 450,
            navigation_long_press_ms: 1000,
            hint_expiry_ms: 1500,
            navigation_display_ms: 2000,
            blink_interval_ms: 500,
            scroll_interval_ms: 500,
            pad_long_press_ms: 1000,
            pad_loop_gap_ms: 500,
            line_width: 16,
            hint_all_caps: false,
            navigation_buttons_toggle_windows: true,
            log_unhandled: true,
        }
    }
}

/// A light blinking on its own schedule
#[derive(Debug, Clone, Copy)]
struct Blink {
    light: Light,
    lit: bool,
    handle: TaskHandle,
}

/// Independent blinkers: the modifier lock and the pad recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkSlot {
    Lock = 0,
    Recording = 1,
}

/// Everything a handler can touch
///
/// Holds `Rc`s, so it is neither `Send` nor `Sync`: the host's single
/// callback thread is the only place it can live.
pub struct Controller {
    scheduler: Scheduler<Controller>,
    router: InputRouter<Command>,
    display: PagedDisplay,
    navigation: Navigation,
    pages: ControlPages,
    recorder: PadRecorder,
    blinks: [Option<Blink>; 2],
    scroll: Option<TaskHandle>,
    /// Set once the surface winds down; long lines stop moving for good
    scroll_parked: bool,
    settings: SurfaceSettings,
    workstation: Box<dyn Workstation>,
    feedback: Box<dyn Feedback>,
}

impl Controller {
    pub fn new(
        settings: SurfaceSettings,
        chords: ChordTable<Command>,
        clock: Rc<dyn Clock>,
        workstation: Box<dyn Workstation>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(clock),
            router: InputRouter::new(chords),
            display: PagedDisplay::new(settings.line_width, settings.hint_all_caps),
            navigation: Navigation::new(),
            pages: ControlPages::new(),
            recorder: PadRecorder::new(),
            blinks: [None; 2],
            scroll: None,
            scroll_parked: false,
            settings,
            workstation,
            feedback,
        }
    }

    pub fn settings(&self) -> &SurfaceSettings {
        &self.settings
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn input(&self) -> &InputRouter<Command> {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut InputRouter<Command> {
        &mut self.router
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn navigation_mut(&mut self) -> &mut Navigation {
        &mut self.navigation
    }

    pub fn display(&self) -> &PagedDisplay {
        &self.display
    }

    pub fn pages(&self) -> &ControlPages {
        &self.pages
    }

    pub fn recorder(&self) -> &PadRecorder {
        &self.recorder
    }

    pub fn recorder_mut(&mut self) -> &mut PadRecorder {
        &mut self.recorder
    }

    /// Runs a command against the workstation
    ///
    /// Page commands also move the encoder pages and show where they landed.
    pub fn perform(&mut self, command: &Command, value: i32) -> anyhow::Result<()> {
        trace!(%command, value, "perform");
        command.run(self.workstation.as_mut(), value)?;
        if let Some((line1, line2)) = self.pages.follow(command) {
            self.show_hint(&line1, &line2);
        }
        Ok(())
    }

    /// Executes or documents a resolved chord
    pub fn run_chord(&mut self, resolution: Resolution<Command>, value: i32) -> anyhow::Result<()> {
        match resolution {
            Resolution::Execute(binding) => {
                self.show_hint("[Macro]", &binding.doc);
                self.perform(&binding.action, value)
            }
            Resolution::Help(binding) => {
                self.show_hint("[Help]", &binding.doc);
                Ok(())
            }
            Resolution::Unbound => Ok(()),
        }
    }

    /// Replaces the main display page
    pub fn set_main_page(&mut self, line1: &str, line2: &str) {
        self.display.set_main(line1, line2);
        self.refresh_display();
    }

    /// Shows a hint for the configured expiry time
    pub fn show_hint(&mut self, line1: &str, line2: &str) {
        let expiry = self.settings.hint_expiry_ms;
        let until = self.now() + expiry;
        self.display.show_hint(line1, line2, until);
        self.schedule_refresh(expiry);
    }

    /// Shows a page overlay for `duration_ms`
    pub fn show_page(&mut self, line1: &str, line2: &str, duration_ms: Millis) {
        let until = self.now() + duration_ms;
        self.display.show_page(line1, line2, until);
        self.schedule_refresh(duration_ms);
    }

    fn schedule_refresh(&mut self, delay_ms: Millis) {
        self.scheduler
            .schedule_named("display-refresh", delay_ms, |ctx: &mut Controller| {
                ctx.refresh_display();
                Ok(())
            });
        self.refresh_display();
    }

    /// Pushes the visible display lines if they changed
    ///
    /// Starts the scroll timer when a visible line is too wide.
    pub fn refresh_display(&mut self) {
        let now = self.now();
        self.display.refresh(now, self.feedback.as_mut());
        if self.scroll.is_none() && !self.scroll_parked && self.display.overflows(now) {
            let interval = self.settings.scroll_interval_ms;
            let handle = self.scheduler.schedule_named("display-scroll", interval, scroll_step);
            self.scroll = Some(handle);
        }
    }

    /// Cancels the scroll timer; long lines stay where they are
    pub fn stop_scroll(&mut self) {
        if let Some(handle) = self.scroll.take() {
            self.scheduler.cancel(handle);
        }
    }

    pub fn is_scrolling(&self) -> bool {
        self.scroll.is_some()
    }

    pub fn set_light(&mut self, light: Light, on: bool) {
        self.feedback.set_light(light, on);
    }

    /// Starts blinking the lock `light`, replacing any light already blinking
    pub fn start_blink(&mut self, light: Light) {
        self.start_blink_in(BlinkSlot::Lock, light);
    }

    /// Stops the lock blink and turns its light off
    pub fn stop_blink(&mut self) {
        self.stop_blink_in(BlinkSlot::Lock);
    }

    /// Blinks a pad light while it records
    pub fn start_recording_blink(&mut self, light: Light) {
        self.start_blink_in(BlinkSlot::Recording, light);
    }

    pub fn stop_recording_blink(&mut self) {
        self.stop_blink_in(BlinkSlot::Recording);
    }

    /// Drops held and locked modifiers and cancels pending long presses
    pub fn reset_input(&mut self) {
        for handle in self.router.reset() {
            self.scheduler.cancel(handle);
        }
        self.stop_blink();
        debug!("input state reset");
    }

    /// Ends everything that would keep rescheduling itself
    ///
    /// Resets input, stops a pad capture and every pad loop, and parks the
    /// display scroll. Notes of a pattern pass already under way still play.
    pub fn wind_down(&mut self) {
        self.reset_input();
        for handle in self.recorder.take_holds() {
            self.scheduler.cancel(handle);
        }
        recorder::stop_pads(self);
        self.recorder.stop_loops();
        self.scroll_parked = true;
        self.stop_scroll();
        debug!(pending = self.scheduler.len(), "winding down");
    }

    /// Lock light currently blinking, if any
    pub fn blinking(&self) -> Option<Light> {
        self.blinks[BlinkSlot::Lock as usize].map(|blink| blink.light)
    }

    /// Pad light blinking while recording, if any
    pub fn recording_light(&self) -> Option<Light> {
        self.blinks[BlinkSlot::Recording as usize].map(|blink| blink.light)
    }

    fn start_blink_in(&mut self, slot: BlinkSlot, light: Light) {
        self.stop_blink_in(slot);
        let handle = self.schedule_blink(slot);
        self.blinks[slot as usize] = Some(Blink {
            light,
            lit: true,
            handle,
        });
        self.set_light(light, true);
        debug!(?light, ?slot, "blink started");
    }

    fn stop_blink_in(&mut self, slot: BlinkSlot) {
        if let Some(blink) = self.blinks[slot as usize].take() {
            self.scheduler.cancel(blink.handle);
            self.set_light(blink.light, false);
            debug!(light = ?blink.light, ?slot, "blink stopped");
        }
    }

    fn schedule_blink(&mut self, slot: BlinkSlot) -> TaskHandle {
        let interval = self.settings.blink_interval_ms;
        self.scheduler
            .schedule_named("blink", interval, move |ctx: &mut Controller| {
                blink_step(ctx, slot);
                Ok(())
            })
    }
}

/// Toggles a blinking light and reschedules itself
fn blink_step(ctx: &mut Controller, slot: BlinkSlot) {
    let Some(mut blink) = ctx.blinks[slot as usize] else {
        return;
    };
    blink.lit = !blink.lit;
    blink.handle = ctx.schedule_blink(slot);
    ctx.blinks[slot as usize] = Some(blink);
    ctx.set_light(blink.light, blink.lit);
}

/// Moves long lines on and keeps going while anything overflows
fn scroll_step(ctx: &mut Controller) -> anyhow::Result<()> {
    ctx.scroll = None;
    let now = ctx.now();
    ctx.display.scroll(now);
    ctx.refresh_display();
    Ok(())
}

impl Scheduled for Controller {
    fn scheduler(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl RouterHost for Controller {
    type Action = Command;

    fn router(&mut self) -> &mut InputRouter<Command> {
        &mut self.router
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("scheduler", &self.scheduler)
            .field("router", &self.router)
            .field("navigation", &self.navigation.active())
            .field("blink", &self.blinking())
            .field("recording", &self.recorder.recording())
            .finish()
    }
}
