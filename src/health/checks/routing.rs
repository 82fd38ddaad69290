//! Input routing health check

use std::rc::Rc;

use crate::health::check::{CheckResult, SystemCheck};
use crate::input::InputEvent;
use crate::runtime::{Clock, ManualClock};
use crate::surface::controls::{PAD_CHANNEL, PADS, TRACK_RECORD, TRANSPORT_PLAY};
use crate::surface::{Command, CommandLog, FeedbackLog, Surface, SurfaceSettings, default_chords};

/// Messages the surface took versus left for the host
#[derive(Debug, Default)]
struct Tally {
    consumed: usize,
    passed_on: usize,
}

impl Tally {
    fn note(&mut self, consumed: bool) -> bool {
        if consumed {
            self.consumed += 1;
        } else {
            self.passed_on += 1;
        }
        consumed
    }
}

/// Checks that the surface routes known messages and tells taps from holds
pub struct RoutingCheck {
    settings: SurfaceSettings,
}

impl RoutingCheck {
    pub fn new() -> Self {
        Self {
            settings: SurfaceSettings::default(),
        }
    }

    /// Runs the check with the given timings
    pub fn with_settings(settings: SurfaceSettings) -> Self {
        Self { settings }
    }
}

impl Default for RoutingCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for RoutingCheck {
    fn name(&self) -> &'static str {
        "Input Routing"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates button and keys routing and long-press detection end to end")
    }

    fn check(&self) -> CheckResult {
        let mut details = Vec::new();
        let clock = ManualClock::new();
        let shared: Rc<dyn Clock> = Rc::new(clock.clone());
        let commands = CommandLog::new(Rc::clone(&shared));
        let mut surface = Surface::new(
            self.settings.clone(),
            default_chords(),
            Rc::clone(&shared),
            Box::new(commands.clone()),
            Box::new(FeedbackLog::new(shared)),
        );

        let mut tally = Tally::default();

        let play = tally.note(surface.on_message(&InputEvent::press(TRANSPORT_PLAY)))
            & tally.note(surface.on_message(&InputEvent::release(TRANSPORT_PLAY)));
        if !play || commands.commands() != [Command::Play] {
            details.push("  ✗ Play button not routed".to_string());
            return CheckResult::fail("Button routing broken").with_details(details.join("\n"));
        }
        details.push("  ✓ Button messages consumed".to_string());

        if tally.note(surface.on_message(&InputEvent::new(0xC0, 1, 0))) {
            details.push("  ✗ Program change was consumed".to_string());
            return CheckResult::fail("Unknown messages consumed").with_details(details.join("\n"));
        }
        details.push("  ✓ Unknown message classes passed on".to_string());

        commands.clear();
        let pad = InputEvent::new(0x90 | PAD_CHANNEL, PADS.start, 100);
        let pad_taken = tally.note(surface.on_keys_message(&pad))
            & tally.note(surface.on_keys_message(&InputEvent { value: 0, ..pad }));
        let key_taken = tally.note(surface.on_keys_message(&InputEvent::new(0x90, 60, 100)));
        if !pad_taken || key_taken || commands.commands() != [Command::PlayNote(PADS.start)] {
            details.push(format!("  ✗ Keys port produced {:?}", commands.commands()));
            return CheckResult::fail("Keys routing broken").with_details(details.join("\n"));
        }
        details.push("  ✓ Pads consumed, keys passed to the host".to_string());

        commands.clear();
        let hold = self.settings.long_press_ms;
        let track = TRACK_RECORD.start;
        let mut tasks_run = 0;
        tally.note(surface.on_message(&InputEvent::press(track)));
        clock.advance(hold / 2);
        let tick = surface.on_tick(&[InputEvent::release(track)]);
        tally.consumed += tick.consumed;
        tasks_run += tick.pump.executed;
        tally.note(surface.on_message(&InputEvent::press(track)));
        clock.advance(hold);
        tasks_run += surface.on_idle().executed;
        tally.note(surface.on_message(&InputEvent::release(track)));

        if commands.commands() != [Command::NewEmptyPattern, Command::ClonePattern] {
            details.push(format!("  ✗ Tap then hold produced {:?}", commands.commands()));
            return CheckResult::fail("Long-press detection broken")
                .with_details(details.join("\n"));
        }
        details.push(format!("  ✓ Tap and {hold}ms hold told apart"));

        CheckResult::pass("Routing operational")
            .with_details(details.join("\n"))
            .with_metric("messages_consumed", tally.consumed)
            .with_metric("messages_passed_on", tally.passed_on)
            .with_metric("tasks_run", tasks_run)
    }
}
