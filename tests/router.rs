//! Integration tests for modifier chords and long-press detection

use std::rc::Rc;

use keylab_router::input::{
    ChordTable, InputEvent, InputRouter, LockChange, LongPress, MacroSlot, Modifiers, Resolution,
    RouterHost, detect_long_press,
};
use keylab_router::runtime::{ManualClock, Millis, Scheduled, Scheduler};
use proptest::prelude::*;

const HOLD_MS: Millis = 450;
const REC: u8 = 0;

struct Host {
    scheduler: Scheduler<Host>,
    router: InputRouter<&'static str>,
    effects: Vec<(Millis, &'static str)>,
}

impl Host {
    fn new(clock: &ManualClock, chords: ChordTable<&'static str>) -> Self {
        Self {
            scheduler: Scheduler::new(Rc::new(clock.clone())),
            router: InputRouter::new(chords),
            effects: Vec::new(),
        }
    }

    fn feed(&mut self, event: InputEvent) {
        let press = LongPress::new(HOLD_MS, new_pattern, clone_pattern);
        detect_long_press(self, &event, press).unwrap();
    }

    fn effect_names(&self) -> Vec<&'static str> {
        self.effects.iter().map(|(_, name)| *name).collect()
    }
}

impl Scheduled for Host {
    fn scheduler(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl RouterHost for Host {
    type Action = &'static str;

    fn router(&mut self) -> &mut InputRouter<&'static str> {
        &mut self.router
    }
}

fn new_pattern(host: &mut Host, _: &InputEvent) -> anyhow::Result<()> {
    let now = host.scheduler.now();
    host.effects.push((now, "new empty pattern"));
    Ok(())
}

fn clone_pattern(host: &mut Host, _: &InputEvent) -> anyhow::Result<()> {
    let now = host.scheduler.now();
    host.effects.push((now, "clone pattern"));
    Ok(())
}

#[test]
fn test_rec_held_past_delay_clones_pattern() {
    let clock = ManualClock::new();
    let mut host = Host::new(&clock, ChordTable::new());

    host.feed(InputEvent::press(REC));
    clock.set(450);
    Scheduler::pump(&mut host);
    clock.set(700);
    host.feed(InputEvent::release(REC));
    Scheduler::pump(&mut host);

    assert_eq!(host.effects, vec![(450, "clone pattern")]);
}

#[test]
fn test_rec_released_early_creates_pattern() {
    let clock = ManualClock::new();
    let mut host = Host::new(&clock, ChordTable::new());

    host.feed(InputEvent::press(REC));
    clock.set(200);
    Scheduler::pump(&mut host);
    host.feed(InputEvent::release(REC));
    clock.set(450);
    Scheduler::pump(&mut host);

    assert_eq!(host.effects, vec![(200, "new empty pattern")]);
    assert!(host.scheduler.is_empty());
}

#[test]
fn test_chord_uses_combined_mask_only() {
    let mut chords = ChordTable::new();
    chords.bind(Modifiers::LOOP, MacroSlot::Bank(0), "loop action", "Loop");
    chords.bind(Modifiers::STOP, MacroSlot::Bank(0), "stop action", "Stop");
    chords.bind(Modifiers::LOOP | Modifiers::STOP, MacroSlot::Bank(0), "both", "Both");
    let mut router = InputRouter::new(chords);

    router.press_modifier(Modifiers::LOOP);
    router.press_modifier(Modifiers::STOP);
    match router.chord(MacroSlot::Bank(0)) {
        Some(Resolution::Execute(binding)) => assert_eq!(binding.action, "both"),
        other => panic!("unexpected resolution {other:?}"),
    }

    router.press_modifier(Modifiers::PLAY);
    assert_eq!(
        router.chord(MacroSlot::Bank(0)).map(|r| matches!(r, Resolution::Unbound)),
        Some(true)
    );
}

#[test]
fn test_help_modifier_documents_instead() {
    let mut chords = ChordTable::new();
    chords.bind(Modifiers::RECORD, MacroSlot::Encoder(3), "scrub", "Scrub quarter");
    let mut router = InputRouter::new(chords);

    router.press_modifier(Modifiers::HELP);
    router.press_modifier(Modifiers::RECORD);
    match router.chord(MacroSlot::Encoder(3)) {
        Some(Resolution::Help(binding)) => assert_eq!(binding.doc, "Scrub quarter"),
        other => panic!("unexpected resolution {other:?}"),
    }

    // Help on an unbound chord is inert
    assert!(matches!(router.chord(MacroSlot::NavWheel), Some(Resolution::Unbound)));
}

#[test]
fn test_modifier_release_reports_uncommitted_only() {
    let mut router: InputRouter<&'static str> = InputRouter::new(ChordTable::new());
    router.press_modifier(Modifiers::PLAY);
    assert!(router.release_modifier(Modifiers::PLAY));

    router.press_modifier(Modifiers::PLAY);
    router.chord(MacroSlot::Bank(2));
    assert!(!router.release_modifier(Modifiers::PLAY));
}

#[test]
fn test_lock_cycle() {
    let mut router: InputRouter<&'static str> = InputRouter::new(ChordTable::new());
    assert_eq!(router.lock_held(), LockChange::Idle);

    router.press_modifier(Modifiers::STOP);
    router.press_modifier(Modifiers::RECORD);
    assert_eq!(router.lock_held(), LockChange::Locked(Modifiers::RECORD));
    router.release_modifier(Modifiers::STOP);
    router.release_modifier(Modifiers::RECORD);

    assert_eq!(router.active(), Modifiers::RECORD);
    assert_eq!(router.lock_held(), LockChange::Unlocked);
    assert!(router.active().is_empty());
}

proptest! {
    /// Exactly one of the two effects fires per press/release pair
    #[test]
    fn test_exactly_one_effect_per_press(
        release_at in 1u64..1_000,
        pumps in prop::collection::vec(0u64..1_000, 0..8),
    ) {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock, ChordTable::new());
        host.feed(InputEvent::press(REC));

        let mut pumps = pumps;
        pumps.retain(|t| *t < release_at);
        pumps.sort();
        for at in &pumps {
            clock.set(*at);
            Scheduler::pump(&mut host);
        }

        clock.set(release_at);
        host.feed(InputEvent::release(REC));
        clock.set(release_at + 2 * HOLD_MS);
        Scheduler::pump(&mut host);

        let names = host.effect_names();
        prop_assert_eq!(names.len(), 1);

        let fired_before_release = pumps.iter().any(|t| *t >= HOLD_MS);
        let expected = if fired_before_release { "clone pattern" } else { "new empty pattern" };
        prop_assert_eq!(names[0], expected);
    }
}
