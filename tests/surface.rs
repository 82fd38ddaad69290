//! End-to-end tests of the control surface through its host entry points

use std::rc::Rc;

use keylab_router::input::InputEvent;
use keylab_router::runtime::{Clock, ManualClock};
use keylab_router::surface::controls::{
    BANK_SELECT, ENCODERS, GLOBAL_SAVE, NAV_WHEEL, TRACK_MUTE, TRACK_RECORD, TRANSPORT_LOOP,
    TRANSPORT_RECORD, TRANSPORT_STOP,
};
use keylab_router::surface::{
    Command, CommandLog, FeedbackLog, Surface, SurfaceSettings, TimeUnit, Workstation,
    default_chords,
};

struct Rig {
    clock: ManualClock,
    commands: CommandLog,
    feedback: FeedbackLog,
    surface: Surface,
}

fn rig() -> Rig {
    let clock = ManualClock::new();
    let shared: Rc<dyn Clock> = Rc::new(clock.clone());
    let commands = CommandLog::new(Rc::clone(&shared));
    let feedback = FeedbackLog::new(Rc::clone(&shared));
    let surface = Surface::new(
        SurfaceSettings::default(),
        default_chords(),
        shared,
        Box::new(commands.clone()),
        Box::new(feedback.clone()),
    );
    Rig {
        clock,
        commands,
        feedback,
        surface,
    }
}

impl Rig {
    fn at(&mut self, ms: u64) -> &mut Self {
        self.clock.set(ms);
        self
    }

    fn press(&mut self, control: u8) -> &mut Self {
        assert!(self.surface.on_message(&InputEvent::press(control)));
        self
    }

    fn release(&mut self, control: u8) -> &mut Self {
        assert!(self.surface.on_message(&InputEvent::release(control)));
        self
    }

    fn idle(&mut self) -> &mut Self {
        self.surface.on_idle();
        self
    }

    fn timeline(&self) -> Vec<(u64, Command)> {
        self.commands
            .entries()
            .into_iter()
            .map(|entry| (entry.at_ms, entry.command))
            .collect()
    }
}

#[test]
fn test_rec_hold_clones_pattern_at_deadline() {
    let mut rig = rig();
    let rec = TRACK_RECORD.start;
    rig.at(0).press(rec);
    rig.at(449).idle();
    rig.at(450).idle();
    rig.at(900).release(rec).idle();

    assert_eq!(rig.timeline(), vec![(450, Command::ClonePattern)]);
}

#[test]
fn test_rec_tap_creates_pattern_and_cancels_hold() {
    let mut rig = rig();
    let rec = TRACK_RECORD.start;
    rig.at(0).press(rec);
    rig.at(100).idle();
    rig.at(200).release(rec);
    rig.at(450).idle();
    rig.at(5_000).idle();

    assert_eq!(rig.timeline(), vec![(200, Command::NewEmptyPattern)]);
    assert_eq!(rig.surface.controller().pending_tasks(), 0);
}

#[test]
fn test_independent_long_presses() {
    let mut rig = rig();
    let first = TRACK_RECORD.start;
    let second = TRACK_RECORD.start + 1;
    rig.at(0).press(first);
    rig.at(100).press(second);
    rig.at(300).release(second);
    rig.at(450).idle();

    let entries = rig.commands.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!((entries[0].at_ms, &entries[0].command, entries[0].value), (300, &Command::NewEmptyPattern, 1));
    assert_eq!((entries[1].at_ms, &entries[1].command, entries[1].value), (450, &Command::ClonePattern, 0));
}

#[test]
fn test_combined_modifiers_look_up_combined_chord() {
    let mut rig = rig();
    // Loop alone binds undo on bank 1, stop alone binds deselect all;
    // loop+stop has no binding of its own.
    rig.press(TRANSPORT_LOOP).press(TRANSPORT_STOP);
    rig.press(BANK_SELECT.start).release(BANK_SELECT.start);
    rig.release(TRANSPORT_STOP).release(TRANSPORT_LOOP);

    assert!(rig.commands.commands().is_empty());
}

#[test]
fn test_record_chord_scrubs_with_encoder_delta() {
    let mut rig = rig();
    rig.press(TRANSPORT_RECORD);
    rig.surface
        .on_message(&InputEvent::control_change(ENCODERS.start + 6, 126));
    rig.release(TRANSPORT_RECORD);

    let entries = rig.commands.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].command, Command::ScrubTime(TimeUnit::QuarterBar));
    assert_eq!(entries[0].value, -62);
    assert_eq!(rig.feedback.lines().0, "[Macro]");
}

#[test]
fn test_save_plus_mute_targets_playlist_track() {
    let mut rig = rig();
    rig.press(GLOBAL_SAVE).press(TRACK_MUTE.start + 2).release(TRACK_MUTE.start + 2);
    rig.release(GLOBAL_SAVE);

    assert_eq!(rig.commands.commands(), vec![Command::MutePlaylistTrack]);
}

#[test]
fn test_failing_workstation_keeps_surface_alive() {
    struct Flaky {
        log: CommandLog,
    }

    impl Workstation for Flaky {
        fn perform(&mut self, command: &Command, value: i32) -> anyhow::Result<()> {
            if *command == Command::Play {
                anyhow::bail!("transport offline");
            }
            self.log.perform(command, value)
        }
    }

    let clock = ManualClock::new();
    let shared: Rc<dyn Clock> = Rc::new(clock.clone());
    let log = CommandLog::new(Rc::clone(&shared));
    let mut surface = Surface::new(
        SurfaceSettings::default(),
        default_chords(),
        Rc::clone(&shared),
        Box::new(Flaky { log: log.clone() }),
        Box::new(FeedbackLog::new(shared)),
    );

    assert!(surface.on_message(&InputEvent::press(94)));
    assert!(surface.on_message(&InputEvent::release(94)));
    assert!(surface.on_message(&InputEvent::control_change(NAV_WHEEL, 2)));
    assert_eq!(log.commands(), vec![Command::SelectChannel]);
}

#[test]
fn test_tick_reports_consumption() {
    let mut rig = rig();
    let report = rig.surface.on_tick(&[
        InputEvent::press(TRANSPORT_STOP),
        InputEvent::release(TRANSPORT_STOP),
        InputEvent::new(0xD0, 40, 0),
    ]);
    assert_eq!(report.consumed, 2);
    assert_eq!(report.unconsumed, 1);
    assert_eq!(rig.commands.commands(), vec![Command::Stop]);
}

#[test]
fn test_replayed_pad_pattern_loops_until_stop() {
    use keylab_router::app::{AppConfig, Replay, Script};

    let script = Script::parse(
        "0     keys 0x99 40 100   # hold pad 5\n\
         1000  idle               # recording starts\n\
         1100  keys 0x89 40 0\n\
         1200  keys 0x90 62 90\n\
         1300  keys 0x80 62 0\n\
         1400  keys 0x99 40 100   # tap ends the capture\n\
         1450  keys 0x89 40 0\n\
         2000  keys 0xB0 64 127   # sustain down\n\
         2000  keys 0x99 40 100   # looped playback\n\
         2010  keys 0x89 40 0\n\
         2100  idle\n\
         2600  idle\n\
         2700  idle\n\
         2800  0x90 93 127\n\
         2800  0x90 93 0\n\
         6000  idle\n",
    )
    .unwrap();

    let mut replay = Replay::new(&AppConfig::builtin("test")).unwrap();
    let outcome = replay.run(&script);
    let timeline: Vec<(u64, Command, i32)> = outcome
        .commands
        .into_iter()
        .map(|entry| (entry.at_ms, entry.command, entry.value))
        .collect();

    assert_eq!(
        timeline,
        vec![
            (0, Command::PlayNote(40), 100),
            (2000, Command::PlayNote(62), 90),
            (2100, Command::PlayNote(62), 0),
            (2600, Command::PlayNote(62), 90),
            (2700, Command::PlayNote(62), 0),
            (2800, Command::Stop, 0),
        ]
    );
    assert_eq!(outcome.consumed, 8);
    assert_eq!(outcome.unconsumed, 3);
    assert_eq!(replay.surface().controller().pending_tasks(), 0);
}

#[test]
fn test_encoder_pages_move_bank_channels() {
    let mut rig = rig();
    rig.surface
        .controller_mut()
        .perform(&Command::PreviousControlsPage, 0)
        .unwrap();
    assert_eq!(rig.feedback.lines(), ("Controlling".to_string(), "Tracks 121 - 128".to_string()));

    rig.press(BANK_SELECT.start + 7);
    let entries = rig.commands.entries();
    assert_eq!(entries.last().map(|entry| (&entry.command, entry.value)), Some((&Command::SelectBank, 127)));
}

#[test]
fn test_simple_command_names_parse_from_public_table() {
    use keylab_router::surface::SIMPLE_COMMANDS;

    assert!(!SIMPLE_COMMANDS.is_empty());
    for (name, command) in SIMPLE_COMMANDS {
        assert_eq!(name.parse::<Command>().ok().as_ref(), Some(command), "{name}");
    }
}
