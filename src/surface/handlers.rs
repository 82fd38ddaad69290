//! Routing table of the keyboard and its handlers
//!
//! Messages are routed first by message class and then by control number.
//! Transport buttons, the arrows and save double as chord modifiers; bank
//! buttons, encoders and the wheel are chord targets.

use std::rc::Rc;

use super::commands::{Command, Direction};
use super::controller::Controller;
use super::controls::*;
use super::pages::ControlsTarget;
use super::recorder;
use crate::input::{
    ControlId, Dispatcher, InputEvent, LockChange, LongPress, MacroSlot, MessageClass, Modifiers,
    VALUE_OFF, detect_long_press, ignore_release,
};

/// Top-level table, keyed by message class
pub type SurfaceRoutes = Dispatcher<InputEvent, Option<MessageClass>, Controller>;

type ControlRoutes = Dispatcher<InputEvent, ControlId, Controller>;

/// Keys-port table, keyed by what the message plays
pub type KeysRoutes = Dispatcher<InputEvent, KeysRole, Controller>;

/// What a message from the keys port is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeysRole {
    Pad,
    Key,
    Sustain,
    Other,
}

type HandlerResult = anyhow::Result<()>;

fn by_class(event: &InputEvent) -> Option<MessageClass> {
    event.class()
}

fn by_control(event: &InputEvent) -> ControlId {
    event.control
}

fn by_role(event: &InputEvent) -> KeysRole {
    match event.class() {
        Some(MessageClass::NoteOn | MessageClass::NoteOff)
            if event.channel() == PAD_CHANNEL && PADS.contains(&event.control) =>
        {
            KeysRole::Pad
        }
        Some(MessageClass::NoteOn | MessageClass::NoteOff) => KeysRole::Key,
        Some(MessageClass::ControlChange) if event.control == SUSTAIN_PEDAL => KeysRole::Sustain,
        _ => KeysRole::Other,
    }
}

/// Pads are consumed; keys and the pedal pass through to the host
pub fn keys_routes() -> KeysRoutes {
    Dispatcher::new("keys", by_role).register(KeysRole::Pad, on_pad)
}

/// Lets the recorder see key notes and the sustain pedal on their way past
pub fn observe_keys(ctx: &mut Controller, event: &InputEvent) {
    match by_role(event) {
        KeysRole::Key => {
            let velocity = match event.class() {
                Some(MessageClass::NoteOn) => event.value,
                _ => VALUE_OFF,
            };
            recorder::capture_note(ctx, event.control, velocity);
        }
        KeysRole::Sustain => ctx.recorder_mut().set_sustain(event.value >= 64),
        KeysRole::Pad | KeysRole::Other => {}
    }
}

fn on_pad(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let pressed = event.class() == Some(MessageClass::NoteOn) && event.is_pressed();
    if pressed {
        recorder::pad_pressed(ctx, event.control, event.value)
    } else {
        recorder::pad_released(ctx, event.control)
    }
}

/// Builds the full two-level routing table
pub fn routes() -> SurfaceRoutes {
    let buttons = Rc::new(button_routes());
    let released = Rc::clone(&buttons);
    let knobs = Rc::new(knob_routes());

    Dispatcher::new("surface", by_class)
        .register(
            Some(MessageClass::NoteOn),
            move |ctx: &mut Controller, event: &InputEvent| {
                buttons.dispatch(ctx, event);
                Ok(())
            },
        )
        .register(
            Some(MessageClass::NoteOff),
            move |ctx: &mut Controller, event: &InputEvent| {
                // Note off may carry a release velocity
                let release = InputEvent {
                    value: VALUE_OFF,
                    ..*event
                };
                released.dispatch(ctx, &release);
                Ok(())
            },
        )
        .register(
            Some(MessageClass::ControlChange),
            move |ctx: &mut Controller, event: &InputEvent| {
                knobs.dispatch(ctx, event);
                Ok(())
            },
        )
        .register(Some(MessageClass::PitchBend), on_slider)
}

fn button_routes() -> ControlRoutes {
    Dispatcher::new("buttons", by_control)
        .register(TRANSPORT_REWIND, |ctx: &mut Controller, event: &InputEvent| {
            continuous_move(ctx, event, Direction::Backward)
        })
        .register(TRANSPORT_FORWARD, |ctx: &mut Controller, event: &InputEvent| {
            continuous_move(ctx, event, Direction::Forward)
        })
        .register(TRANSPORT_STOP, on_stop)
        .register(TRANSPORT_PLAY, on_play)
        .register(TRANSPORT_RECORD, on_record)
        .register(TRANSPORT_LOOP, on_loop)
        .register(GLOBAL_SAVE, on_save)
        .register_filtered(GLOBAL_PUNCH_IN, on_punch_in, ignore_release)
        .register_filtered(GLOBAL_PUNCH_OUT, on_punch_out, ignore_release)
        .register_filtered(GLOBAL_METRO, on_metronome, ignore_release)
        .register(GLOBAL_UNDO, on_undo)
        .register_many_filtered(TRACK_SOLO, on_track_solo, ignore_release)
        .register_many_filtered(TRACK_MUTE, on_track_mute, ignore_release)
        .register_many(TRACK_RECORD, on_track_record)
        .register_filtered(TRACK_READ, on_track_read, ignore_release)
        .register_filtered(TRACK_WRITE, on_track_write, ignore_release)
        .register(NAV_LEFT, on_nav_left)
        .register(NAV_RIGHT, on_nav_right)
        .register_filtered(NAV_KNOB_PRESS, on_nav_knob_press, ignore_release)
        .register(BANK_NEXT, on_bank_next)
        .register(BANK_PREVIOUS, on_bank_previous)
        .register_filtered(LIVE_PART_1, on_live_part_1, ignore_release)
        .register_filtered(LIVE_PART_2, on_live_part_2, ignore_release)
        .register_many_filtered(BANK_SELECT, on_bank_select, ignore_release)
}

fn knob_routes() -> ControlRoutes {
    Dispatcher::new("knobs", by_control)
        .register_many(ENCODERS, on_encoder)
        .register(NAV_WHEEL, on_nav_wheel)
}

// Modifier buttons

/// Press holds the modifier; an uncommitted release runs `on_release`
fn modifier_button(
    ctx: &mut Controller,
    event: &InputEvent,
    modifier: Modifiers,
    on_release: Command,
) -> HandlerResult {
    if event.is_pressed() {
        ctx.router_mut().press_modifier(modifier);
        return Ok(());
    }
    if ctx.router_mut().release_modifier(modifier) {
        ctx.perform(&on_release, 0)?;
    }
    Ok(())
}

fn on_stop(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    if event.is_pressed() {
        recorder::stop_pads(ctx);
    }
    modifier_button(ctx, event, Modifiers::STOP, Command::Stop)
}

fn on_play(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    modifier_button(ctx, event, Modifiers::PLAY, Command::Play)
}

fn on_record(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    modifier_button(ctx, event, Modifiers::RECORD, Command::Record)
}

fn on_loop(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    modifier_button(ctx, event, Modifiers::LOOP, Command::ToggleLoopRecording)
}

fn on_save(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    modifier_button(ctx, event, Modifiers::SAVE, Command::ToggleSongMode)
}

// Transport and global buttons

fn continuous_move(ctx: &mut Controller, event: &InputEvent, direction: Direction) -> HandlerResult {
    ctx.perform(&Command::ContinuousMove(direction), i32::from(event.is_pressed()))
}

fn on_punch_in(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::PunchIn, 0)?;
    ctx.set_light(Light::GlobalIn, true);
    Ok(())
}

fn on_punch_out(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::PunchOut, 0)?;
    ctx.set_light(Light::GlobalIn, false);
    Ok(())
}

fn on_metronome(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::Metronome, 0)
}

fn on_undo(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let delay = ctx.settings().long_press_ms;
    detect_long_press(ctx, event, LongPress::new(delay, undo_short, undo_long))
}

fn undo_short(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::Undo, 0)
}

fn undo_long(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::ClearChannelPattern, 0)?;
    ctx.show_hint("CLEARED ACTIVE", "CHANNEL PATTERN");
    Ok(())
}

// Track buttons

fn playlist_target(ctx: &Controller) -> bool {
    ctx.input().held() == Modifiers::SAVE
        || ctx.navigation().active() == super::navigation::NavigationMode::PlaylistTrack
}

fn on_track_solo(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    if playlist_target(ctx) {
        ctx.router_mut().commit();
        ctx.perform(&Command::SoloPlaylistTrack, 0)?;
        ctx.show_hint("Solo Playlist", "Current track");
        return Ok(());
    }
    let track = event.control - TRACK_SOLO.start;
    ctx.perform(&Command::SoloChannel, i32::from(track))
}

fn on_track_mute(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    if playlist_target(ctx) {
        ctx.router_mut().commit();
        ctx.perform(&Command::MutePlaylistTrack, 0)?;
        ctx.show_hint("Mute Playlist", "Current track");
        return Ok(());
    }
    let track = event.control - TRACK_MUTE.start;
    ctx.perform(&Command::MuteChannel, i32::from(track))
}

fn on_track_record(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let delay = ctx.settings().long_press_ms;
    detect_long_press(ctx, event, LongPress::new(delay, new_pattern, clone_pattern))
}

fn new_pattern(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let track = event.control - TRACK_RECORD.start;
    ctx.perform(&Command::NewEmptyPattern, i32::from(track))
}

fn clone_pattern(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let track = event.control - TRACK_RECORD.start;
    ctx.perform(&Command::ClonePattern, i32::from(track))
}

fn change_playlist_track(ctx: &mut Controller, delta: i32) -> HandlerResult {
    ctx.router_mut().commit();
    ctx.perform(&Command::SelectPlaylistTrack, delta)?;
    ctx.show_hint("Playlist Track", &format!("{delta:+}"));
    Ok(())
}

fn on_track_read(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    if ctx.input().held() == Modifiers::SAVE {
        return change_playlist_track(ctx, -1);
    }
    ctx.perform(&Command::PreviousPattern, 0)
}

fn on_track_write(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    if ctx.input().held() == Modifiers::SAVE {
        return change_playlist_track(ctx, 1);
    }
    ctx.perform(&Command::NextPattern, 0)
}

// Navigation

struct Arrow {
    own: Modifiers,
    other: Modifiers,
    save_toggle: Command,
    short: fn(&mut Controller, &InputEvent) -> HandlerResult,
    long: fn(&mut Controller, &InputEvent) -> HandlerResult,
}

/// Shared behavior of both arrows
///
/// Pressed together the arrows mean escape; with save held they toggle a
/// window. Otherwise the arrow is a modifier whose own short press cycles
/// navigation modes and whose long press toggles a window.
fn nav_arrow(ctx: &mut Controller, event: &InputEvent, arrow: Arrow) -> HandlerResult {
    if event.is_pressed() {
        let held = ctx.input().held();
        if held.intersects(arrow.other) {
            ctx.router_mut().commit();
            return ctx.perform(&Command::Escape, 0);
        }
        if held == Modifiers::SAVE {
            ctx.router_mut().commit();
            ctx.perform(&arrow.save_toggle, 0)?;
            ctx.show_hint(&arrow.save_toggle.doc(), "Toggled");
            return Ok(());
        }
        ctx.router_mut().press_modifier(arrow.own);
    } else {
        ctx.router_mut().release_modifier(arrow.own);
    }

    if ctx.settings().navigation_buttons_toggle_windows {
        let delay = ctx.settings().navigation_long_press_ms;
        return detect_long_press(ctx, event, LongPress::new(delay, arrow.short, arrow.long).guarded());
    }
    if !event.is_pressed() && !ctx.input().is_committed() {
        return (arrow.short)(ctx, event);
    }
    Ok(())
}

fn on_nav_left(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    nav_arrow(
        ctx,
        event,
        Arrow {
            own: Modifiers::LEFT,
            other: Modifiers::RIGHT,
            save_toggle: Command::TogglePianoRoll,
            short: previous_mode,
            long: toggle_channel_rack,
        },
    )
}

fn on_nav_right(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    nav_arrow(
        ctx,
        event,
        Arrow {
            own: Modifiers::RIGHT,
            other: Modifiers::LEFT,
            save_toggle: Command::TogglePlaylist,
            short: next_mode,
            long: toggle_mixer,
        },
    )
}

fn show_mode(ctx: &mut Controller, line2: &str) {
    let mode = ctx.navigation().active();
    let duration = ctx.settings().navigation_display_ms;
    ctx.show_page(mode.name(), line2, duration);
}

fn previous_mode(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.navigation_mut().previous();
    show_mode(ctx, "");
    Ok(())
}

fn next_mode(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.navigation_mut().next();
    show_mode(ctx, "");
    Ok(())
}

fn toggle_channel_rack(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::ToggleChannelRack, 0)?;
    ctx.show_hint("Channel Rack", "Toggled");
    Ok(())
}

fn toggle_mixer(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::ToggleMixer, 0)?;
    ctx.show_hint("Mixer Panel", "Toggled");
    Ok(())
}

fn on_nav_knob_press(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    match ctx.router_mut().lock_held() {
        LockChange::Locked(mask) => {
            let (line1, line2) = if mask == Modifiers::LOOP {
                ("Entering", "Move Mode")
            } else if mask == Modifiers::RECORD {
                ("Entering", "H. Scroll Mode")
            } else {
                ("Locking", "Modifier Button")
            };
            ctx.show_hint(line1, line2);
            if let Some(light) = Light::for_modifiers(mask) {
                ctx.start_blink(light);
            }
            Ok(())
        }
        LockChange::Unlocked => {
            ctx.stop_blink();
            ctx.show_hint("Exiting mode", "");
            Ok(())
        }
        LockChange::Idle => {
            let command = ctx.navigation().active().press_command();
            ctx.perform(&command, 0)?;
            show_mode(ctx, &command.doc());
            Ok(())
        }
    }
}

fn on_nav_wheel(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let delta = event.relative_delta();
    if ctx.input().held() == Modifiers::SAVE {
        return change_playlist_track(ctx, delta);
    }
    if let Some(resolution) = ctx.router_mut().chord(MacroSlot::NavWheel) {
        return ctx.run_chord(resolution, delta);
    }

    let command = ctx.navigation().active().turn_command();
    ctx.perform(&command, delta)?;
    show_mode(ctx, &format!("{delta:+}"));
    Ok(())
}

// Banks and encoders

fn on_bank_next(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let delay = ctx.settings().long_press_ms;
    detect_long_press(ctx, event, LongPress::new(delay, next_page, on_live_part_1))
}

fn on_bank_previous(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let delay = ctx.settings().long_press_ms;
    detect_long_press(ctx, event, LongPress::new(delay, previous_page, on_live_part_2))
}

fn next_page(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::NextControlsPage, 0)
}

fn previous_page(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::PreviousControlsPage, 0)
}

fn on_live_part_1(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::ToggleKnobMode, 0)
}

fn on_live_part_2(ctx: &mut Controller, _: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::ToggleCurrentMode, 0)
}

/// Chords get the mixer channel under the button; so does a plain press
/// unless the encoders drive a plugin
fn on_bank_select(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let bank = event.control - BANK_SELECT.start;
    let channel = ctx.pages().bank_channel(bank);
    if let Some(resolution) = ctx.router_mut().chord(MacroSlot::Bank(bank)) {
        return ctx.run_chord(resolution, i32::from(channel));
    }
    let value = match ctx.pages().target() {
        ControlsTarget::Mixer => channel,
        ControlsTarget::Plugin => bank,
    };
    ctx.perform(&Command::SelectBank, i32::from(value))
}

fn on_encoder(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    let encoder = event.control - ENCODERS.start;
    let delta = event.relative_delta();
    ctx.router_mut().commit();
    if let Some(resolution) = ctx.router_mut().chord(MacroSlot::Encoder(encoder)) {
        return ctx.run_chord(resolution, delta);
    }

    let value = ctx.router_mut().adjust_knob(event.control, delta);
    ctx.perform(&Command::Knob(encoder), value)
}

fn on_slider(ctx: &mut Controller, event: &InputEvent) -> HandlerResult {
    ctx.perform(&Command::Slider(event.channel()), i32::from(event.value))
}
