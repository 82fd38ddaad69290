//! Default chord bindings and user overrides

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::commands::{Command, TimeUnit};
use crate::input::{BindingError, ChordTable, MacroSlot, Modifiers, parse_modifiers};

/// One user-supplied binding, as written in the config file
///
/// ```toml
/// [[macros.overrides]]
/// modifiers = ["loop"]
/// slot = "bank:1"
/// command = "redo"
/// ```
///
/// `command = "noop"` removes the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroOverride {
    pub modifiers: Vec<String>,
    pub slot: String,
    pub command: String,
}

/// Binds `command` unless it is [`Command::Noop`], which leaves the chord unbound
pub fn bind_command(table: &mut ChordTable<Command>, modifiers: Modifiers, slot: MacroSlot, command: Command) {
    if command == Command::Noop {
        table.unbind(modifiers, slot);
        return;
    }
    let doc = command.doc().into_owned();
    table.bind(modifiers, slot, command, doc);
}

fn bank_row(table: &mut ChordTable<Command>, modifiers: Modifiers, commands: [Command; 8]) {
    for (index, command) in (0u8..).zip(commands) {
        bind_command(table, modifiers, MacroSlot::Bank(index), command);
    }
}

fn encoder_row(table: &mut ChordTable<Command>, modifiers: Modifiers, commands: Vec<Command>) {
    for (index, command) in (0u8..).zip(commands) {
        bind_command(table, modifiers, MacroSlot::Encoder(index), command);
    }
}

/// Built-in chord layout: one transport or arrow modifier plus a bank
/// button, the wheel or an encoder
pub fn default_chords() -> ChordTable<Command> {
    use Command::*;
    use TimeUnit::*;

    let mut table = ChordTable::new();

    let loop_ = Modifiers::LOOP;
    bank_row(
        &mut table,
        loop_,
        [
            Undo,
            Redo,
            TogglePlaylist,
            ToggleChannelRack,
            TogglePianoRoll,
            ToggleMixer,
            ToggleBrowser,
            TogglePlugin,
        ],
    );
    bind_command(&mut table, loop_, MacroSlot::NavWheel, HorizontalZoom);
    encoder_row(
        &mut table,
        loop_,
        vec![
            Scaled { factor: 1, inner: Box::new(StripJog) },
            Scaled { factor: 2, inner: Box::new(StripJog) },
            Scaled { factor: 4, inner: Box::new(StripJog) },
            ScrubVertical,
        ],
    );

    let record = Modifiers::RECORD;
    bank_row(
        &mut table,
        record,
        [
            CloseAllPlugins,
            CycleActiveWindow,
            NameNextEmptyPattern,
            RenameAndColor,
            ClonePattern,
            Enter,
            Escape,
            DeleteSelected,
        ],
    );
    bind_command(&mut table, record, MacroSlot::NavWheel, ScrubTime(QuarterBar));
    encoder_row(
        &mut table,
        record,
        [Tick, SixteenthStep, EighthStep, QuarterStep, HalfStep, EighthBar, QuarterBar, HalfBar, Bar]
            .into_iter()
            .map(ScrubTime)
            .collect(),
    );

    let play = Modifiers::PLAY;
    bank_row(
        &mut table,
        play,
        [
            RewindToStart,
            MutePlaylistTrack,
            PlaylistTrackPrevious,
            PlaylistTrackNext,
            Duplicate,
            QuickLegato,
            QuickQuantize,
            QuickQuantizeStartTimes,
        ],
    );
    bind_command(&mut table, play, MacroSlot::NavWheel, VerticalZoom);

    let stop = Modifiers::STOP;
    bank_row(
        &mut table,
        stop,
        [
            DeselectAll,
            AddTimeMarker,
            StepBackBar,
            StepForwardBar,
            JumpPreviousMarker,
            JumpNextMarker,
            SelectPreviousMarker,
            SelectNextMarker,
        ],
    );
    bind_command(&mut table, stop, MacroSlot::NavWheel, Jog);
    encoder_row(
        &mut table,
        stop,
        vec![
            Repeated(Box::new(ScrubHorizontal)),
            Repeated(Box::new(ScrubVertical)),
        ],
    );

    let right = Modifiers::RIGHT;
    bank_row(&mut table, right, std::array::from_fn(|_| OpenMixerPlugin));
    bind_command(&mut table, right, MacroSlot::NavWheel, MixerWindowJog);
    encoder_row(
        &mut table,
        right,
        [SixteenthStep, EighthStep, HalfStep, QuarterStep, Step, EighthBar, HalfBar, QuarterBar, EighthBar]
            .into_iter()
            .map(ScrubSelectionEnd)
            .collect(),
    );

    let left = Modifiers::LEFT;
    bank_row(
        &mut table,
        left,
        [
            ChannelRackUp,
            ChannelRackDown,
            MuteCurrentChannel,
            CloneChannel,
            SelectSource,
            Cut,
            Copy,
            Paste,
        ],
    );
    bind_command(&mut table, left, MacroSlot::NavWheel, WindowJog);
    encoder_row(
        &mut table,
        left,
        [SixteenthStep, EighthStep, HalfStep, QuarterStep, Step, EighthBar, QuarterBar, HalfBar, Bar]
            .into_iter()
            .map(ScrubSelectionStart)
            .collect(),
    );

    table
}

/// Parses one override into its chord and command
pub fn parse_override(entry: &MacroOverride) -> Result<(Modifiers, MacroSlot, Command), BindingError> {
    let slot: MacroSlot = entry.slot.parse()?;
    let modifiers = parse_modifiers(&entry.modifiers)?;
    if modifiers.without_help().is_empty() {
        return Err(BindingError::MissingModifier { slot });
    }
    let command = entry.command.parse()?;
    Ok((modifiers, slot, command))
}

/// Applies overrides in order; later entries win over earlier ones
///
/// Stops at the first invalid entry, leaving earlier ones applied.
pub fn apply_overrides(table: &mut ChordTable<Command>, overrides: &[MacroOverride]) -> Result<usize, BindingError> {
    for entry in overrides {
        let (modifiers, slot, command) = parse_override(entry)?;
        debug!(%modifiers, %slot, %command, "macro override");
        bind_command(table, modifiers, slot, command);
    }
    Ok(overrides.len())
}
