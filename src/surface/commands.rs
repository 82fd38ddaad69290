//! Workstation command vocabulary
//!
//! Every effect the surface can have on the workstation is a [`Command`]
//! performed with an integer value (a delta, an index or an on/off flag).
//! The surface never talks to the workstation any other way.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::input::BindingError;
use crate::runtime::{Clock, Millis};

/// Time step used by scrub commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeUnit {
    Tick,
    SixteenthStep,
    EighthStep,
    QuarterStep,
    HalfStep,
    Step,
    EighthBar,
    QuarterBar,
    HalfBar,
    Bar,
}

impl TimeUnit {
    const ALL: [(&'static str, TimeUnit); 10] = [
        ("tick", Self::Tick),
        ("sixteenth_step", Self::SixteenthStep),
        ("eighth_step", Self::EighthStep),
        ("quarter_step", Self::QuarterStep),
        ("half_step", Self::HalfStep),
        ("step", Self::Step),
        ("eighth_bar", Self::EighthBar),
        ("quarter_bar", Self::QuarterBar),
        ("half_bar", Self::HalfBar),
        ("bar", Self::Bar),
    ];

    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(_, unit)| *unit == self)
            .map_or("tick", |(name, _)| *name)
    }

    fn short(self) -> &'static str {
        match self {
            Self::Tick => "ticks",
            Self::SixteenthStep => "1/16 step",
            Self::EighthStep => "1/8 step",
            Self::QuarterStep => "1/4 step",
            Self::HalfStep => "1/2 step",
            Self::Step => "steps",
            Self::EighthBar => "1/8 bar",
            Self::QuarterBar => "1/4 bar",
            Self::HalfBar => "1/2 bar",
            Self::Bar => "bars",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = BindingError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, unit)| *unit)
            .ok_or_else(|| BindingError::UnknownCommand(text.to_string()))
    }
}

/// Direction of a continuous transport move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Backward,
    Forward,
}

/// An operation on the workstation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    // Transport
    Play,
    Stop,
    Record,
    ToggleLoopRecording,
    ToggleSongMode,
    /// Value 1 starts moving, 0 stops
    ContinuousMove(Direction),
    PunchIn,
    PunchOut,
    Metronome,
    RewindToStart,

    // Windows
    TogglePlaylist,
    ToggleChannelRack,
    TogglePianoRoll,
    ToggleMixer,
    ToggleBrowser,
    TogglePlugin,
    CloseAllPlugins,
    CycleActiveWindow,
    Escape,
    Enter,

    // Editing
    Undo,
    Redo,
    Cut,
    Copy,
    Paste,
    DeleteSelected,
    Duplicate,
    DeselectAll,
    QuickLegato,
    QuickQuantize,
    QuickQuantizeStartTimes,

    // Patterns and channels
    NewEmptyPattern,
    NameNextEmptyPattern,
    ClonePattern,
    ClearChannelPattern,
    RenameAndColor,
    PreviousPattern,
    NextPattern,
    SelectPattern,
    CloneChannel,
    SelectSource,
    ChannelRackUp,
    ChannelRackDown,
    SelectChannel,
    SoloChannel,
    MuteChannel,
    MuteCurrentChannel,
    ShowChannelEditor,
    ChannelVolume,
    ResetChannelVolume,
    ChannelPanning,
    ResetChannelPanning,

    // Playlist and mixer
    SelectPlaylistTrack,
    PlaylistTrackPrevious,
    PlaylistTrackNext,
    SoloPlaylistTrack,
    MutePlaylistTrack,
    TargetMixTrack,
    ToggleMixerPlugins,
    OpenMixerPlugin,

    // Time and view
    AddTimeMarker,
    JumpPreviousMarker,
    JumpNextMarker,
    SelectPreviousMarker,
    SelectNextMarker,
    StepBackBar,
    StepForwardBar,
    HorizontalZoom,
    VerticalZoom,
    Jog,
    StripJog,
    WindowJog,
    MixerWindowJog,
    ScrubHorizontal,
    ScrubVertical,
    ScrubTime(TimeUnit),
    ScrubSelectionStart(TimeUnit),
    ScrubSelectionEnd(TimeUnit),

    // Hardware pages
    NextControlsPage,
    PreviousControlsPage,
    ToggleKnobMode,
    ToggleCurrentMode,
    SelectBank,
    /// Absolute knob value; the index is the encoder
    Knob(u8),
    /// Absolute fader value; the index is the fader
    Slider(u8),
    /// Note on the selected channel; the value is the velocity
    PlayNote(u8),

    /// Multiplies the value before running the inner command
    Scaled { factor: i32, inner: Box<Command> },
    /// Runs the inner command once per unit of the value, with value ±1
    Repeated(Box<Command>),
    /// Bound to nothing
    Noop,
}

impl Command {
    /// Short text shown on the 16-character display
    pub fn doc(&self) -> Cow<'static, str> {
        let text = match self {
            Self::Play => "Play",
            Self::Stop => "Stop",
            Self::Record => "Record",
            Self::ToggleLoopRecording => "Loop recording",
            Self::ToggleSongMode => "Song/pattern",
            Self::ContinuousMove(Direction::Backward) => "Rewind",
            Self::ContinuousMove(Direction::Forward) => "Fast forward",
            Self::PunchIn => "Punch in",
            Self::PunchOut => "Punch out",
            Self::Metronome => "Metronome",
            Self::RewindToStart => "Rewind to start",
            Self::TogglePlaylist => "Playlist",
            Self::ToggleChannelRack => "Channel Rack",
            Self::TogglePianoRoll => "Piano Roll",
            Self::ToggleMixer => "Toggle mixer",
            Self::ToggleBrowser => "Toggle browser",
            Self::TogglePlugin => "Toggle plugin",
            Self::CloseAllPlugins => "Close all plugin",
            Self::CycleActiveWindow => "Cycle active win",
            Self::Escape => "Press escape",
            Self::Enter => "Press enter",
            Self::Undo => "Undo",
            Self::Redo => "Redo",
            Self::Cut => "Cut",
            Self::Copy => "Copy",
            Self::Paste => "Paste",
            Self::DeleteSelected => "Delete selected",
            Self::Duplicate => "Duplicate",
            Self::DeselectAll => "Deselect all",
            Self::QuickLegato => "Quick legato",
            Self::QuickQuantize => "Quick quantize",
            Self::QuickQuantizeStartTimes => "Qck quantize start",
            Self::NewEmptyPattern => "New pattern",
            Self::NameNextEmptyPattern => "Next empty pat",
            Self::ClonePattern => "Clone pattern",
            Self::ClearChannelPattern => "Clear pattern",
            Self::RenameAndColor => "Rename & color",
            Self::PreviousPattern => "Prev pattern",
            Self::NextPattern => "Next pattern",
            Self::SelectPattern => "Pattern",
            Self::CloneChannel => "Clone channel",
            Self::SelectSource => "Select source",
            Self::ChannelRackUp => "Channelrack up",
            Self::ChannelRackDown => "Channelrack down",
            Self::SelectChannel => "Channel",
            Self::SoloChannel => "Solo channel",
            Self::MuteChannel => "Mute channel",
            Self::MuteCurrentChannel => "Mute current",
            Self::ShowChannelEditor => "Channel editor",
            Self::ChannelVolume => "Volume",
            Self::ResetChannelVolume => "Reset volume",
            Self::ChannelPanning => "Panning",
            Self::ResetChannelPanning => "Reset panning",
            Self::SelectPlaylistTrack => "Playlist Track",
            Self::PlaylistTrackPrevious => "Prev track",
            Self::PlaylistTrackNext => "Next track",
            Self::SoloPlaylistTrack => "Solo track",
            Self::MutePlaylistTrack => "Mute track",
            Self::TargetMixTrack => "Target Mix Track",
            Self::ToggleMixerPlugins => "Mixer plugins",
            Self::OpenMixerPlugin => "Open mixer plugin",
            Self::AddTimeMarker => "Add marker",
            Self::JumpPreviousMarker => "Prev marker",
            Self::JumpNextMarker => "Next marker",
            Self::SelectPreviousMarker => "Select prev mark",
            Self::SelectNextMarker => "Select next mark",
            Self::StepBackBar => "Back one bar",
            Self::StepForwardBar => "Forward one bar",
            Self::HorizontalZoom => "Horizontal zoom",
            Self::VerticalZoom => "Vertical zoom",
            Self::Jog => "Jog",
            Self::StripJog => "Strip jog",
            Self::WindowJog => "Window jog",
            Self::MixerWindowJog => "Mixer jog",
            Self::ScrubHorizontal => "Scrub horizontal",
            Self::ScrubVertical => "Scrub vertical",
            Self::ScrubTime(unit) => return format!("Scrub {}", unit.short()).into(),
            Self::ScrubSelectionStart(unit) => return format!("Start {}", unit.short()).into(),
            Self::ScrubSelectionEnd(unit) => return format!("End {}", unit.short()).into(),
            Self::NextControlsPage => "Next page",
            Self::PreviousControlsPage => "Prev page",
            Self::ToggleKnobMode => "Knob mode",
            Self::ToggleCurrentMode => "Current mode",
            Self::SelectBank => "Bank select",
            Self::Knob(index) => return format!("Knob {}", index + 1).into(),
            Self::Slider(index) => return format!("Slider {}", index + 1).into(),
            Self::PlayNote(note) => return format!("Note {note}").into(),
            Self::Scaled { inner, .. } | Self::Repeated(inner) => return inner.doc(),
            Self::Noop => "Not assigned",
        };
        Cow::Borrowed(text)
    }

    /// Runs the command on `workstation`, unfolding combinators
    pub fn run(&self, workstation: &mut dyn Workstation, value: i32) -> anyhow::Result<()> {
        match self {
            Self::Noop => Ok(()),
            Self::Scaled { factor, inner } => inner.run(workstation, value.saturating_mul(*factor)),
            Self::Repeated(inner) => {
                let step = value.signum();
                for _ in 0..value.unsigned_abs() {
                    inner.run(workstation, step)?;
                }
                Ok(())
            }
            command => workstation.perform(command, value),
        }
    }

    /// Parseable name of a command without payload
    fn simple_name(&self) -> Option<&'static str> {
        SIMPLE_COMMANDS
            .iter()
            .find(|(_, command)| command == self)
            .map(|(name, _)| *name)
    }
}

/// Names accepted for commands without payload
pub const SIMPLE_COMMANDS: &[(&str, Command)] = &[
    ("play", Command::Play),
    ("stop", Command::Stop),
    ("record", Command::Record),
    ("toggle_loop_recording", Command::ToggleLoopRecording),
    ("toggle_song_mode", Command::ToggleSongMode),
    ("rewind", Command::ContinuousMove(Direction::Backward)),
    ("fast_forward", Command::ContinuousMove(Direction::Forward)),
    ("punch_in", Command::PunchIn),
    ("punch_out", Command::PunchOut),
    ("metronome", Command::Metronome),
    ("rewind_to_start", Command::RewindToStart),
    ("toggle_playlist", Command::TogglePlaylist),
    ("toggle_channel_rack", Command::ToggleChannelRack),
    ("toggle_piano_roll", Command::TogglePianoRoll),
    ("toggle_mixer", Command::ToggleMixer),
    ("toggle_browser", Command::ToggleBrowser),
    ("toggle_plugin", Command::TogglePlugin),
    ("close_all_plugins", Command::CloseAllPlugins),
    ("cycle_active_window", Command::CycleActiveWindow),
    ("escape", Command::Escape),
    ("enter", Command::Enter),
    ("undo", Command::Undo),
    ("redo", Command::Redo),
    ("cut", Command::Cut),
    ("copy", Command::Copy),
    ("paste", Command::Paste),
    ("delete_selected", Command::DeleteSelected),
    ("duplicate", Command::Duplicate),
    ("deselect_all", Command::DeselectAll),
    ("quick_legato", Command::QuickLegato),
    ("quick_quantize", Command::QuickQuantize),
    ("quick_quantize_start_times", Command::QuickQuantizeStartTimes),
    ("new_empty_pattern", Command::NewEmptyPattern),
    ("name_next_empty_pattern", Command::NameNextEmptyPattern),
    ("clone_pattern", Command::ClonePattern),
    ("clear_channel_pattern", Command::ClearChannelPattern),
    ("rename_and_color", Command::RenameAndColor),
    ("previous_pattern", Command::PreviousPattern),
    ("next_pattern", Command::NextPattern),
    ("select_pattern", Command::SelectPattern),
    ("clone_channel", Command::CloneChannel),
    ("select_source", Command::SelectSource),
    ("channel_rack_up", Command::ChannelRackUp),
    ("channel_rack_down", Command::ChannelRackDown),
    ("select_channel", Command::SelectChannel),
    ("solo_channel", Command::SoloChannel),
    ("mute_channel", Command::MuteChannel),
    ("mute_current_channel", Command::MuteCurrentChannel),
    ("show_channel_editor", Command::ShowChannelEditor),
    ("channel_volume", Command::ChannelVolume),
    ("reset_channel_volume", Command::ResetChannelVolume),
    ("channel_panning", Command::ChannelPanning),
    ("reset_channel_panning", Command::ResetChannelPanning),
    ("select_playlist_track", Command::SelectPlaylistTrack),
    ("playlist_track_previous", Command::PlaylistTrackPrevious),
    ("playlist_track_next", Command::PlaylistTrackNext),
    ("solo_playlist_track", Command::SoloPlaylistTrack),
    ("mute_playlist_track", Command::MutePlaylistTrack),
    ("target_mix_track", Command::TargetMixTrack),
    ("toggle_mixer_plugins", Command::ToggleMixerPlugins),
    ("open_mixer_plugin", Command::OpenMixerPlugin),
    ("add_time_marker", Command::AddTimeMarker),
    ("jump_previous_marker", Command::JumpPreviousMarker),
    ("jump_next_marker", Command::JumpNextMarker),
    ("select_previous_marker", Command::SelectPreviousMarker),
    ("select_next_marker", Command::SelectNextMarker),
    ("step_back_bar", Command::StepBackBar),
    ("step_forward_bar", Command::StepForwardBar),
    ("horizontal_zoom", Command::HorizontalZoom),
    ("vertical_zoom", Command::VerticalZoom),
    ("jog", Command::Jog),
    ("strip_jog", Command::StripJog),
    ("window_jog", Command::WindowJog),
    ("mixer_window_jog", Command::MixerWindowJog),
    ("scrub_horizontal", Command::ScrubHorizontal),
    ("scrub_vertical", Command::ScrubVertical),
    ("next_controls_page", Command::NextControlsPage),
    ("previous_controls_page", Command::PreviousControlsPage),
    ("toggle_knob_mode", Command::ToggleKnobMode),
    ("toggle_current_mode", Command::ToggleCurrentMode),
    ("select_bank", Command::SelectBank),
    ("noop", Command::Noop),
];

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.simple_name() {
            return f.write_str(name);
        }
        match self {
            Self::ScrubTime(unit) => write!(f, "scrub_time:{}", unit.name()),
            Self::ScrubSelectionStart(unit) => write!(f, "selection_start:{}", unit.name()),
            Self::ScrubSelectionEnd(unit) => write!(f, "selection_end:{}", unit.name()),
            Self::Knob(index) => write!(f, "knob:{}", index + 1),
            Self::Slider(index) => write!(f, "slider:{}", index + 1),
            Self::PlayNote(note) => write!(f, "note:{note}"),
            Self::Scaled { factor, inner } => write!(f, "scaled:{factor}:{inner}"),
            Self::Repeated(inner) => write!(f, "repeated:{inner}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl FromStr for Command {
    type Err = BindingError;

    /// Parses names like `undo`, `scrub_time:quarter_bar`, `scaled:2:strip_jog`
    /// or `repeated:scrub_vertical`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let unknown = || BindingError::UnknownCommand(text.to_string());

        if let Some((_, command)) = SIMPLE_COMMANDS.iter().find(|(name, _)| *name == text) {
            return Ok(command.clone());
        }

        let (head, rest) = text.split_once(':').ok_or_else(unknown)?;
        match head {
            "scrub_time" => Ok(Self::ScrubTime(rest.parse()?)),
            "selection_start" => Ok(Self::ScrubSelectionStart(rest.parse()?)),
            "selection_end" => Ok(Self::ScrubSelectionEnd(rest.parse()?)),
            "repeated" => Ok(Self::Repeated(Box::new(rest.parse()?))),
            "note" => match rest.parse::<u8>() {
                Ok(note) if note < 0x80 => Ok(Self::PlayNote(note)),
                _ => Err(unknown()),
            },
            "scaled" => {
                let (factor, inner) = rest.split_once(':').ok_or_else(unknown)?;
                let factor = factor.parse().map_err(|_| unknown())?;
                Ok(Self::Scaled {
                    factor,
                    inner: Box::new(inner.parse()?),
                })
            }
            _ => Err(unknown()),
        }
    }
}

/// The application the surface controls
pub trait Workstation {
    /// Performs one primitive command. Combinators are unfolded before this is called.
    fn perform(&mut self, command: &Command, value: i32) -> anyhow::Result<()>;
}

/// One command as seen by a [`CommandLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Performed {
    pub at_ms: Millis,
    pub command: Command,
    pub value: i32,
}

/// In-memory workstation that records what it was asked to do
///
/// Clones share the same record, so one copy can be handed to the surface
/// while another is inspected.
#[derive(Clone)]
pub struct CommandLog {
    clock: Rc<dyn Clock>,
    entries: Rc<RefCell<Vec<Performed>>>,
}

impl CommandLog {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Everything performed so far, oldest first
    pub fn entries(&self) -> Vec<Performed> {
        self.entries.borrow().clone()
    }

    /// Just the commands, oldest first
    pub fn commands(&self) -> Vec<Command> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.command.clone())
            .collect()
    }

    /// Number of times `command` was performed
    pub fn count(&self, command: &Command) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| &entry.command == command)
            .count()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl Workstation for CommandLog {
    fn perform(&mut self, command: &Command, value: i32) -> anyhow::Result<()> {
        self.entries.borrow_mut().push(Performed {
            at_ms: self.clock.now_ms(),
            command: command.clone(),
            value,
        });
        Ok(())
    }
}

impl fmt::Debug for CommandLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandLog")
            .field("entries", &self.entries.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;

    fn log() -> (ManualClock, CommandLog) {
        let clock = ManualClock::new();
        let log = CommandLog::new(Rc::new(clock.clone()));
        (clock, log)
    }

    #[test]
    fn test_scaled_multiplies_value() {
        let (_, log) = log();
        let command = Command::Scaled {
            factor: 4,
            inner: Box::new(Command::StripJog),
        };
        command.run(&mut log.clone(), -2).unwrap();
        assert_eq!(log.entries()[0].value, -8);
        assert_eq!(command.doc(), "Strip jog");
    }

    #[test]
    fn test_repeated_runs_unit_steps() {
        let (_, log) = log();
        let command = Command::Repeated(Box::new(Command::ScrubVertical));
        command.run(&mut log.clone(), -3).unwrap();
        let values: Vec<i32> = log.entries().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![-1, -1, -1]);
    }

    #[test]
    fn test_noop_performs_nothing() {
        let (_, log) = log();
        Command::Noop.run(&mut log.clone(), 1).unwrap();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_log_timestamps_with_clock() {
        let (clock, log) = log();
        clock.advance(450);
        Command::ClonePattern.run(&mut log.clone(), 0).unwrap();
        assert_eq!(log.entries()[0].at_ms, 450);
        assert_eq!(log.count(&Command::ClonePattern), 1);
    }

    #[test]
    fn test_parse_and_display_agree() {
        for text in [
            "undo",
            "scrub_time:quarter_bar",
            "selection_end:eighth_step",
            "scaled:2:strip_jog",
            "repeated:scrub_horizontal",
            "note:36",
        ] {
            let command: Command = text.parse().unwrap();
            assert_eq!(command.to_string(), text);
        }
        assert_eq!(
            "teleport".parse::<Command>(),
            Err(BindingError::UnknownCommand("teleport".to_string()))
        );
        assert!("note:200".parse::<Command>().is_err());
    }

    #[test]
    fn test_docs_fit_display() {
        for (_, command) in SIMPLE_COMMANDS {
            assert!(command.doc().len() <= 18, "{command} doc too long");
        }
        assert_eq!(Command::ScrubTime(TimeUnit::QuarterBar).doc(), "Scrub 1/4 bar");
    }
}
