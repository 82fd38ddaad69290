//! Navigation wheel modes

use super::commands::Command;

/// What the navigation wheel currently controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationMode {
    Channel,
    Volume,
    Panning,
    Pattern,
    PlaylistTrack,
    TargetMixTrack,
}

impl NavigationMode {
    /// Modes in the order the arrow buttons cycle through them
    pub const ALL: [NavigationMode; 6] = [
        Self::Channel,
        Self::Volume,
        Self::Panning,
        Self::Pattern,
        Self::PlaylistTrack,
        Self::TargetMixTrack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Channel => "Channel",
            Self::Volume => "Volume",
            Self::Panning => "Panning",
            Self::Pattern => "Pattern",
            Self::PlaylistTrack => "Playlist Track",
            Self::TargetMixTrack => "Target Mix Track",
        }
    }

    /// Command performed with the wheel delta
    pub fn turn_command(self) -> Command {
        match self {
            Self::Channel => Command::SelectChannel,
            Self::Volume => Command::ChannelVolume,
            Self::Panning => Command::ChannelPanning,
            Self::Pattern => Command::SelectPattern,
            Self::PlaylistTrack => Command::SelectPlaylistTrack,
            Self::TargetMixTrack => Command::TargetMixTrack,
        }
    }

    /// Command performed when the wheel is pressed
    pub fn press_command(self) -> Command {
        match self {
            Self::Channel => Command::ShowChannelEditor,
            Self::Volume => Command::ResetChannelVolume,
            Self::Panning => Command::ResetChannelPanning,
            Self::Pattern => Command::TogglePianoRoll,
            Self::PlaylistTrack => Command::TogglePlaylist,
            Self::TargetMixTrack => Command::ToggleMixerPlugins,
        }
    }
}

/// Cycling selection over the navigation modes
#[derive(Debug, Clone)]
pub struct Navigation {
    modes: Vec<NavigationMode>,
    active: usize,
}

impl Navigation {
    pub fn new() -> Self {
        Self {
            modes: NavigationMode::ALL.to_vec(),
            active: 0,
        }
    }

    pub fn active(&self) -> NavigationMode {
        self.modes[self.active]
    }

    /// Moves to the next mode, wrapping at the end
    pub fn next(&mut self) -> NavigationMode {
        self.active = (self.active + 1) % self.modes.len();
        self.active()
    }

    /// Moves to the previous mode, wrapping at the start
    pub fn previous(&mut self) -> NavigationMode {
        self.active = self.active.checked_sub(1).unwrap_or(self.modes.len() - 1);
        self.active()
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new()
    }
}
