//! Which mixer tracks or plugin channel the encoders address

use super::commands::Command;

/// Pages per target before wrapping around
pub const PAGE_COUNT: u8 = 16;

/// Bank buttons per mixer page
const BANK_WIDTH: u8 = 8;

/// What the encoders and bank buttons control
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlsTarget {
    #[default]
    Mixer,
    Plugin,
}

impl ControlsTarget {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mixer => "Mixer Panel",
            Self::Plugin => "Channel Plugin",
        }
    }
}

/// Page position of the encoder section, one page per target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPages {
    target: ControlsTarget,
    mixer_page: u8,
    plugin_page: u8,
}

impl ControlPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(&self) -> ControlsTarget {
        self.target
    }

    pub fn mixer_page(&self) -> u8 {
        self.mixer_page
    }

    pub fn plugin_page(&self) -> u8 {
        self.plugin_page
    }

    /// Channel a bank button addresses on the current mixer page
    pub fn bank_channel(&self, bank: u8) -> u8 {
        bank + BANK_WIDTH * self.mixer_page
    }

    /// Tracks a page command; returns the hint to show if the page changed
    pub fn follow(&mut self, command: &Command) -> Option<(String, String)> {
        match command {
            Command::NextControlsPage => self.step(1),
            Command::PreviousControlsPage => self.step(PAGE_COUNT - 1),
            Command::ToggleCurrentMode => {
                self.target = match self.target {
                    ControlsTarget::Mixer => ControlsTarget::Plugin,
                    ControlsTarget::Plugin => ControlsTarget::Mixer,
                };
                return Some(("Controlling".to_string(), self.target.name().to_string()));
            }
            _ => return None,
        }
        Some(self.page_hint())
    }

    fn step(&mut self, by: u8) {
        let page = match self.target {
            ControlsTarget::Mixer => &mut self.mixer_page,
            ControlsTarget::Plugin => &mut self.plugin_page,
        };
        *page = (*page + by) % PAGE_COUNT;
    }

    fn page_hint(&self) -> (String, String) {
        match self.target {
            ControlsTarget::Mixer => {
                let first = u32::from(self.mixer_page) * u32::from(BANK_WIDTH) + 1;
                let last = first + u32::from(BANK_WIDTH) - 1;
                ("Controlling".to_string(), format!("Tracks {first} - {last}"))
            }
            ControlsTarget::Plugin => (
                "Setting MIDI Ch".to_string(),
                format!("To: {:2}", self.plugin_page + 1),
            ),
        }
    }
}
