//! Raw controller events

use std::fmt;

use thiserror::Error;

/// Identifies a physical control (button, encoder, slider) within its message class
pub type ControlId = u8;

/// Values at or above this raw value are pressed / full scale
pub const VALUE_ON: u8 = 127;

/// Raw value sent on release
pub const VALUE_OFF: u8 = 0;

/// Midpoint of the 7-bit value range used by relative encoders
const RELATIVE_MIDPOINT: i32 = 64;

/// Coarse message class, taken from the upper nibble of the status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageClass {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    System,
}

impl MessageClass {
    /// Classifies a status byte. Data bytes (high bit clear) have no class.
    pub fn from_status(status: u8) -> Option<Self> {
        let class = match status & 0xF0 {
            0x80 => Self::NoteOff,
            0x90 => Self::NoteOn,
            0xA0 => Self::PolyPressure,
            0xB0 => Self::ControlChange,
            0xC0 => Self::ProgramChange,
            0xD0 => Self::ChannelPressure,
            0xE0 => Self::PitchBend,
            0xF0 => Self::System,
            _ => return None,
        };
        Some(class)
    }

    /// Number of data bytes following the status byte
    pub fn data_len(self) -> usize {
        match self {
            Self::ProgramChange | Self::ChannelPressure => 1,
            Self::System => 0,
            _ => 2,
        }
    }
}

/// Errors decoding a raw message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("empty message")]
    Empty,

    #[error("byte {0:#04x} is not a status byte")]
    NotAStatusByte(u8),

    #[error("status {status:#04x} needs {expected} data bytes, got {got}")]
    Truncated {
        status: u8,
        expected: usize,
        got: usize,
    },

    #[error("data byte {0:#04x} has the high bit set")]
    DataOutOfRange(u8),
}

/// One input event as delivered by the host
///
/// `value` is zero on release and the magnitude otherwise, matching how
/// the keyboard reports buttons (note on/off with velocity 127/0), encoders
/// (relative offsets around 64) and faders (absolute 0..=127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEvent {
    pub status: u8,
    pub control: ControlId,
    pub value: u8,
}

impl InputEvent {
    pub fn new(status: u8, control: ControlId, value: u8) -> Self {
        Self {
            status,
            control,
            value,
        }
    }

    /// Button press on MIDI channel 1
    pub fn press(control: ControlId) -> Self {
        Self::new(0x90, control, VALUE_ON)
    }

    /// Button release on MIDI channel 1
    pub fn release(control: ControlId) -> Self {
        Self::new(0x90, control, VALUE_OFF)
    }

    /// Control change on MIDI channel 1
    pub fn control_change(control: ControlId, value: u8) -> Self {
        Self::new(0xB0, control, value)
    }

    /// Pitch-bend style fader move; the channel selects the fader
    pub fn fader(channel: u8, value: u8) -> Self {
        Self::new(0xE0 | (channel & 0x0F), 0, value)
    }

    /// Decodes a single channel message from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EventError> {
        let (&status, data) = bytes.split_first().ok_or(EventError::Empty)?;
        let class = MessageClass::from_status(status).ok_or(EventError::NotAStatusByte(status))?;

        let expected = class.data_len();
        if data.len() < expected {
            return Err(EventError::Truncated {
                status,
                expected,
                got: data.len(),
            });
        }
        if let Some(&byte) = data.iter().take(expected).find(|&&b| b & 0x80 != 0) {
            return Err(EventError::DataOutOfRange(byte));
        }

        let control = data.first().copied().unwrap_or(0);
        let value = if expected >= 2 { data[1] } else { 0 };
        Ok(Self::new(status, control, value))
    }

    /// Message class of this event, if the status byte is valid
    pub fn class(&self) -> Option<MessageClass> {
        MessageClass::from_status(self.status)
    }

    /// Zero-based MIDI channel
    pub fn channel(&self) -> u8 {
        self.status & 0x0F
    }

    /// Whether this is a press (non-zero value) rather than a release
    pub fn is_pressed(&self) -> bool {
        self.value != VALUE_OFF
    }

    /// Signed delta of a relative encoder turn
    pub fn relative_delta(&self) -> i32 {
        fold_relative(self.value)
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[status={:#04x} control={:3} value={:3}]",
            self.status, self.control, self.value
        )
    }
}

/// Decodes a relative encoder value
///
/// Values below the midpoint are positive steps. Anything above wraps into a
/// negative step (65 is -1, 127 is -63); it is never clamped.
pub fn fold_relative(raw: u8) -> i32 {
    let raw = i32::from(raw);
    if raw < RELATIVE_MIDPOINT {
        raw
    } else {
        RELATIVE_MIDPOINT - raw
    }
}

/// Dispatch filter that only lets presses through
pub fn ignore_release(event: &InputEvent) -> bool {
    event.is_pressed()
}
