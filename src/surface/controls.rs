//! Control numbers and indicator lights of the keyboard

use std::ops::Range;

use crate::input::{ControlId, Modifiers};

// Buttons, sent as note on/off
pub const TRACK_RECORD: Range<ControlId> = 0..8;
pub const TRACK_SOLO: Range<ControlId> = 8..16;
pub const TRACK_MUTE: Range<ControlId> = 16..24;
pub const BANK_SELECT: Range<ControlId> = 24..32;
pub const LIVE_PART_2: ControlId = 46;
pub const LIVE_PART_1: ControlId = 47;
pub const BANK_PREVIOUS: ControlId = 48;
pub const BANK_NEXT: ControlId = 49;
pub const TRACK_READ: ControlId = 74;
pub const TRACK_WRITE: ControlId = 75;
pub const GLOBAL_SAVE: ControlId = 80;
pub const GLOBAL_UNDO: ControlId = 81;
pub const NAV_KNOB_PRESS: ControlId = 84;
pub const TRANSPORT_LOOP: ControlId = 86;
pub const GLOBAL_PUNCH_IN: ControlId = 87;
pub const GLOBAL_PUNCH_OUT: ControlId = 88;
pub const GLOBAL_METRO: ControlId = 89;
pub const TRANSPORT_REWIND: ControlId = 91;
pub const TRANSPORT_FORWARD: ControlId = 92;
pub const TRANSPORT_STOP: ControlId = 93;
pub const TRANSPORT_PLAY: ControlId = 94;
pub const TRANSPORT_RECORD: ControlId = 95;
pub const NAV_LEFT: ControlId = 98;
pub const NAV_RIGHT: ControlId = 99;

// Knobs, sent as control change
pub const ENCODERS: Range<ControlId> = 16..25;
pub const NAV_WHEEL: ControlId = 60;

// Keys port: drum pads on their own channel, keys and pedal on any other
pub const PAD_CHANNEL: u8 = 9;
pub const PADS: Range<ControlId> = 36..52;
pub const SUSTAIN_PEDAL: ControlId = 64;

/// Modifier bit carried by a button, if it is a modifier
pub fn modifier_for(control: ControlId) -> Option<Modifiers> {
    let modifier = match control {
        TRANSPORT_LOOP => Modifiers::LOOP,
        TRANSPORT_RECORD => Modifiers::RECORD,
        TRANSPORT_PLAY => Modifiers::PLAY,
        TRANSPORT_STOP => Modifiers::STOP,
        NAV_LEFT => Modifiers::LEFT,
        NAV_RIGHT => Modifiers::RIGHT,
        GLOBAL_SAVE => Modifiers::SAVE,
        _ => return None,
    };
    Some(modifier)
}

/// Button lights addressable on the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Light {
    NavigationLeft,
    NavigationRight,
    TrackSolo,
    TrackMute,
    TrackRecord,
    GlobalSave,
    GlobalIn,
    GlobalOut,
    GlobalMetro,
    GlobalUndo,
    TransportRewind,
    TransportForward,
    TransportStop,
    TransportPlay,
    TransportRecord,
    TransportLoop,
    /// Drum pad, by zero-based index
    Pad(u8),
}

impl Light {
    /// Device-side light id
    pub fn id(self) -> u8 {
        match self {
            Self::NavigationLeft => 26,
            Self::NavigationRight => 27,
            Self::TrackSolo => 96,
            Self::TrackMute => 97,
            Self::TrackRecord => 98,
            Self::GlobalSave => 101,
            Self::GlobalIn => 102,
            Self::GlobalOut => 103,
            Self::GlobalMetro => 104,
            Self::GlobalUndo => 105,
            Self::TransportRewind => 106,
            Self::TransportForward => 107,
            Self::TransportStop => 108,
            Self::TransportPlay => 109,
            Self::TransportRecord => 110,
            Self::TransportLoop => 111,
            Self::Pad(index) => 0x70 + (index & 0x0F),
        }
    }

    /// Light of the drum pad sending `note`
    pub fn for_pad(note: ControlId) -> Option<Self> {
        PADS.contains(&note).then(|| Self::Pad(note - PADS.start))
    }

    /// Light of the first modifier in `mask`, in transport order
    pub fn for_modifiers(mask: Modifiers) -> Option<Self> {
        [
            (Modifiers::LOOP, Self::TransportLoop),
            (Modifiers::RECORD, Self::TransportRecord),
            (Modifiers::PLAY, Self::TransportPlay),
            (Modifiers::STOP, Self::TransportStop),
            (Modifiers::LEFT, Self::NavigationLeft),
            (Modifiers::RIGHT, Self::NavigationRight),
            (Modifiers::SAVE, Self::GlobalSave),
        ]
        .into_iter()
        .find(|(modifier, _)| mask.contains(*modifier))
        .map(|(_, light)| light)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_buttons() {
        assert_eq!(modifier_for(TRANSPORT_RECORD), Some(Modifiers::RECORD));
        assert_eq!(modifier_for(GLOBAL_SAVE), Some(Modifiers::HELP));
        assert_eq!(modifier_for(GLOBAL_UNDO), None);
    }

    #[test]
    fn test_modifier_light_prefers_transport_order() {
        let mask = Modifiers::STOP | Modifiers::RECORD;
        assert_eq!(Light::for_modifiers(mask), Some(Light::TransportRecord));
        assert_eq!(Light::for_modifiers(Modifiers::empty()), None);
        assert_eq!(Light::TransportLoop.id(), 111);
    }

    #[test]
    fn test_pad_lights() {
        assert_eq!(Light::for_pad(PADS.start), Some(Light::Pad(0)));
        assert_eq!(Light::for_pad(51).map(Light::id), Some(0x7F));
        assert_eq!(Light::for_pad(52), None);
    }
}
