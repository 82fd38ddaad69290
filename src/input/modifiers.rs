//! Modifier button bitmask

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Set of held (or locked) modifier buttons
    ///
    /// Modifiers combine by bitwise OR into one composite chord key; no
    /// modifier takes precedence over another.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
    pub struct Modifiers: u8 {
        const LOOP = 1;
        const RECORD = 2;
        const PLAY = 4;
        const STOP = 8;
        const LEFT = 16;
        const RIGHT = 32;
        const SAVE = 64;
    }
}

impl Modifiers {
    /// The modifier that turns a chord into a help request
    pub const HELP: Self = Self::SAVE;

    const NAMES: [(&'static str, Modifiers); 7] = [
        ("loop", Self::LOOP),
        ("record", Self::RECORD),
        ("play", Self::PLAY),
        ("stop", Self::STOP),
        ("left", Self::LEFT),
        ("right", Self::RIGHT),
        ("save", Self::SAVE),
    ];

    /// Looks up a single modifier by its lowercase name
    ///
    /// `rec` and `help` are accepted as aliases.
    pub fn from_label(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "rec" => return Some(Self::RECORD),
            "help" => return Some(Self::HELP),
            _ => {}
        }
        Self::NAMES
            .iter()
            .find(|(label, _)| *label == name)
            .map(|(_, flag)| *flag)
    }

    /// Whether the help modifier is part of this mask
    pub fn is_help(self) -> bool {
        self.contains(Self::HELP)
    }

    /// The mask with the help modifier removed
    pub fn without_help(self) -> Self {
        self.difference(Self::HELP)
    }

    /// Lowercase names joined with `+`, or `none`
    pub fn label(self) -> String {
        if self.is_empty() {
            return "none".to_string();
        }
        Self::NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_match_controller_layout() {
        assert_eq!(Modifiers::LOOP.bits(), 1);
        assert_eq!(Modifiers::RECORD.bits(), 2);
        assert_eq!(Modifiers::PLAY.bits(), 4);
        assert_eq!(Modifiers::STOP.bits(), 8);
        assert_eq!(Modifiers::LEFT.bits(), 16);
        assert_eq!(Modifiers::RIGHT.bits(), 32);
        assert_eq!(Modifiers::SAVE.bits(), 64);
    }

    #[test]
    fn test_help_bit_is_stripped() {
        let mask = Modifiers::LOOP | Modifiers::HELP;
        assert!(mask.is_help());
        assert_eq!(mask.without_help(), Modifiers::LOOP);
        assert!(!Modifiers::LOOP.is_help());
    }

    #[test]
    fn test_labels() {
        assert_eq!(Modifiers::empty().label(), "none");
        assert_eq!((Modifiers::STOP | Modifiers::LOOP).to_string(), "loop+stop");
        assert_eq!(Modifiers::from_label("Rec"), Some(Modifiers::RECORD));
        assert_eq!(Modifiers::from_label("right"), Some(Modifiers::RIGHT));
        assert_eq!(Modifiers::from_label("shift"), None);
    }
}
