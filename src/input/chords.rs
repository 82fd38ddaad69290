//! Chord table: (modifier mask, macro slot) to bound action

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::modifiers::Modifiers;

/// Number of bank-select buttons usable as chord targets
pub const BANK_SLOTS: u8 = 8;

/// Number of encoders usable as chord targets
pub const ENCODER_SLOTS: u8 = 9;

/// Errors building a binding from its textual form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("unknown modifier `{0}`")]
    UnknownModifier(String),

    #[error("invalid macro slot `{0}` (expected bank:1-8, encoder:1-9 or wheel)")]
    InvalidSlot(String),

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("binding for {slot} needs at least one modifier")]
    MissingModifier { slot: MacroSlot },
}

/// Secondary control completing a chord
///
/// Bank and encoder indices are zero-based internally and one-based in text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MacroSlot {
    Bank(u8),
    Encoder(u8),
    NavWheel,
}

impl MacroSlot {
    /// Every slot in display order
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BANK_SLOTS)
            .map(Self::Bank)
            .chain(std::iter::once(Self::NavWheel))
            .chain((0..ENCODER_SLOTS).map(Self::Encoder))
    }
}

impl fmt::Display for MacroSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bank(index) => write!(f, "bank:{}", index + 1),
            Self::Encoder(index) => write!(f, "encoder:{}", index + 1),
            Self::NavWheel => f.write_str("wheel"),
        }
    }
}

impl FromStr for MacroSlot {
    type Err = BindingError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || BindingError::InvalidSlot(text.to_string());
        let trimmed = text.trim().to_ascii_lowercase();
        if trimmed == "wheel" {
            return Ok(Self::NavWheel);
        }

        let (kind, index) = trimmed.split_once(':').ok_or_else(invalid)?;
        let index: u8 = index.trim().parse().map_err(|_| invalid())?;
        let (slot, limit) = match kind.trim() {
            "bank" => (Self::Bank(index.wrapping_sub(1)), BANK_SLOTS),
            "encoder" => (Self::Encoder(index.wrapping_sub(1)), ENCODER_SLOTS),
            _ => return Err(invalid()),
        };
        if index == 0 || index > limit {
            return Err(invalid());
        }
        Ok(slot)
    }
}

/// Parses a list of modifier names into one mask
pub fn parse_modifiers<S: AsRef<str>>(names: &[S]) -> Result<Modifiers, BindingError> {
    names.iter().try_fold(Modifiers::empty(), |mask, name| {
        let name = name.as_ref();
        Modifiers::from_label(name)
            .map(|flag| mask | flag)
            .ok_or_else(|| BindingError::UnknownModifier(name.to_string()))
    })
}

/// Lookup key of the chord table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChordKey {
    pub modifiers: Modifiers,
    pub slot: MacroSlot,
}

/// A bound action and the short text shown for it
#[derive(Debug, Clone, PartialEq)]
pub struct Binding<A> {
    pub action: A,
    pub doc: String,
}

/// Result of resolving a chord
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<A> {
    /// Run the bound action
    Execute(Binding<A>),
    /// Help modifier was held; show the binding's doc without running it
    Help(Binding<A>),
    /// Nothing bound for the exact mask
    Unbound,
}

/// Read-mostly mapping from chords to bound actions
#[derive(Debug, Clone)]
pub struct ChordTable<A> {
    bindings: BTreeMap<ChordKey, Binding<A>>,
}

impl<A: Clone> ChordTable<A> {
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Binds an action, returning whatever was bound there before
    pub fn bind(
        &mut self,
        modifiers: Modifiers,
        slot: MacroSlot,
        action: A,
        doc: impl Into<String>,
    ) -> Option<Binding<A>> {
        self.bindings.insert(
            ChordKey { modifiers, slot },
            Binding {
                action,
                doc: doc.into(),
            },
        )
    }

    /// Removes a binding
    pub fn unbind(&mut self, modifiers: Modifiers, slot: MacroSlot) -> Option<Binding<A>> {
        self.bindings.remove(&ChordKey { modifiers, slot })
    }

    /// Exact lookup, no help handling
    pub fn get(&self, modifiers: Modifiers, slot: MacroSlot) -> Option<&Binding<A>> {
        self.bindings.get(&ChordKey { modifiers, slot })
    }

    /// Resolves a chord for the full active mask
    ///
    /// The help bit is stripped first and only the entry for the exact
    /// remaining mask is considered; there is no fallback to subsets.
    pub fn resolve(&self, active: Modifiers, slot: MacroSlot) -> Resolution<A> {
        match self.get(active.without_help(), slot) {
            None => Resolution::Unbound,
            Some(binding) if active.is_help() => Resolution::Help(binding.clone()),
            Some(binding) => Resolution::Execute(binding.clone()),
        }
    }

    /// All bindings ordered by modifiers, then slot
    pub fn iter(&self) -> impl Iterator<Item = (&ChordKey, &Binding<A>)> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<A: Clone> Default for ChordTable<A> {
    fn default() -> Self {
        Self::new()
    }
}
