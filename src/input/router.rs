//! Modifier, chord and long-press bookkeeping
//!
//! The router owns all per-surface input state. It never runs actions
//! itself; handlers ask it questions ("is a modifier active?", "what is
//! bound to this chord?") and act on the answers.

use std::collections::HashMap;

use tracing::debug;

use super::chords::{ChordTable, MacroSlot, Resolution};
use super::events::ControlId;
use super::modifiers::Modifiers;
use crate::runtime::TaskHandle;

/// Range of an absolute knob value accumulated from relative turns
const KNOB_RANGE: std::ops::RangeInclusive<i32> = 0..=127;

/// What pressing the lock control did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockChange {
    /// The given modifiers are now locked
    Locked(Modifiers),
    /// A previous lock was released
    Unlocked,
    /// Nothing held and nothing locked; the press is free for other uses
    Idle,
}

/// Input state for one control surface
#[derive(Debug)]
pub struct InputRouter<A> {
    held: Modifiers,
    locked: Modifiers,
    committed: bool,
    pending: HashMap<ControlId, TaskHandle>,
    knob_values: HashMap<ControlId, i32>,
    chords: ChordTable<A>,
}

impl<A: Clone> InputRouter<A> {
    pub fn new(chords: ChordTable<A>) -> Self {
        Self {
            held: Modifiers::empty(),
            locked: Modifiers::empty(),
            committed: false,
            pending: HashMap::new(),
            knob_values: HashMap::new(),
            chords,
        }
    }

    /// Modifiers physically held right now
    pub fn held(&self) -> Modifiers {
        self.held
    }

    /// Modifiers latched by the lock control
    pub fn locked(&self) -> Modifiers {
        self.locked
    }

    /// Mask used for chord lookups: held plus locked
    pub fn active(&self) -> Modifiers {
        self.held | self.locked
    }

    /// Whether the current press already produced a visible effect
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Marks the current press as having produced its effect
    pub fn commit(&mut self) {
        self.committed = true;
    }

    /// Records a modifier press and starts a fresh press cycle
    pub fn press_modifier(&mut self, modifier: Modifiers) {
        self.held |= modifier;
        self.committed = false;
    }

    /// Records a modifier release
    ///
    /// Returns `true` when nothing was committed while it was held, meaning
    /// the modifier's own release behavior should run.
    pub fn release_modifier(&mut self, modifier: Modifiers) -> bool {
        self.held.remove(modifier);
        !self.committed
    }

    /// Resolves a chord against the active mask
    ///
    /// Returns `None` when no modifier is active, so the caller falls back to
    /// the control's plain behavior. Otherwise the press counts as committed
    /// even when nothing is bound: holding a modifier and touching a chord
    /// target never reaches the plain behavior.
    pub fn chord(&mut self, slot: MacroSlot) -> Option<Resolution<A>> {
        let active = self.active();
        if active.is_empty() {
            return None;
        }

        self.committed = true;
        let resolution = self.chords.resolve(active, slot);
        if matches!(resolution, Resolution::Unbound) {
            debug!(modifiers = %active, %slot, "no chord bound");
        }
        Some(resolution)
    }

    /// Toggles the modifier lock from the currently held modifiers
    ///
    /// Loop and record lock on their own even when combined with others.
    /// Pressing with nothing held clears any lock.
    pub fn lock_held(&mut self) -> LockChange {
        self.committed = true;
        let was_locked = !self.locked.is_empty();

        self.locked = if self.held.contains(Modifiers::LOOP) {
            Modifiers::LOOP
        } else if self.held.contains(Modifiers::RECORD) {
            Modifiers::RECORD
        } else {
            self.held
        };

        match (self.locked.is_empty(), was_locked) {
            (false, _) => LockChange::Locked(self.locked),
            (true, true) => LockChange::Unlocked,
            (true, false) => LockChange::Idle,
        }
    }

    /// Remembers the pending long-press task for `control`
    ///
    /// Returns the handle it replaced, if any, which the caller must cancel.
    pub fn track_long_press(&mut self, control: ControlId, handle: TaskHandle) -> Option<TaskHandle> {
        self.pending.insert(control, handle)
    }

    /// Forgets and returns the pending long-press task for `control`
    pub fn take_long_press(&mut self, control: ControlId) -> Option<TaskHandle> {
        self.pending.remove(&control)
    }

    /// Whether `control` is between press and long-press resolution
    pub fn is_long_press_pending(&self, control: ControlId) -> bool {
        self.pending.contains_key(&control)
    }

    /// Number of controls awaiting long-press resolution
    pub fn pending_long_presses(&self) -> usize {
        self.pending.len()
    }

    /// Absolute value of a knob accumulated from relative turns
    pub fn knob_value(&self, control: ControlId) -> i32 {
        self.knob_values.get(&control).copied().unwrap_or(0)
    }

    /// Applies a relative turn to a knob and returns the clamped result
    pub fn adjust_knob(&mut self, control: ControlId, delta: i32) -> i32 {
        let value = self.knob_values.entry(control).or_insert(0);
        *value = (*value + delta).clamp(*KNOB_RANGE.start(), *KNOB_RANGE.end());
        *value
    }

    pub fn chords(&self) -> &ChordTable<A> {
        &self.chords
    }

    pub fn chords_mut(&mut self) -> &mut ChordTable<A> {
        &mut self.chords
    }

    /// Returns to idle: no modifiers held or locked, nothing committed
    ///
    /// Pending long-press handles are handed back so the caller can cancel
    /// them on its scheduler.
    pub fn reset(&mut self) -> Vec<TaskHandle> {
        self.held = Modifiers::empty();
        self.locked = Modifiers::empty();
        self.committed = false;
        self.pending.drain().map(|(_, handle)| handle).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> InputRouter<&'static str> {
        let mut chords = ChordTable::new();
        chords.bind(Modifiers::LOOP, MacroSlot::Bank(0), "undo", "Undo");
        chords.bind(Modifiers::STOP, MacroSlot::NavWheel, "jog", "Jog");
        InputRouter::new(chords)
    }

    #[test]
    fn test_release_without_chord_runs_own_behavior() {
        let mut router = router();
        router.press_modifier(Modifiers::LOOP);
        assert!(router.release_modifier(Modifiers::LOOP));
        assert!(router.held().is_empty());
    }

    #[test]
    fn test_chord_commits_and_suppresses_release() {
        let mut router = router();
        router.press_modifier(Modifiers::LOOP);
        let resolution = router.chord(MacroSlot::Bank(0));
        assert!(matches!(resolution, Some(Resolution::Execute(ref b)) if b.action == "undo"));
        assert!(!router.release_modifier(Modifiers::LOOP));
    }

    #[test]
    fn test_unbound_chord_still_commits() {
        let mut router = router();
        router.press_modifier(Modifiers::PLAY);
        assert_eq!(router.chord(MacroSlot::Bank(3)), Some(Resolution::Unbound));
        assert!(router.is_committed());
    }

    #[test]
    fn test_chord_without_modifiers_falls_through() {
        let mut router = router();
        assert_eq!(router.chord(MacroSlot::Bank(0)), None);
        assert!(!router.is_committed());
    }

    #[test]
    fn test_new_press_resets_committed() {
        let mut router = router();
        router.press_modifier(Modifiers::LOOP);
        router.chord(MacroSlot::Bank(0));
        router.release_modifier(Modifiers::LOOP);
        router.press_modifier(Modifiers::LOOP);
        assert!(!router.is_committed());
    }

    #[test]
    fn test_lock_prefers_loop_then_record() {
        let mut router = router();
        router.press_modifier(Modifiers::RECORD);
        router.press_modifier(Modifiers::LOOP);
        assert_eq!(router.lock_held(), LockChange::Locked(Modifiers::LOOP));
        router.release_modifier(Modifiers::LOOP);
        router.release_modifier(Modifiers::RECORD);

        assert_eq!(router.active(), Modifiers::LOOP);
        assert_eq!(router.lock_held(), LockChange::Unlocked);
        assert_eq!(router.lock_held(), LockChange::Idle);
    }

    #[test]
    fn test_locked_mask_joins_chord_lookup() {
        let mut router = router();
        router.press_modifier(Modifiers::STOP);
        assert_eq!(router.lock_held(), LockChange::Locked(Modifiers::STOP));
        router.release_modifier(Modifiers::STOP);

        let resolution = router.chord(MacroSlot::NavWheel);
        assert!(matches!(resolution, Some(Resolution::Execute(ref b)) if b.action == "jog"));

        // Locked and held combine into one exact key
        router.press_modifier(Modifiers::PLAY);
        assert_eq!(router.chord(MacroSlot::NavWheel), Some(Resolution::Unbound));
    }

    #[test]
    fn test_knob_arena_clamps() {
        let mut router = router();
        assert_eq!(router.adjust_knob(16, 10), 10);
        assert_eq!(router.adjust_knob(16, -63), 0);
        assert_eq!(router.adjust_knob(17, 200), 127);
        assert_eq!(router.knob_value(16), 0);
        assert_eq!(router.knob_value(99), 0);
    }

    #[test]
    fn test_reset_returns_pending_handles() {
        let mut router = router();
        router.press_modifier(Modifiers::SAVE);
        router.track_long_press(81, TaskHandle::new(450, 0));
        let handles = router.reset();
        assert_eq!(handles.len(), 1);
        assert!(router.active().is_empty());
        assert_eq!(router.pending_long_presses(), 0);
    }
}
