//! Display and light sinks

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::controls::Light;
use crate::runtime::{Clock, Millis};

/// Where the surface presents its state
///
/// A plain setter interface: nothing flows back into the router.
pub trait Feedback {
    /// Replaces both display lines
    fn show_lines(&mut self, line1: &str, line2: &str);

    /// Turns a button light on or off
    fn set_light(&mut self, light: Light, on: bool);
}

/// One call made on a [`FeedbackLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackEvent {
    Lines {
        at_ms: Millis,
        line1: String,
        line2: String,
    },
    Light {
        at_ms: Millis,
        light: Light,
        on: bool,
    },
}

#[derive(Default)]
struct FeedbackState {
    events: Vec<FeedbackEvent>,
    lines: (String, String),
    lights: BTreeMap<Light, bool>,
}

/// Recording sink for tests and replay
///
/// Clones share the same record.
#[derive(Clone)]
pub struct FeedbackLog {
    clock: Rc<dyn Clock>,
    state: Rc<RefCell<FeedbackState>>,
}

impl FeedbackLog {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(FeedbackState::default())),
        }
    }

    /// All recorded calls, oldest first
    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.state.borrow().events.clone()
    }

    /// What the display currently shows
    pub fn lines(&self) -> (String, String) {
        self.state.borrow().lines.clone()
    }

    /// Last state set for `light`, off if never set
    pub fn light(&self, light: Light) -> bool {
        self.state.borrow().lights.get(&light).copied().unwrap_or(false)
    }

    /// How many times the display was written
    pub fn display_writes(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| matches!(event, FeedbackEvent::Lines { .. }))
            .count()
    }

    /// How many times `light` was switched
    pub fn light_toggles(&self, light: Light) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| matches!(event, FeedbackEvent::Light { light: l, .. } if *l == light))
            .count()
    }
}

impl Feedback for FeedbackLog {
    fn show_lines(&mut self, line1: &str, line2: &str) {
        let at_ms = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        state.lines = (line1.to_string(), line2.to_string());
        state.events.push(FeedbackEvent::Lines {
            at_ms,
            line1: line1.to_string(),
            line2: line2.to_string(),
        });
    }

    fn set_light(&mut self, light: Light, on: bool) {
        let at_ms = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        state.lights.insert(light, on);
        state.events.push(FeedbackEvent::Light { at_ms, light, on });
    }
}

impl std::fmt::Debug for FeedbackLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedbackLog")
            .field("events", &self.state.borrow().events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualClock;

    #[test]
    fn test_log_tracks_current_state() {
        let clock = ManualClock::new();
        let log = FeedbackLog::new(Rc::new(clock.clone()));
        let mut sink = log.clone();

        sink.show_lines("Channel", "[Kick]");
        clock.advance(10);
        sink.set_light(Light::TransportLoop, true);
        sink.set_light(Light::TransportLoop, false);

        assert_eq!(log.lines(), ("Channel".to_string(), "[Kick]".to_string()));
        assert!(!log.light(Light::TransportLoop));
        assert_eq!(log.light_toggles(Light::TransportLoop), 2);
        assert_eq!(log.display_writes(), 1);
        assert!(matches!(
            log.events()[1],
            FeedbackEvent::Light { at_ms: 10, on: true, .. }
        ));
    }
}
