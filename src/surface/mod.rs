//! KeyLab-style control surface
//!
//! [`Surface`] is the composition root: it owns the [`Controller`] context
//! and the routing tables, and exposes the host entry points:
//! [`Surface::on_message`] for the button port, [`Surface::on_keys_message`]
//! for the keys port, and [`Surface::on_idle`].

mod commands;
mod controller;
pub mod controls;
mod display;
mod feedback;
mod handlers;
mod macros;
mod navigation;
mod pages;
mod recorder;

use std::rc::Rc;

use tracing::{debug, trace};

pub use commands::{Command, CommandLog, Direction, Performed, SIMPLE_COMMANDS, TimeUnit, Workstation};
pub use controller::{Controller, SurfaceSettings};
pub use controls::Light;
pub use display::PagedDisplay;
pub use feedback::{Feedback, FeedbackEvent, FeedbackLog};
pub use handlers::{KeysRole, KeysRoutes, SurfaceRoutes, keys_routes, routes};
pub use macros::{MacroOverride, apply_overrides, bind_command, default_chords, parse_override};
pub use navigation::{Navigation, NavigationMode};
pub use pages::{ControlPages, ControlsTarget, PAGE_COUNT};
pub use recorder::{Pad, PadRecorder, RecordedNote};

use crate::input::{ChordTable, InputEvent};
use crate::runtime::{Clock, PumpReport, Scheduler};

/// Input port a message arrived on
///
/// Buttons and keys both send notes on the first channel, so the port
/// decides which table routes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Port {
    #[default]
    Buttons,
    Keys,
}

/// Outcome of one host tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub consumed: usize,
    pub unconsumed: usize,
    pub pump: PumpReport,
}

/// A control surface ready to receive host callbacks
pub struct Surface {
    controller: Controller,
    routes: SurfaceRoutes,
    keys: KeysRoutes,
}

impl Surface {
    pub fn new(
        settings: SurfaceSettings,
        chords: ChordTable<Command>,
        clock: Rc<dyn Clock>,
        workstation: Box<dyn Workstation>,
        feedback: Box<dyn Feedback>,
    ) -> Self {
        let mut controller = Controller::new(settings, chords, clock, workstation, feedback);
        let mode = controller.navigation().active();
        controller.set_main_page("KeyLab", mode.name());
        Self {
            controller,
            routes: routes(),
            keys: keys_routes(),
        }
    }

    /// Routes one message; `false` means the caller may forward it elsewhere
    pub fn on_message(&mut self, event: &InputEvent) -> bool {
        trace!(%event, "message");
        let consumed = self.routes.dispatch(&mut self.controller, event);
        if !consumed && self.controller.settings().log_unhandled {
            debug!(%event, "message not consumed");
        }
        consumed
    }

    /// Routes one message from the keys port
    ///
    /// Only pads are consumed. Key notes and the sustain pedal are seen by
    /// the pad recorder and then left for the host.
    pub fn on_keys_message(&mut self, event: &InputEvent) -> bool {
        trace!(%event, "keys message");
        handlers::observe_keys(&mut self.controller, event);
        self.keys.dispatch(&mut self.controller, event)
    }

    pub fn on_port_message(&mut self, port: Port, event: &InputEvent) -> bool {
        match port {
            Port::Buttons => self.on_message(event),
            Port::Keys => self.on_keys_message(event),
        }
    }

    /// Runs every task that is due
    pub fn on_idle(&mut self) -> PumpReport {
        Scheduler::pump(&mut self.controller)
    }

    /// Handles a whole host slice: every queued message first, then one pump
    ///
    /// Running messages first lets a release cancel a long press whose
    /// deadline passed in the same slice.
    pub fn on_tick<'a, I>(&mut self, events: I) -> TickReport
    where
        I: IntoIterator<Item = &'a InputEvent>,
    {
        self.on_port_tick(events.into_iter().map(|event| (Port::Buttons, event)))
    }

    /// Like [`Surface::on_tick`], for messages from either port
    pub fn on_port_tick<'a, I>(&mut self, events: I) -> TickReport
    where
        I: IntoIterator<Item = (Port, &'a InputEvent)>,
    {
        let mut report = TickReport::default();
        for (port, event) in events {
            if self.on_port_message(port, event) {
                report.consumed += 1;
            } else {
                report.unconsumed += 1;
            }
        }
        report.pump = self.on_idle();
        report
    }

    /// Returns the input state machine to idle
    pub fn reset(&mut self) {
        self.controller.reset_input();
    }

    /// Input is gone for good: stop whatever would run forever
    ///
    /// Tasks already scheduled to finish (hint expiry, pattern notes) stay
    /// queued so a caller can drain them.
    pub fn close(&mut self) {
        self.controller.wind_down();
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("controller", &self.controller)
            .field("routes", &self.routes)
            .field("keys", &self.keys)
            .finish()
    }
}
