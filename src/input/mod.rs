//! Input routing for control surfaces
//!
//! Turns raw controller messages into actions:
//! - Decodes raw messages into [`InputEvent`]s
//! - Routes events through nested [`Dispatcher`] tables
//! - Tracks held and locked modifiers and resolves chords
//! - Tells taps from holds using the deferred task scheduler
//!
//! # Architecture
//!
//! ```text
//! Raw message → InputEvent → Dispatcher (by message class)
//!                                 ↓
//!                           Dispatcher (by control id)
//!                                 ↓
//!                   handler ── InputRouter (modifiers, chords)
//!                      └────── detect_long_press → Scheduler
//! ```

mod chords;
mod dispatcher;
mod events;
mod long_press;
mod modifiers;
mod router;

pub use chords::{
    BANK_SLOTS, Binding, BindingError, ChordKey, ChordTable, ENCODER_SLOTS, MacroSlot, Resolution,
    parse_modifiers,
};
pub use dispatcher::{Callback, Dispatcher, Filter, Routed};
pub use events::{
    ControlId, EventError, InputEvent, MessageClass, VALUE_OFF, VALUE_ON, fold_relative,
    ignore_release,
};
pub use long_press::{LongPress, PressEffect, RouterHost, detect_long_press};
pub use modifiers::Modifiers;
pub use router::{InputRouter, LockChange};
