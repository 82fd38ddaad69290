//! KeyLab Router
//!
//! Cooperative scheduling and chord-aware input routing for DAW control
//! surfaces, driven entirely by "message arrived" and "idle tick" callbacks.

/// Application layer - configuration, replay and live runners
pub mod app;

/// Build-time information (timestamp, target, compiler)
pub mod build_info;

/// Startup self-checks
pub mod health;

/// Event decoding, dispatch tables, modifiers, chords and long presses
pub mod input;

/// Clocks and the deferred task scheduler
pub mod runtime;

/// The concrete control surface built on the input and runtime layers
pub mod surface;
