//! Cooperative runtime: clocks and the deferred task scheduler
//!
//! There are no threads and no timers here. The host calls in with "a message
//! arrived" or "idle tick" and everything time-based is simulated by tasks
//! waiting in the [`Scheduler`] until an idle tick finds them due.

mod clock;
mod scheduler;
mod task;

use std::any::Any;

pub use clock::{Clock, ManualClock, Millis, MonotonicClock};
pub use scheduler::{PumpReport, Scheduled, Scheduler};
pub use task::{TaskAction, TaskHandle};

/// Best-effort text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
