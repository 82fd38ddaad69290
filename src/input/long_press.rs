//! Tap-vs-hold detection
//!
//! A press schedules a "declare long press" task; the matching release tries
//! to cancel it. Whichever side wins decides the effect, so exactly one of
//! the short and long effects runs per press/release pair.

use tracing::debug;

use super::events::InputEvent;
use super::router::InputRouter;
use crate::runtime::{Millis, Scheduled};

/// Context that owns both a scheduler and an input router
pub trait RouterHost: Scheduled + 'static {
    /// Action type bound in the router's chord table
    type Action: Clone;

    fn router(&mut self) -> &mut InputRouter<Self::Action>;
}

/// Effect run when a press resolves
pub type PressEffect<C> = fn(&mut C, &InputEvent) -> anyhow::Result<()>;

/// How one control reacts to short and long presses
pub struct LongPress<C> {
    /// Hold time before the long effect fires
    pub delay_ms: Millis,
    /// Runs on release when the hold was shorter than `delay_ms`
    pub short: PressEffect<C>,
    /// Runs from the scheduler once `delay_ms` has elapsed
    pub long: PressEffect<C>,
    /// Skip both effects if something else committed the press meanwhile
    ///
    /// Used by controls that are also modifiers: a chord fired while holding
    /// them replaces their own effect.
    pub guarded: bool,
}

impl<C> Clone for LongPress<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for LongPress<C> {}

impl<C> LongPress<C> {
    pub fn new(delay_ms: Millis, short: PressEffect<C>, long: PressEffect<C>) -> Self {
        Self {
            delay_ms,
            short,
            long,
            guarded: false,
        }
    }

    /// Suppresses both effects once the press has been committed elsewhere
    pub fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }
}

/// Feeds one press or release of a long-press control through the detector
///
/// Errors from the short effect are returned to the caller; errors from the
/// long effect surface through the scheduler's failure logging.
pub fn detect_long_press<C: RouterHost>(
    ctx: &mut C,
    event: &InputEvent,
    press: LongPress<C>,
) -> anyhow::Result<()> {
    let control = event.control;

    if event.is_pressed() {
        let event = *event;
        let handle = ctx
            .scheduler()
            .schedule_named("long-press", press.delay_ms, move |ctx: &mut C| {
                ctx.router().take_long_press(control);
                if press.guarded && ctx.router().is_committed() {
                    debug!(control, "long press suppressed by earlier chord");
                    return Ok(());
                }
                ctx.router().commit();
                (press.long)(ctx, &event)
            });

        if let Some(stale) = ctx.router().track_long_press(control, handle) {
            // A press without a release in between; the old hold is void.
            ctx.scheduler().cancel(stale);
            debug!(control, %stale, "replaced pending long press");
        }
        return Ok(());
    }

    let Some(handle) = ctx.router().take_long_press(control) else {
        debug!(control, "release after long press fired");
        return Ok(());
    };

    if !ctx.scheduler().cancel(handle) {
        debug!(control, %handle, "long press won the race with release");
        return Ok(());
    }
    if press.guarded && ctx.router().is_committed() {
        debug!(control, "short press suppressed by earlier chord");
        return Ok(());
    }
    (press.short)(ctx, event)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::input::chords::ChordTable;
    use crate::input::modifiers::Modifiers;
    use crate::runtime::{ManualClock, Scheduler};

    const HOLD_MS: Millis = 450;

    struct Host {
        scheduler: Scheduler<Host>,
        router: InputRouter<()>,
        effects: Vec<&'static str>,
    }

    impl Host {
        fn new(clock: &ManualClock) -> Self {
            Self {
                scheduler: Scheduler::new(Rc::new(clock.clone())),
                router: InputRouter::new(ChordTable::new()),
                effects: Vec::new(),
            }
        }
    }

    impl Scheduled for Host {
        fn scheduler(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    impl RouterHost for Host {
        type Action = ();

        fn router(&mut self) -> &mut InputRouter<()> {
            &mut self.router
        }
    }

    fn short(host: &mut Host, _: &InputEvent) -> anyhow::Result<()> {
        host.effects.push("short");
        Ok(())
    }

    fn long(host: &mut Host, _: &InputEvent) -> anyhow::Result<()> {
        host.effects.push("long");
        Ok(())
    }

    fn undo() -> LongPress<Host> {
        LongPress::new(HOLD_MS, short, long)
    }

    #[test]
    fn test_quick_release_runs_short_only() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        detect_long_press(&mut host, &InputEvent::press(81), undo()).unwrap();
        clock.advance(HOLD_MS / 2);
        Scheduler::pump(&mut host);
        detect_long_press(&mut host, &InputEvent::release(81), undo()).unwrap();

        clock.advance(HOLD_MS);
        Scheduler::pump(&mut host);
        assert_eq!(host.effects, vec!["short"]);
        assert!(host.scheduler.is_empty());
    }

    #[test]
    fn test_hold_runs_long_only() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        detect_long_press(&mut host, &InputEvent::press(81), undo()).unwrap();
        clock.advance(HOLD_MS);
        Scheduler::pump(&mut host);
        assert!(!host.router.is_long_press_pending(81));

        detect_long_press(&mut host, &InputEvent::release(81), undo()).unwrap();
        assert_eq!(host.effects, vec!["long"]);
        assert!(host.router.is_committed());
    }

    #[test]
    fn test_controls_are_independent() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        detect_long_press(&mut host, &InputEvent::press(81), undo()).unwrap();
        clock.advance(100);
        detect_long_press(&mut host, &InputEvent::press(49), undo()).unwrap();
        detect_long_press(&mut host, &InputEvent::release(49), undo()).unwrap();

        clock.advance(HOLD_MS);
        Scheduler::pump(&mut host);
        assert_eq!(host.effects, vec!["short", "long"]);
    }

    #[test]
    fn test_repeated_press_replaces_pending_task() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        detect_long_press(&mut host, &InputEvent::press(81), undo()).unwrap();
        clock.advance(300);
        detect_long_press(&mut host, &InputEvent::press(81), undo()).unwrap();
        assert_eq!(host.scheduler.len(), 1);

        clock.advance(200);
        Scheduler::pump(&mut host);
        assert!(host.effects.is_empty());
        clock.advance(250);
        Scheduler::pump(&mut host);
        assert_eq!(host.effects, vec!["long"]);
    }

    #[test]
    fn test_guarded_press_yields_to_chord() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        let nav = undo().guarded();

        host.router.press_modifier(Modifiers::LEFT);
        detect_long_press(&mut host, &InputEvent::press(98), nav).unwrap();
        host.router.commit();
        detect_long_press(&mut host, &InputEvent::release(98), nav).unwrap();
        assert!(host.effects.is_empty());

        host.router.press_modifier(Modifiers::LEFT);
        detect_long_press(&mut host, &InputEvent::press(98), nav).unwrap();
        host.router.commit();
        clock.advance(HOLD_MS);
        Scheduler::pump(&mut host);
        assert!(host.effects.is_empty());
    }

    #[test]
    fn test_release_without_press_is_inert() {
        let clock = ManualClock::new();
        let mut host = Host::new(&clock);
        detect_long_press(&mut host, &InputEvent::release(81), undo()).unwrap();
        assert!(host.effects.is_empty());
    }
}
