//! Integration tests for the deferred task scheduler

use std::rc::Rc;

use keylab_router::runtime::{ManualClock, Millis, Scheduled, Scheduler};
use proptest::prelude::*;

struct Bench {
    scheduler: Scheduler<Bench>,
    fired: Vec<(Millis, usize)>,
}

impl Bench {
    fn new(clock: &ManualClock) -> Self {
        Self {
            scheduler: Scheduler::new(Rc::new(clock.clone())),
            fired: Vec::new(),
        }
    }

    fn schedule_tagged(&mut self, delay: Millis, tag: usize) {
        let deadline = self.scheduler.now() + delay;
        self.scheduler.schedule(delay, move |bench: &mut Bench| {
            bench.fired.push((deadline, tag));
            Ok(())
        });
    }
}

impl Scheduled for Bench {
    fn scheduler(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

#[test]
fn test_thousand_tasks_drain_in_one_pump() {
    let clock = ManualClock::new();
    let mut bench = Bench::new(&clock);
    for tag in 0..1000 {
        bench.schedule_tagged((tag as Millis * 37) % 101, tag);
    }

    clock.advance(1000);
    let report = Scheduler::pump(&mut bench);

    assert_eq!(report.executed, 1000);
    assert_eq!(report.failed, 0);
    assert!(bench.scheduler.is_empty());
    assert!(bench.fired.windows(2).all(|pair| pair[0].0 <= pair[1].0));
}

#[test]
fn test_late_pump_fires_everything_once() {
    let clock = ManualClock::new();
    let mut bench = Bench::new(&clock);
    bench.schedule_tagged(10, 0);
    bench.schedule_tagged(20, 1);

    clock.advance(10_000);
    Scheduler::pump(&mut bench);
    Scheduler::pump(&mut bench);

    assert_eq!(bench.fired, vec![(10, 0), (20, 1)]);
}

#[test]
fn test_cancel_after_fire_is_stale() {
    let clock = ManualClock::new();
    let mut bench = Bench::new(&clock);
    let handle = bench.scheduler.schedule(5, |_: &mut Bench| Ok(()));

    clock.advance(5);
    Scheduler::pump(&mut bench);
    assert!(!bench.scheduler.cancel(handle));
}

#[test]
fn test_panicking_task_does_not_wedge_queue() {
    let clock = ManualClock::new();
    let mut bench = Bench::new(&clock);
    bench.scheduler.schedule(1, |_: &mut Bench| panic!("bad binding"));
    bench.schedule_tagged(1, 7);

    clock.advance(1);
    let report = Scheduler::pump(&mut bench);

    assert_eq!(report.executed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(bench.fired, vec![(1, 7)]);
}

#[test]
fn test_action_can_cancel_a_later_task() {
    let clock = ManualClock::new();
    let mut bench = Bench::new(&clock);
    let victim = bench.scheduler.schedule(2, |bench: &mut Bench| {
        bench.fired.push((2, 99));
        Ok(())
    });
    bench.scheduler.schedule(1, move |bench: &mut Bench| {
        assert!(bench.scheduler.cancel(victim));
        Ok(())
    });

    clock.advance(5);
    let report = Scheduler::pump(&mut bench);
    assert_eq!(report.executed, 1);
    assert!(bench.fired.is_empty());
}

proptest! {
    #[test]
    fn test_fires_in_deadline_then_insertion_order(
        steps in prop::collection::vec((0u64..50, 0u64..200), 1..60)
    ) {
        let clock = ManualClock::new();
        let mut bench = Bench::new(&clock);

        // Each step: advance the clock, then schedule one task
        let mut expected = Vec::new();
        for (tag, (advance, delay)) in steps.iter().enumerate() {
            clock.advance(*advance);
            expected.push((clock_now(&bench) + delay, tag));
            bench.schedule_tagged(*delay, tag);
        }

        clock.advance(10_000);
        Scheduler::pump(&mut bench);

        expected.sort();
        prop_assert_eq!(bench.fired, expected);
    }

    #[test]
    fn test_cancel_succeeds_at_most_once(
        delays in prop::collection::vec(0u64..100, 1..40),
        cancel_mask in prop::collection::vec(any::<bool>(), 40),
        pump_at in 0u64..120,
    ) {
        let clock = ManualClock::new();
        let mut bench = Bench::new(&clock);
        let handles: Vec<_> = delays
            .iter()
            .enumerate()
            .map(|(tag, delay)| {
                let deadline = *delay;
                bench.scheduler.schedule(*delay, move |bench: &mut Bench| {
                    bench.fired.push((deadline, tag));
                    Ok(())
                })
            })
            .collect();

        clock.advance(pump_at);
        Scheduler::pump(&mut bench);

        for (tag, handle) in handles.iter().enumerate() {
            if !cancel_mask[tag] {
                continue;
            }
            let already_fired = bench.fired.iter().any(|(_, fired)| *fired == tag);
            let first = bench.scheduler.cancel(*handle);
            let second = bench.scheduler.cancel(*handle);
            prop_assert_eq!(first, !already_fired);
            prop_assert!(!second);
        }

        clock.advance(1_000);
        Scheduler::pump(&mut bench);
        for (tag, _) in handles.iter().enumerate() {
            let count = bench.fired.iter().filter(|(_, fired)| *fired == tag).count();
            let expected = if cancel_mask[tag] && delays[tag] > pump_at { 0 } else { 1 };
            prop_assert_eq!(count, expected);
        }
    }
}

fn clock_now(bench: &Bench) -> Millis {
    bench.scheduler.now()
}
