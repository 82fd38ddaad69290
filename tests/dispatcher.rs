//! Integration tests for classify-then-route dispatch tables

use std::rc::Rc;

use keylab_router::input::{ControlId, Dispatcher, InputEvent, MessageClass, Routed, ignore_release};

#[derive(Default)]
struct Log {
    calls: Vec<String>,
}

fn by_class(event: &InputEvent) -> Option<MessageClass> {
    event.class()
}

fn by_control(event: &InputEvent) -> ControlId {
    event.control
}

fn record(tag: &'static str) -> impl Fn(&mut Log, &InputEvent) -> anyhow::Result<()> {
    move |log: &mut Log, event: &InputEvent| {
        log.calls.push(format!("{tag}:{}:{}", event.control, event.value));
        Ok(())
    }
}

#[test]
fn test_filter_swallows_release_but_consumes_it() {
    let table = Dispatcher::new("buttons", by_control).register_filtered(5, record("press"), ignore_release);
    let mut log = Log::default();

    assert!(table.dispatch(&mut log, &InputEvent::press(5)));
    assert!(table.dispatch(&mut log, &InputEvent::release(5)));
    assert_eq!(table.route(&mut log, &InputEvent::release(5)), Routed::Filtered);
    assert_eq!(log.calls, vec!["press:5:127"]);
}

#[test]
fn test_unknown_key_not_consumed() {
    let table = Dispatcher::new("buttons", by_control).register(1, record("one"));
    let mut log = Log::default();
    assert!(!table.dispatch(&mut log, &InputEvent::press(2)));
    assert!(log.calls.is_empty());
}

#[test]
fn test_last_registration_wins() {
    let table = Dispatcher::new("buttons", by_control)
        .register(3, record("first"))
        .register(3, record("second"));
    let mut log = Log::default();

    table.dispatch(&mut log, &InputEvent::press(3));
    assert_eq!(table.len(), 1);
    assert_eq!(log.calls, vec!["second:3:127"]);
}

#[test]
fn test_register_many_shares_one_callback() {
    let table = Dispatcher::new("tracks", by_control).register_many(8..16, record("solo"));
    let mut log = Log::default();

    for control in [8, 15, 16] {
        table.dispatch(&mut log, &InputEvent::press(control));
    }
    assert_eq!(table.len(), 8);
    assert_eq!(log.calls, vec!["solo:8:127", "solo:15:127"]);
}

#[test]
fn test_failing_callback_is_contained() {
    let table = Dispatcher::new("buttons", by_control)
        .register(1, |_: &mut Log, _: &InputEvent| Err(anyhow::anyhow!("broken binding")))
        .register(2, |_: &mut Log, _: &InputEvent| -> anyhow::Result<()> { panic!("worse binding") })
        .register(3, record("fine"));
    let mut log = Log::default();

    assert_eq!(table.route(&mut log, &InputEvent::press(1)), Routed::Failed);
    assert_eq!(table.route(&mut log, &InputEvent::press(2)), Routed::Failed);
    assert!(table.dispatch(&mut log, &InputEvent::press(3)));
    assert_eq!(log.calls, vec!["fine:3:127"]);
}

#[test]
fn test_two_level_routing() {
    let buttons = Rc::new(Dispatcher::new("buttons", by_control).register(7, record("button")));
    let knobs = Rc::new(Dispatcher::new("knobs", by_control).register(7, record("knob")));

    let top = Dispatcher::new("top", by_class)
        .register(Some(MessageClass::NoteOn), move |log: &mut Log, event: &InputEvent| {
            buttons.dispatch(log, event);
            Ok(())
        })
        .register(
            Some(MessageClass::ControlChange),
            move |log: &mut Log, event: &InputEvent| {
                knobs.dispatch(log, event);
                Ok(())
            },
        );
    let mut log = Log::default();

    assert!(top.dispatch(&mut log, &InputEvent::press(7)));
    assert!(top.dispatch(&mut log, &InputEvent::control_change(7, 65)));
    assert!(!top.dispatch(&mut log, &InputEvent::fader(0, 10)));
    assert_eq!(log.calls, vec!["button:7:127", "knob:7:65"]);
}
