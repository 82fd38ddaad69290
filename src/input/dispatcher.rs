//! Classify-then-route dispatch tables
//!
//! A [`Dispatcher`] turns an event into a key with its classifier and routes
//! the event to whatever callback is registered for that key. Dispatchers
//! nest by registering a callback that owns another dispatcher; the table
//! itself knows nothing about nesting.

use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, error, trace, warn};

use crate::runtime::panic_message;

/// Handler invoked with the dispatch context and the routed event
pub type Callback<E, C> = Rc<dyn Fn(&mut C, &E) -> anyhow::Result<()>>;

/// Gate evaluated before the callback; `false` swallows the event
pub type Filter<E> = fn(&E) -> bool;

/// How a single event was routed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// Callback ran to completion
    Handled,
    /// Filter rejected the event; callback not invoked
    Filtered,
    /// Callback returned an error or panicked; already logged
    Failed,
    /// No entry for the event's key
    Unhandled,
}

impl Routed {
    /// Whether the event counts as consumed by the table
    ///
    /// Everything except [`Routed::Unhandled`] is consumed, including filtered
    /// events and failed callbacks.
    pub fn consumed(self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

struct Entry<E, C> {
    callback: Callback<E, C>,
    filter: Option<Filter<E>>,
}

/// Routing table keyed by the output of a classifier
///
/// At most one entry exists per key. Registering a key again replaces the
/// previous entry: the last registration wins.
pub struct Dispatcher<E, K, C> {
    name: &'static str,
    classify: fn(&E) -> K,
    entries: IndexMap<K, Entry<E, C>>,
}

impl<E, K, C> Dispatcher<E, K, C>
where
    E: fmt::Display,
    K: Hash + Eq + Copy + fmt::Debug,
{
    /// Creates an empty table; `name` appears in diagnostics
    pub fn new(name: &'static str, classify: fn(&E) -> K) -> Self {
        Self {
            name,
            classify,
            entries: IndexMap::new(),
        }
    }

    /// Registers `callback` for `key`, always invoked
    pub fn register<F>(self, key: K, callback: F) -> Self
    where
        F: Fn(&mut C, &E) -> anyhow::Result<()> + 'static,
    {
        self.insert(key, Rc::new(callback), None)
    }

    /// Registers `callback` for `key`, gated by `filter`
    pub fn register_filtered<F>(self, key: K, callback: F, filter: Filter<E>) -> Self
    where
        F: Fn(&mut C, &E) -> anyhow::Result<()> + 'static,
    {
        self.insert(key, Rc::new(callback), Some(filter))
    }

    /// Registers one shared callback for every key in `keys`
    pub fn register_many<I, F>(self, keys: I, callback: F) -> Self
    where
        I: IntoIterator<Item = K>,
        F: Fn(&mut C, &E) -> anyhow::Result<()> + 'static,
    {
        self.insert_many(keys, Rc::new(callback), None)
    }

    /// Registers one shared, filtered callback for every key in `keys`
    pub fn register_many_filtered<I, F>(self, keys: I, callback: F, filter: Filter<E>) -> Self
    where
        I: IntoIterator<Item = K>,
        F: Fn(&mut C, &E) -> anyhow::Result<()> + 'static,
    {
        self.insert_many(keys, Rc::new(callback), Some(filter))
    }

    fn insert_many<I>(mut self, keys: I, callback: Callback<E, C>, filter: Option<Filter<E>>) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self = self.insert(key, Rc::clone(&callback), filter);
        }
        self
    }

    fn insert(mut self, key: K, callback: Callback<E, C>, filter: Option<Filter<E>>) -> Self {
        if self
            .entries
            .insert(key, Entry { callback, filter })
            .is_some()
        {
            debug!(dispatcher = self.name, ?key, "handler replaced");
        }
        self
    }

    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether a handler exists for `key`
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Routes `event` and reports whether it was consumed
    pub fn dispatch(&self, ctx: &mut C, event: &E) -> bool {
        self.route(ctx, event).consumed()
    }

    /// Routes `event` and reports exactly what happened
    ///
    /// Callback errors and panics are logged here and never reach the caller.
    pub fn route(&self, ctx: &mut C, event: &E) -> Routed {
        let key = (self.classify)(event);
        let Some(entry) = self.entries.get(&key) else {
            debug!(dispatcher = self.name, ?key, %event, "no handler");
            return Routed::Unhandled;
        };

        if entry.filter.is_some_and(|filter| !filter(event)) {
            trace!(dispatcher = self.name, ?key, %event, "dropped by filter");
            return Routed::Filtered;
        }

        let callback = &entry.callback;
        match panic::catch_unwind(AssertUnwindSafe(|| callback(ctx, event))) {
            Ok(Ok(())) => Routed::Handled,
            Ok(Err(err)) => {
                warn!(
                    dispatcher = self.name,
                    ?key,
                    %event,
                    error = %format!("{err:#}"),
                    "handler failed"
                );
                Routed::Failed
            }
            Err(payload) => {
                error!(
                    dispatcher = self.name,
                    ?key,
                    %event,
                    panic = %panic_message(payload.as_ref()),
                    "handler panicked"
                );
                Routed::Failed
            }
        }
    }
}

impl<E, K: fmt::Debug, C> fmt::Debug for Dispatcher<E, K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::events::{InputEvent, ignore_release};

    #[derive(Default)]
    struct Calls {
        seen: Vec<(&'static str, u8)>,
    }

    fn by_control(event: &InputEvent) -> u8 {
        event.control
    }

    fn note(tag: &'static str) -> impl Fn(&mut Calls, &InputEvent) -> anyhow::Result<()> {
        move |calls: &mut Calls, event: &InputEvent| {
            calls.seen.push((tag, event.value));
            Ok(())
        }
    }

    #[test]
    fn test_unknown_key_is_not_consumed() {
        let table = Dispatcher::new("buttons", by_control).register(1, note("one"));
        let mut calls = Calls::default();
        assert!(!table.dispatch(&mut calls, &InputEvent::press(2)));
        assert!(calls.seen.is_empty());
    }

    #[test]
    fn test_filtered_release_is_consumed_without_callback() {
        let table = Dispatcher::new("buttons", by_control).register_filtered(
            24,
            note("bank"),
            ignore_release,
        );
        let mut calls = Calls::default();
        assert_eq!(table.route(&mut calls, &InputEvent::release(24)), Routed::Filtered);
        assert!(table.dispatch(&mut calls, &InputEvent::release(24)));
        assert!(calls.seen.is_empty());

        assert!(table.dispatch(&mut calls, &InputEvent::press(24)));
        assert_eq!(calls.seen, vec![("bank", 127)]);
    }

    #[test]
    fn test_last_registration_wins() {
        let table = Dispatcher::new("buttons", by_control)
            .register(7, note("first"))
            .register(7, note("second"));
        let mut calls = Calls::default();
        table.dispatch(&mut calls, &InputEvent::press(7));
        assert_eq!(table.len(), 1);
        assert_eq!(calls.seen, vec![("second", 127)]);
    }

    #[test]
    fn test_register_many_shares_callback() {
        let table = Dispatcher::new("solo", by_control).register_many(8..16, note("solo"));
        let mut calls = Calls::default();
        for control in 8..16 {
            assert!(table.dispatch(&mut calls, &InputEvent::press(control)));
        }
        assert_eq!(calls.seen.len(), 8);
        assert!(!table.contains(&16));
    }

    #[test]
    fn test_failing_callback_is_consumed_and_isolated() {
        let table = Dispatcher::new("buttons", by_control)
            .register(1, |_: &mut Calls, _: &InputEvent| anyhow::bail!("no workstation"))
            .register(2, |_: &mut Calls, _: &InputEvent| -> anyhow::Result<()> {
                panic!("broken binding")
            })
            .register(3, note("fine"));
        let mut calls = Calls::default();

        assert_eq!(table.route(&mut calls, &InputEvent::press(1)), Routed::Failed);
        assert_eq!(table.route(&mut calls, &InputEvent::press(2)), Routed::Failed);
        assert_eq!(table.route(&mut calls, &InputEvent::press(3)), Routed::Handled);
        assert_eq!(calls.seen, vec![("fine", 127)]);
    }

    #[test]
    fn test_nested_dispatchers_compose() {
        let inner = Rc::new(Dispatcher::new("inner", by_control).register(95, note("record")));
        let outer = Dispatcher::new("outer", |event: &InputEvent| event.status & 0xF0).register(
            0x90,
            move |calls: &mut Calls, event: &InputEvent| {
                inner.dispatch(calls, event);
                Ok(())
            },
        );
        let mut calls = Calls::default();
        assert!(outer.dispatch(&mut calls, &InputEvent::press(95)));
        assert!(!outer.dispatch(&mut calls, &InputEvent::control_change(95, 1)));
        assert_eq!(calls.seen, vec![("record", 127)]);
    }
}
