//! Typed, synchronous publish/subscribe bus.
//!
//! `publish` checks the payload contract once, then runs every handler
//! registered for the name in registration order before returning. Handlers
//! may publish again; nested dispatch runs on the same call stack and is
//! capped at [`EventBus::max_depth`] levels so a publish cycle fails instead
//! of overflowing the stack.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use hashbrown::HashMap;
use tracing::{debug, error};

use crate::{core::lock, error::BusError};

use super::events::{Event, EventName, Payload, check_contract};

/// Default nesting limit for synchronous re-entrant dispatch.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Subscribed handler. Receives the bus so it can publish follow-up events.
pub type Handler = Arc<dyn Fn(&EventBus, &Payload) -> Result<(), BusError> + Send + Sync>;

/// In-process registry mapping event names to ordered handler lists.
pub struct EventBus {
    subscriptions: Mutex<HashMap<EventName, Vec<Handler>>>,
    depth: AtomicUsize,
    max_depth: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }
}

struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl EventBus {
    /// Bus with [`DEFAULT_MAX_DEPTH`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus allowing `max_depth` nested publishes.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            subscriptions: Mutex::new(HashMap::new()),
            depth: AtomicUsize::new(0),
            max_depth: max_depth.max(1),
        }
    }

    /// Configured nesting limit.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Appends `handler` to the handlers of `name`.
    pub fn subscribe<F>(&self, name: EventName, handler: F)
    where
        F: Fn(&EventBus, &Payload) -> Result<(), BusError> + Send + Sync + 'static,
    {
        lock(&self.subscriptions)
            .entry(name)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Number of handlers registered for `name`.
    pub fn subscriber_count(&self, name: EventName) -> usize {
        lock(&self.subscriptions).get(&name).map_or(0, Vec::len)
    }

    /// Delivers `payload` to every handler of `name`.
    ///
    /// A payload that does not match `name`'s contract is delivered to no
    /// handler. A failing handler does not stop later handlers; the first
    /// failure is returned once all of them ran.
    pub fn publish(&self, name: EventName, payload: Payload) -> Result<(), BusError> {
        self.dispatch(name, &payload)
    }

    /// [`EventBus::publish`] for an already built event.
    pub fn publish_event(&self, event: &Event) -> Result<(), BusError> {
        self.dispatch(event.name, &event.payload)
    }

    fn dispatch(&self, name: EventName, payload: &Payload) -> Result<(), BusError> {
        if let Err(err) = check_contract(name, payload) {
            error!(event = ?name, %err, "rejected event");
            return Err(err);
        }

        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = DepthGuard(&self.depth);
        if depth > self.max_depth {
            error!(event = ?name, depth, "dispatch nesting limit reached");
            return Err(BusError::DispatchDepthExceeded {
                event: name,
                depth: self.max_depth,
            });
        }

        // Cloned so handlers can subscribe or publish without deadlocking.
        let handlers = lock(&self.subscriptions)
            .get(&name)
            .cloned()
            .unwrap_or_default();
        debug!(event = ?name, handlers = handlers.len(), depth, "dispatch");

        let mut first_err = None;
        for handler in handlers {
            if let Err(err) = handler(self, payload) {
                error!(event = ?name, %err, "handler failed");
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_cycle_hits_depth_limit() {
        let bus = EventBus::with_max_depth(4);
        bus.subscribe(EventName::ShowMeals, |bus, _| bus.publish(EventName::ShowMeals, Payload::None));
        let err = bus.publish(EventName::ShowMeals, Payload::None).unwrap_err();
        assert_eq!(
            err,
            BusError::DispatchDepthExceeded {
                event: EventName::ShowMeals,
                depth: 4
            }
        );
        assert_eq!(bus.depth.load(Ordering::SeqCst), 0);
    }
}
