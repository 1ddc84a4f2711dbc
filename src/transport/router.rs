//! Event routing.
//!
//! Holds a single subscriber slot. Subscribing replaces the previous
//! handler; there is no fan-out.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::protocol::Event;

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called from the connection event loop for each event, in arrival order.
/// The slot lock is released before the call, so a handler may replace or
/// remove itself.
pub type EventHandler = Arc<dyn Fn(Event) + Send + Sync>;

// ============================================================================
// EventRouter
// ============================================================================

/// Forwards decoded events to the current subscriber.
#[derive(Default)]
pub struct EventRouter {
    /// Current subscriber.
    handler: Mutex<Option<EventHandler>>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

impl EventRouter {
    /// Creates a router without subscriber.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the subscriber, replacing any previous one.
    pub fn subscribe(&self, handler: EventHandler) {
        *self.handler.lock() = Some(handler);
    }

    /// Removes the subscriber.
    pub fn unsubscribe(&self) {
        *self.handler.lock() = None;
    }

    /// Returns `true` if a subscriber is set.
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Delivers an event to the subscriber.
    ///
    /// Returns `false` if there was none and the event was dropped.
    pub fn dispatch(&self, event: Event) -> bool {
        let handler = self.handler.lock().clone();
        match handler {
            Some(handler) => {
                handler(event);
                true
            }
            None => {
                trace!(kind = event.kind(), "Event dropped, no subscriber");
                false
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str) -> Event {
        Event::Unknown {
            kind: kind.into(),
            fields: vec![],
        }
    }

    #[test]
    fn test_dispatch_without_subscriber_drops() {
        let router = EventRouter::new();
        assert!(!router.is_subscribed());
        assert!(!router.dispatch(event("A")));
    }

    #[test]
    fn test_subscribe_replaces_previous_handler() {
        let router = EventRouter::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&first);
        router.subscribe(Arc::new(move |e| sink.lock().push(e.kind().to_string())));
        assert!(router.dispatch(event("A")));

        let sink = Arc::clone(&second);
        router.subscribe(Arc::new(move |e| sink.lock().push(e.kind().to_string())));
        assert!(router.dispatch(event("B")));
        assert!(router.dispatch(event("C")));

        assert_eq!(*first.lock(), ["A"]);
        assert_eq!(*second.lock(), ["B", "C"]);
    }

    #[test]
    fn test_handler_may_replace_itself() {
        let router = Arc::new(EventRouter::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_router = Arc::clone(&router);
        let sink = Arc::clone(&seen);
        router.subscribe(Arc::new(move |e| {
            sink.lock().push(format!("first {}", e.kind()));
            let sink = Arc::clone(&sink);
            inner_router.subscribe(Arc::new(move |e| {
                sink.lock().push(format!("second {}", e.kind()));
            }));
        }));

        assert!(router.dispatch(event("A")));
        assert!(router.dispatch(event("B")));
        assert_eq!(*seen.lock(), ["first A", "second B"]);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let router = Arc::new(EventRouter::new());
        let inner_router = Arc::clone(&router);
        router.subscribe(Arc::new(move |_| inner_router.unsubscribe()));

        assert!(router.dispatch(event("A")));
        assert!(!router.is_subscribed());
        assert!(!router.dispatch(event("B")));
    }

    #[test]
    fn test_unsubscribe() {
        let router = EventRouter::new();
        router.subscribe(Arc::new(|_| {}));
        assert!(router.is_subscribed());

        router.unsubscribe();
        assert!(!router.is_subscribed());
        assert!(!router.dispatch(event("A")));
    }
}
