//! # EventBus — Typed Broadcast Within a World
//!
//! Handlers subscribe to an event *type*; emitting a value of that type
//! calls every subscribed handler in registration order. Dispatch is
//! synchronous and immediate — there is no event queue, an `emit` returns
//! only after the last handler has run.
//!
//! The bus stores handlers type-erased (`FnMut(&dyn Any)`) keyed by the
//! registry-assigned [`EventId`]; the typed wrapper that downcasts back to
//! `&E` is built in [`World::connect`](super::world::World::connect), so the
//! downcast can't fail in practice.

use std::any::Any;
use std::collections::HashMap;

use crate::ecs::registry::EventId;

/// Ticket for a registered handler, used to disconnect it later.
///
/// Ids are issued from a bus-wide monotonic counter and never reused, so a
/// stale ticket disconnects nothing rather than someone else's handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct EventHandler {
    id: HandlerId,
    func: Box<dyn FnMut(&dyn Any)>,
}

/// Registration-ordered handler lists, one per event kind.
pub(crate) struct EventBus {
    handlers: HashMap<EventId, Vec<EventHandler>>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            next_id: 0,
        }
    }

    /// Appends a handler to the list for `event` and returns its ticket.
    pub fn connect(&mut self, event: EventId, func: Box<dyn FnMut(&dyn Any)>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(event)
            .or_default()
            .push(EventHandler { id, func });
        id
    }

    /// Calls every handler for `event` in registration order. Unknown events
    /// are a no-op.
    pub fn emit(&mut self, event: EventId, value: &dyn Any) {
        if let Some(list) = self.handlers.get_mut(&event) {
            for handler in list.iter_mut() {
                (handler.func)(value);
            }
        }
    }

    /// Removes the handler with the given ticket. Returns whether one was
    /// removed.
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|h| h.id == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Removes every handler for `event`.
    pub fn disconnect_all(&mut self, event: EventId) {
        self.handlers.remove(&event);
    }

    /// Drops every handler for every event kind.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Box<dyn FnMut(&dyn Any)> {
        let log = Rc::clone(log);
        Box::new(move |_| log.borrow_mut().push(tag))
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.connect(EventId(0), recorder(&log, "first"));
        bus.connect(EventId(0), recorder(&log, "second"));
        bus.emit(EventId(0), &());
        bus.emit(EventId(0), &());
        assert_eq!(*log.borrow(), ["first", "second", "first", "second"]);
    }

    #[test]
    fn emit_unknown_event_is_a_noop() {
        let mut bus = EventBus::new();
        bus.emit(EventId(7), &());
    }

    #[test]
    fn handlers_see_the_payload() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&seen);
        bus.connect(
            EventId(0),
            Box::new(move |value| {
                *sink.borrow_mut() = *value.downcast_ref::<u32>().unwrap();
            }),
        );
        bus.emit(EventId(0), &42u32);
        assert_eq!(*seen.borrow(), 42);
    }

    #[test]
    fn disconnect_removes_exactly_one_handler() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = bus.connect(EventId(0), recorder(&log, "a"));
        bus.connect(EventId(0), recorder(&log, "b"));
        assert!(bus.disconnect(a));
        assert!(!bus.disconnect(a)); // ticket is spent
        bus.emit(EventId(0), &());
        assert_eq!(*log.borrow(), ["b"]);
    }

    #[test]
    fn disconnect_all_clears_one_kind_only() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        bus.connect(EventId(0), recorder(&log, "zero"));
        bus.connect(EventId(1), recorder(&log, "one"));
        bus.disconnect_all(EventId(0));
        bus.emit(EventId(0), &());
        bus.emit(EventId(1), &());
        assert_eq!(*log.borrow(), ["one"]);
    }

    #[test]
    fn tickets_are_never_reused() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = bus.connect(EventId(0), recorder(&log, "a"));
        bus.disconnect(a);
        let b = bus.connect(EventId(0), recorder(&log, "b"));
        assert_ne!(a, b);
    }
}
