//! Physics events and listener dispatch
//!
//! Events raised while a step runs are queued and delivered after the step,
//! synchronously and in the order they were raised. A listener returning
//! [`ControlFlow::Break`] stops that event from reaching later listeners.

use std::ops::ControlFlow;

use crate::body::BodyHandle;
use crate::constraints::ConstraintHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicsEvent {
    /// A manifold was created for the pair
    ContactBegin { a: BodyHandle, b: BodyHandle },
    /// The pair's manifold lost its last point
    ContactEnd { a: BodyHandle, b: BodyHandle },
    /// A joint exceeded its breaking impulse and was deactivated
    ConstraintBroken(ConstraintHandle),
}

pub type Listener = Box<dyn FnMut(&PhysicsEvent) -> ControlFlow<()>>;

/// Ordered list of event listeners
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<Listener>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&PhysicsEvent) -> ControlFlow<()> + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver one event. Returns `false` if a listener cancelled delivery.
    pub fn emit(&mut self, event: &PhysicsEvent) -> bool {
        for listener in &mut self.listeners {
            if listener(event).is_break() {
                return false;
            }
        }
        true
    }

    /// Deliver and drain a queue of events in order
    pub fn flush(&mut self, queue: &mut Vec<PhysicsEvent>) {
        for event in queue.drain(..) {
            self.emit(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_break_stops_later_listeners() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();

        let first = Rc::clone(&seen);
        dispatcher.add_listener(move |_| {
            first.borrow_mut().push("first");
            ControlFlow::Break(())
        });
        let second = Rc::clone(&seen);
        dispatcher.add_listener(move |_| {
            second.borrow_mut().push("second");
            ControlFlow::Continue(())
        });

        let delivered = dispatcher.emit(&PhysicsEvent::ContactBegin {
            a: BodyHandle(0),
            b: BodyHandle(1),
        });
        assert!(!delivered);
        assert_eq!(*seen.borrow(), vec!["first"]);
    }

    #[test]
    fn test_flush_preserves_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        let sink = Rc::clone(&seen);
        dispatcher.add_listener(move |event| {
            sink.borrow_mut().push(*event);
            ControlFlow::Continue(())
        });

        let begin = PhysicsEvent::ContactBegin { a: BodyHandle(0), b: BodyHandle(1) };
        let end = PhysicsEvent::ContactEnd { a: BodyHandle(0), b: BodyHandle(1) };
        let mut queue = vec![begin, end];
        dispatcher.flush(&mut queue);

        assert!(queue.is_empty());
        assert_eq!(*seen.borrow(), vec![begin, end]);
    }
}
