//! Priority-filtered UI event dispatch.
//!
//! The dispatcher is an ordinary value: construct one, hand it to whatever
//! needs to publish or subscribe, drop it when done. Nothing here is a
//! process-wide singleton, so tests and embedders can run several isolated
//! dispatchers side by side.

use crossterm::event::{KeyEvent, MouseEvent};
use tracing::trace;

use crate::window::{Position, Size};

/// Delivery priority of a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventPriority {
    /// Housekeeping, deliverable whenever.
    Low,
    /// Default.
    Normal,
    /// User input.
    High,
    /// Must not be dropped (shutdown, resize).
    Critical,
}

/// A UI event with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// A window was created.
    WindowCreated {
        /// Window id.
        id: String,
    },
    /// A window was closed.
    WindowClosed {
        /// Window id.
        id: String,
    },
    /// A window took focus.
    WindowActivated {
        /// Window id.
        id: String,
    },
    /// A window moved.
    WindowMoved {
        /// Window id.
        id: String,
        /// New top-left corner.
        position: Position,
    },
    /// A window changed size.
    WindowResized {
        /// Window id.
        id: String,
        /// New extent.
        size: Size,
    },
    /// Terminal key input.
    Key(KeyEvent),
    /// Terminal mouse input.
    Mouse(MouseEvent),
    /// The terminal itself was resized.
    ScreenResized {
        /// New width in cells.
        width: u16,
        /// New height in cells.
        height: u16,
    },
}

/// Payload-free tag for event matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// [`UiEvent::WindowCreated`].
    WindowCreated,
    /// [`UiEvent::WindowClosed`].
    WindowClosed,
    /// [`UiEvent::WindowActivated`].
    WindowActivated,
    /// [`UiEvent::WindowMoved`].
    WindowMoved,
    /// [`UiEvent::WindowResized`].
    WindowResized,
    /// [`UiEvent::Key`].
    Key,
    /// [`UiEvent::Mouse`].
    Mouse,
    /// [`UiEvent::ScreenResized`].
    ScreenResized,
}

impl UiEvent {
    /// The tag of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            UiEvent::WindowCreated { .. } => EventKind::WindowCreated,
            UiEvent::WindowClosed { .. } => EventKind::WindowClosed,
            UiEvent::WindowActivated { .. } => EventKind::WindowActivated,
            UiEvent::WindowMoved { .. } => EventKind::WindowMoved,
            UiEvent::WindowResized { .. } => EventKind::WindowResized,
            UiEvent::Key(_) => EventKind::Key,
            UiEvent::Mouse(_) => EventKind::Mouse,
            UiEvent::ScreenResized { .. } => EventKind::ScreenResized,
        }
    }
}

/// What a subscriber wants to hear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Everything.
    Any,
    /// Only events of one kind.
    Kind(EventKind),
}

impl EventFilter {
    fn matches(self, event: &UiEvent) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Kind(kind) => event.kind() == kind,
        }
    }
}

/// Token returned by [`EventDispatcher::subscribe`]; pass back to
/// [`EventDispatcher::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

type Handler = Box<dyn FnMut(&UiEvent)>;

struct Subscriber {
    id: u64,
    filter: EventFilter,
    min_priority: EventPriority,
    handler: Handler,
}

/// Single-threaded pub/sub hub with per-subscriber priority floors.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl EventDispatcher {
    /// Empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It fires for every published event matching
    /// `filter` whose priority is at least `min_priority`.
    pub fn subscribe(
        &mut self,
        filter: EventFilter,
        min_priority: EventPriority,
        handler: impl FnMut(&UiEvent) + 'static,
    ) -> Subscription {
        self.next_id += 1;
        let id = self.next_id;
        self.subscribers.push(Subscriber {
            id,
            filter,
            min_priority,
            handler: Box::new(handler),
        });
        Subscription(id)
    }

    /// Remove a handler. Unknown tokens are no-ops.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        self.subscribers.retain(|s| s.id != subscription.0);
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver an event to every matching subscriber, in subscription
    /// order.
    pub fn publish(&mut self, event: &UiEvent, priority: EventPriority) {
        trace!(kind = ?event.kind(), ?priority, "publish");
        for subscriber in &mut self.subscribers {
            if priority >= subscriber.min_priority && subscriber.filter.matches(event) {
                (subscriber.handler)(event);
            }
        }
    }

    /// Drop every handler.
    pub fn clear(&mut self) {
        self.subscribers.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter() -> (Rc<RefCell<u32>>, impl FnMut(&UiEvent)) {
        let count = Rc::new(RefCell::new(0));
        let inner = Rc::clone(&count);
        (count, move |_event: &UiEvent| {
            *inner.borrow_mut() += 1;
        })
    }

    #[test]
    fn kind_filter_selects_events() {
        let mut dispatcher = EventDispatcher::new();
        let (count, handler) = counter();
        dispatcher.subscribe(
            EventFilter::Kind(EventKind::WindowClosed),
            EventPriority::Low,
            handler,
        );

        dispatcher.publish(
            &UiEvent::WindowCreated { id: "w1".into() },
            EventPriority::Normal,
        );
        dispatcher.publish(
            &UiEvent::WindowClosed { id: "w1".into() },
            EventPriority::Normal,
        );

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn wildcard_hears_everything_above_its_floor() {
        let mut dispatcher = EventDispatcher::new();
        let (count, handler) = counter();
        dispatcher.subscribe(EventFilter::Any, EventPriority::High, handler);

        dispatcher.publish(
            &UiEvent::WindowCreated { id: "w1".into() },
            EventPriority::Normal,
        );
        dispatcher.publish(
            &UiEvent::ScreenResized {
                width: 80,
                height: 25,
            },
            EventPriority::Critical,
        );

        // Only the critical event cleared the High floor.
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut dispatcher = EventDispatcher::new();
        let (count, handler) = counter();
        let token = dispatcher.subscribe(EventFilter::Any, EventPriority::Low, handler);

        dispatcher.publish(
            &UiEvent::WindowActivated { id: "w1".into() },
            EventPriority::Normal,
        );
        dispatcher.unsubscribe(token);
        dispatcher.publish(
            &UiEvent::WindowActivated { id: "w1".into() },
            EventPriority::Normal,
        );

        assert_eq!(*count.borrow(), 1);
        // Stale token unsubscribes are harmless.
        dispatcher.unsubscribe(token);
    }

    #[test]
    fn handlers_observe_payloads() {
        let mut dispatcher = EventDispatcher::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let inner = Rc::clone(&seen);
        dispatcher.subscribe(
            EventFilter::Kind(EventKind::WindowMoved),
            EventPriority::Low,
            move |event| {
                if let UiEvent::WindowMoved { id, position } = event {
                    inner.borrow_mut().push((id.clone(), *position));
                }
            },
        );

        dispatcher.publish(
            &UiEvent::WindowMoved {
                id: "w1".into(),
                position: Position { x: 4, y: 7 },
            },
            EventPriority::Normal,
        );

        assert_eq!(
            seen.borrow().as_slice(),
            &[("w1".to_owned(), Position { x: 4, y: 7 })]
        );
    }

    #[test]
    fn clear_drops_all_subscribers() {
        let mut dispatcher = EventDispatcher::new();
        let (count, handler) = counter();
        dispatcher.subscribe(EventFilter::Any, EventPriority::Low, handler);
        assert_eq!(dispatcher.subscriber_count(), 1);

        dispatcher.clear();
        dispatcher.publish(
            &UiEvent::WindowCreated { id: "w1".into() },
            EventPriority::Critical,
        );

        assert_eq!(dispatcher.subscriber_count(), 0);
        assert_eq!(*count.borrow(), 0);
    }
}
