// events.rs - Construction lifecycle notifications

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::animation::Phase;
use crate::maze::Grid;

/// Notifications emitted by the construction sequencer
#[derive(Debug, Clone)]
pub enum MazeEvent {
    GenerationStarted,
    PhaseChanged(Phase),
    FocusedOnGoal,
    GenerationCompleted(Rc<Grid>),
    GoalCellEntered,
}

type Handler<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Subscribers<E> {
    next_id: u64,
    handlers: Vec<(u64, Handler<E>)>,
}

/// Single-threaded publish/subscribe hub.
///
/// Handlers may subscribe or unsubscribe while an event is being delivered.
/// A handler dropped mid-delivery is not called for the rest of that event.
pub struct EventBus<E> {
    subscribers: Rc<RefCell<Subscribers<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            subscribers: self.subscribers.clone(),
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Subscribers {
                next_id: 0,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register `handler`; it stays registered until the returned subscription drops
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let mut subscribers = self.subscribers.borrow_mut();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        let handler: Handler<E> = Rc::new(RefCell::new(handler));
        subscribers.handlers.push((id, handler));

        let weak: Weak<RefCell<Subscribers<E>>> = Rc::downgrade(&self.subscribers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(subscribers) = weak.upgrade() {
                    // The handler may own other subscriptions; drop it after the borrow ends
                    let removed = {
                        let mut subscribers = subscribers.borrow_mut();
                        let index = subscribers.handlers.iter().position(|(h, _)| *h == id);
                        index.map(|i| subscribers.handlers.remove(i))
                    };
                    drop(removed);
                }
            })),
        }
    }

    pub fn emit(&self, event: &E) {
        let snapshot: Vec<(u64, Handler<E>)> = self.subscribers.borrow().handlers.clone();

        for (id, handler) in snapshot {
            let still_subscribed = self
                .subscribers
                .borrow()
                .handlers
                .iter()
                .any(|(h, _)| *h == id);
            if !still_subscribed {
                continue;
            }
            // A handler that re-emits does not receive its own nested event
            if let Ok(mut handler) = handler.try_borrow_mut() {
                (*handler)(event);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().handlers.len()
    }
}

/// Keeps a handler registered. Unsubscribes on drop.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Keep the handler registered for the life of the bus
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
