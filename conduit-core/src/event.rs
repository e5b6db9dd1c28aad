//! State-change notification plumbing.
//!
//! Each observable owns a [`Notifier`]. Handlers live in three tiers and are
//! invoked in a fixed order for every event:
//!
//! 1. subscribers registered for the event's state, in registration order;
//! 2. the primary handler slot for that state, if set;
//! 3. subscribers registered for every state, in registration order.
//!
//! Handlers run on the confinement thread with no internal borrow held, so a
//! handler may subscribe, unsubscribe, or replace slots on the same notifier.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::State;

/// Event delivered when an observable enters a new state.
#[derive(Debug, Clone)]
pub struct StateChangeEvent<O> {
    source: O,
    state: State,
}

impl<O> StateChangeEvent<O> {
    /// Create an event for `source` entering `state`.
    pub const fn new(source: O, state: State) -> Self {
        Self { source, state }
    }

    /// The observable that changed state.
    pub const fn source(&self) -> &O {
        &self.source
    }

    /// The state that was entered.
    pub const fn state(&self) -> State {
        self.state
    }
}

/// Handle returned by subscriptions; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Handler<O> = Rc<dyn Fn(&StateChangeEvent<O>)>;

struct Entry<O> {
    id: Subscription,
    filter: Option<State>,
    handler: Handler<O>,
}

/// Ordered handler registry for one observable.
pub struct Notifier<O> {
    primary: RefCell<Vec<(State, Handler<O>)>>,
    subscribers: RefCell<Vec<Entry<O>>>,
    next_id: Cell<u64>,
}

impl<O> Default for Notifier<O> {
    fn default() -> Self {
        Self {
            primary: RefCell::new(Vec::new()),
            subscribers: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }
}

impl<O> fmt::Debug for Notifier<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let primary: Vec<State> = self.primary.borrow().iter().map(|(s, _)| *s).collect();
        f.debug_struct("Notifier")
            .field("primary", &primary)
            .field("subscribers", &self.subscribers.borrow().len())
            .finish()
    }
}

impl<O> Notifier<O> {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the primary handler for `state`, replacing any previous one.
    pub fn set_primary(&self, state: State, handler: impl Fn(&StateChangeEvent<O>) + 'static) {
        let mut slots = self.primary.borrow_mut();
        slots.retain(|(slot, _)| *slot != state);
        slots.push((state, Rc::new(handler)));
    }

    /// Remove the primary handler for `state`.
    ///
    /// Returns `true` when a handler was installed.
    pub fn clear_primary(&self, state: State) -> bool {
        let mut slots = self.primary.borrow_mut();
        let before = slots.len();
        slots.retain(|(slot, _)| *slot != state);
        slots.len() != before
    }

    /// Subscribe to events for a single state.
    pub fn subscribe(
        &self,
        state: State,
        handler: impl Fn(&StateChangeEvent<O>) + 'static,
    ) -> Subscription {
        self.register(Some(state), Rc::new(handler))
    }

    /// Subscribe to events for every state.
    pub fn subscribe_all(&self, handler: impl Fn(&StateChangeEvent<O>) + 'static) -> Subscription {
        self.register(None, Rc::new(handler))
    }

    /// Drop a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != subscription);
        subscribers.len() != before
    }

    /// Deliver `event` to every matching handler in tier order.
    pub fn fire(&self, event: &StateChangeEvent<O>) {
        let state = event.state();
        // Snapshot first: handlers may mutate the registry re-entrantly.
        let (specific, any): (Vec<Handler<O>>, Vec<Handler<O>>) = {
            let subscribers = self.subscribers.borrow();
            let specific = subscribers
                .iter()
                .filter(|entry| entry.filter == Some(state))
                .map(|entry| Rc::clone(&entry.handler))
                .collect();
            let any = subscribers
                .iter()
                .filter(|entry| entry.filter.is_none())
                .map(|entry| Rc::clone(&entry.handler))
                .collect();
            (specific, any)
        };
        let primary = self
            .primary
            .borrow()
            .iter()
            .find(|(slot, _)| *slot == state)
            .map(|(_, handler)| Rc::clone(handler));

        for handler in specific.iter().chain(primary.iter()).chain(any.iter()) {
            handler(event);
        }
    }

    fn register(&self, filter: Option<State>, handler: Handler<O>) -> Subscription {
        let id = Subscription(self.next_id.get());
        self.next_id.set(self.next_id.get().wrapping_add(1));
        self.subscribers.borrow_mut().push(Entry {
            id,
            filter,
            handler,
        });
        id
    }
}
