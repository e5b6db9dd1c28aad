//! The lifecycle contract shared by object and list observables.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::event::{Notifier, StateChangeEvent, Subscription};
use crate::{DataError, State};

/// Common behaviour of [`ObservableObject`](crate::ObservableObject) and
/// [`ObservableList`](crate::ObservableList).
///
/// Implementors are cheap-to-clone handles onto shared, thread-confined
/// state. Every method must be called on the thread that created the
/// observable; the handles are `!Send`, so the compiler enforces this.
pub trait Observable: Clone + 'static {
    /// Current lifecycle state.
    fn state(&self) -> State;

    /// Move to `next` and notify subscribers.
    ///
    /// Returns `false` without notifying when the transition is refused
    /// because the observable is [`State::Cancelled`] (or, for lists, because
    /// `next` is [`State::Removed`]).
    fn set_state(&self, next: State) -> bool;

    /// Whether the observable was populated successfully at least once.
    fn is_initialized(&self) -> bool;

    /// Flag the observable as populated. The flag never resets.
    fn mark_initialized(&self);

    /// The error recorded by the most recent failure, if any.
    fn exception(&self) -> Option<Arc<DataError>>;

    /// Record or clear the last error.
    fn set_exception(&self, error: Option<Arc<DataError>>);

    /// Install the primary handler for `state`, replacing any previous one.
    fn set_on(&self, state: State, handler: impl Fn(&StateChangeEvent<Self>) + 'static);

    /// Remove the primary handler for `state`.
    fn clear_on(&self, state: State) -> bool;

    /// Subscribe to transitions into `state`.
    fn subscribe(
        &self,
        state: State,
        handler: impl Fn(&StateChangeEvent<Self>) + 'static,
    ) -> Subscription;

    /// Subscribe to every notifying transition.
    fn subscribe_all(&self, handler: impl Fn(&StateChangeEvent<Self>) + 'static) -> Subscription;

    /// Drop a subscription made with [`Observable::subscribe`] or
    /// [`Observable::subscribe_all`].
    fn unsubscribe(&self, subscription: Subscription) -> bool;
}

/// State, initialisation flag, last error, and handlers for one observable.
#[derive(Debug)]
pub(crate) struct Lifecycle<O> {
    state: Cell<State>,
    initialized: Cell<bool>,
    exception: RefCell<Option<Arc<DataError>>>,
    notifier: Notifier<O>,
}

impl<O> Default for Lifecycle<O> {
    fn default() -> Self {
        Self {
            state: Cell::new(State::Ready),
            initialized: Cell::new(false),
            exception: RefCell::new(None),
            notifier: Notifier::new(),
        }
    }
}

impl<O: Clone> Lifecycle<O> {
    pub(crate) fn state(&self) -> State {
        self.state.get()
    }

    pub(crate) fn transition(&self, source: &O, next: State) -> bool {
        let current = self.state.get();
        if !current.accepts_transitions() {
            log::warn!("ignoring transition {current} -> {next}: observable was cancelled");
            return false;
        }
        log::debug!("observable transition {current} -> {next}");
        self.state.set(next);
        if next.notifies() {
            self.notifier
                .fire(&StateChangeEvent::new(source.clone(), next));
        }
        true
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.set(true);
    }

    pub(crate) fn exception(&self) -> Option<Arc<DataError>> {
        self.exception.borrow().clone()
    }

    pub(crate) fn set_exception(&self, error: Option<Arc<DataError>>) {
        *self.exception.borrow_mut() = error;
    }

    pub(crate) const fn notifier(&self) -> &Notifier<O> {
        &self.notifier
    }
}
