//! Single-value observable.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::event::{StateChangeEvent, Subscription};
use crate::lifecycle::{Lifecycle, Observable};
use crate::{DataError, State};

struct Inner<T> {
    value: RefCell<Option<T>>,
    lifecycle: Lifecycle<ObservableObject<T>>,
}

/// Observable holding at most one value of type `T`.
///
/// Cloning yields another handle onto the same value and lifecycle.
///
/// ```
/// use conduit_core::{Observable, ObservableObject, State};
///
/// let object = ObservableObject::new();
/// object.set(Some(42));
/// object.mark_initialized();
/// assert!(object.set_state(State::Succeeded));
/// assert_eq!(object.get(), Some(42));
/// ```
pub struct ObservableObject<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for ObservableObject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> Default for ObservableObject<T> {
    fn default() -> Self {
        Self {
            inner: Rc::new(Inner {
                value: RefCell::new(None),
                lifecycle: Lifecycle::default(),
            }),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableObject")
            .field("value", &self.inner.value.borrow())
            .field("state", &self.inner.lifecycle.state())
            .field("initialized", &self.inner.lifecycle.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<T> ObservableObject<T> {
    /// Create an empty observable in [`State::Ready`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held value.
    pub fn set(&self, value: Option<T>) {
        *self.inner.value.borrow_mut() = value;
    }

    /// Take the held value out, leaving `None`.
    pub fn take(&self) -> Option<T> {
        self.inner.value.borrow_mut().take()
    }

    /// Whether a value is currently held.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.inner.value.borrow().is_some()
    }

    /// Borrow the held value for the duration of `f`.
    ///
    /// `f` must not call [`ObservableObject::set`] on the same observable.
    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.value.borrow().as_ref())
    }

    /// Whether two handles refer to the same observable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> ObservableObject<T> {
    /// Clone of the held value.
    #[must_use]
    pub fn get(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }
}

impl<T: 'static> Observable for ObservableObject<T> {
    fn state(&self) -> State {
        self.inner.lifecycle.state()
    }

    fn set_state(&self, next: State) -> bool {
        self.inner.lifecycle.transition(self, next)
    }

    fn is_initialized(&self) -> bool {
        self.inner.lifecycle.is_initialized()
    }

    fn mark_initialized(&self) {
        self.inner.lifecycle.mark_initialized();
    }

    fn exception(&self) -> Option<Arc<DataError>> {
        self.inner.lifecycle.exception()
    }

    fn set_exception(&self, error: Option<Arc<DataError>>) {
        self.inner.lifecycle.set_exception(error);
    }

    fn set_on(&self, state: State, handler: impl Fn(&StateChangeEvent<Self>) + 'static) {
        self.inner.lifecycle.notifier().set_primary(state, handler);
    }

    fn clear_on(&self, state: State) -> bool {
        self.inner.lifecycle.notifier().clear_primary(state)
    }

    fn subscribe(
        &self,
        state: State,
        handler: impl Fn(&StateChangeEvent<Self>) + 'static,
    ) -> Subscription {
        self.inner.lifecycle.notifier().subscribe(state, handler)
    }

    fn subscribe_all(&self, handler: impl Fn(&StateChangeEvent<Self>) + 'static) -> Subscription {
        self.inner.lifecycle.notifier().subscribe_all(handler)
    }

    fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.inner.lifecycle.notifier().unsubscribe(subscription)
    }
}
