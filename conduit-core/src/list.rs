//! Ordered-sequence observable.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::event::{StateChangeEvent, Subscription};
use crate::lifecycle::{Lifecycle, Observable};
use crate::{DataError, State};

/// A structural change applied to an [`ObservableList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    /// An element was inserted at `index`.
    Added {
        /// Position of the new element.
        index: usize,
    },
    /// The element at `index` was replaced.
    Replaced {
        /// Position of the replaced element.
        index: usize,
    },
    /// The element previously at `index` was removed.
    Removed {
        /// Former position of the removed element.
        index: usize,
    },
    /// Every element was removed.
    Cleared,
}

type ChangeListener<E> = Rc<dyn Fn(&ObservableList<E>, ListChange)>;

struct Inner<E> {
    items: RefCell<Vec<E>>,
    listeners: RefCell<Vec<ChangeListener<E>>>,
    lifecycle: Lifecycle<ObservableList<E>>,
}

/// Observable holding an ordered, index-addressable sequence.
///
/// Every mutation is reported to the listeners registered with
/// [`ObservableList::on_change`] as soon as it is applied.
pub struct ObservableList<E> {
    inner: Rc<Inner<E>>,
}

impl<E> Clone for ObservableList<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for ObservableList<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(Inner {
                items: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                lifecycle: Lifecycle::default(),
            }),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ObservableList<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.inner.items.borrow())
            .field("state", &self.inner.lifecycle.state())
            .field("initialized", &self.inner.lifecycle.is_initialized())
            .finish_non_exhaustive()
    }
}

impl<E> ObservableList<E> {
    /// Create an empty list in [`State::Ready`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Whether the list holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Borrow the elements for the duration of `f`.
    pub fn with_items<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Append `element` at the end.
    pub fn push(&self, element: E) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(element);
            items.len().saturating_sub(1)
        };
        self.notify(ListChange::Added { index });
    }

    /// Insert `element` at `index`, shifting later elements.
    ///
    /// Returns the element back when `index` is past the end.
    pub fn insert(&self, index: usize, element: E) -> Result<(), E> {
        {
            let mut items = self.inner.items.borrow_mut();
            if index > items.len() {
                return Err(element);
            }
            items.insert(index, element);
        }
        self.notify(ListChange::Added { index });
        Ok(())
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// Returns the new element back when `index` is out of bounds.
    pub fn replace(&self, index: usize, element: E) -> Result<E, E> {
        let previous = {
            let mut items = self.inner.items.borrow_mut();
            match items.get_mut(index) {
                Some(slot) => std::mem::replace(slot, element),
                None => return Err(element),
            }
        };
        self.notify(ListChange::Replaced { index });
        Ok(previous)
    }

    /// Remove and return the element at `index`.
    pub fn remove(&self, index: usize) -> Option<E> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            (index < items.len()).then(|| items.remove(index))
        }?;
        self.notify(ListChange::Removed { index });
        Some(removed)
    }

    /// Remove every element.
    pub fn clear(&self) {
        self.inner.items.borrow_mut().clear();
        self.notify(ListChange::Cleared);
    }

    /// Register a listener for structural changes.
    pub fn on_change(&self, listener: impl Fn(&Self, ListChange) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Whether two handles refer to the same list.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn notify(&self, change: ListChange) {
        let listeners: Vec<ChangeListener<E>> =
            self.inner.listeners.borrow().iter().cloned().collect();
        for listener in listeners {
            listener(self, change);
        }
    }
}

impl<E: Clone> ObservableList<E> {
    /// Clone of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<E> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Clone of every element, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<E> {
        self.inner.items.borrow().clone()
    }
}

impl<E: 'static> Observable for ObservableList<E> {
    fn state(&self) -> State {
        self.inner.lifecycle.state()
    }

    fn set_state(&self, next: State) -> bool {
        if next == State::Removed {
            log::warn!("ignoring {next} transition on a list observable");
            return false;
        }
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
