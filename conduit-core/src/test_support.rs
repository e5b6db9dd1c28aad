//! Scripted collaborators used by unit and behaviour tests.
//!
//! Each stub replays a fixed outcome and records how often it was called, so
//! tests can drive the dispatcher without real I/O.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::provider::ElementIter;
use crate::{DataError, ListDataReader, ObjectDataReader, ObjectDataRemover, ObjectDataWriter};

/// Outcome a stub replays.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    /// Return the value.
    Value(Option<T>),
    /// Fail with a domain error carrying this message.
    Fail(String),
    /// Raise the cancellation signal.
    Cancel,
    /// Panic with this message.
    Panic(String),
}

impl<T: Clone> Scripted<T> {
    #[expect(
        clippy::panic_in_result_fn,
        reason = "scripted panics exercise the worker firewall"
    )]
    fn replay(&self) -> Result<Option<T>, DataError> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Fail(message) => Err(DataError::domain(message.clone())),
            Self::Cancel => Err(DataError::Cancelled),
            Self::Panic(message) => panic!("{message}"),
        }
    }
}

/// Shared call counter.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    /// Number of recorded calls.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// [`ObjectDataReader`] replaying a scripted outcome.
#[derive(Debug, Clone)]
pub struct StubObjectReader<T> {
    outcome: Scripted<T>,
    calls: Calls,
}

impl<T> StubObjectReader<T> {
    /// Reader returning `value`.
    #[must_use]
    pub fn with_value(value: T) -> Self {
        Self::scripted(Scripted::Value(Some(value)))
    }

    /// Reader failing with a domain error.
    #[must_use]
    pub fn with_error(message: impl Into<String>) -> Self {
        Self::scripted(Scripted::Fail(message.into()))
    }

    /// Reader replaying `outcome`.
    #[must_use]
    pub fn scripted(outcome: Scripted<T>) -> Self {
        Self {
            outcome,
            calls: Calls::default(),
        }
    }

    /// Counter shared with every clone of this reader.
    #[must_use]
    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }
}

impl<T: Clone> ObjectDataReader<T> for StubObjectReader<T> {
    fn read_object(&mut self) -> Result<Option<T>, DataError> {
        self.calls.record();
        self.outcome.replay()
    }
}

/// [`ObjectDataWriter`] recording written values.
#[derive(Debug, Clone)]
pub struct StubObjectWriter<T> {
    echo: Scripted<T>,
    written: Arc<Mutex<Vec<T>>>,
}

impl<T> StubObjectWriter<T> {
    /// Writer that echoes nothing back.
    #[must_use]
    pub fn silent() -> Self {
        Self::scripted(Scripted::Value(None))
    }

    /// Writer that replays `echo` after recording the value.
    #[must_use]
    pub fn scripted(echo: Scripted<T>) -> Self {
        Self {
            echo,
            written: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> StubObjectWriter<T> {
    /// Values written so far.
    #[must_use]
    pub fn written(&self) -> Vec<T> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone> ObjectDataWriter<T> for StubObjectWriter<T> {
    fn write_object(&mut self, value: &T) -> Result<Option<T>, DataError> {
        self.written
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.clone());
        self.echo.replay()
    }
}

/// [`ObjectDataRemover`] recording the values it was asked to remove.
#[derive(Debug, Clone)]
pub struct StubObjectRemover<T> {
    outcome: Scripted<T>,
    removed: Arc<Mutex<Vec<Option<T>>>>,
}

impl<T> StubObjectRemover<T> {
    /// Remover that succeeds and leaves the observable empty.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::scripted(Scripted::Value(None))
    }

    /// Remover replaying `outcome`.
    #[must_use]
    pub fn scripted(outcome: Scripted<T>) -> Self {
        Self {
            outcome,
            removed: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> StubObjectRemover<T> {
    /// Snapshots handed to the remover so far.
    #[must_use]
    pub fn removed(&self) -> Vec<Option<T>> {
        self.removed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Clone> ObjectDataRemover<T> for StubObjectRemover<T> {
    fn remove_object(&mut self, current: Option<&T>) -> Result<Option<T>, DataError> {
        self.removed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(current.cloned());
        self.outcome.replay()
    }
}

/// [`ListDataReader`] yielding a scripted element sequence.
#[derive(Debug, Clone)]
pub struct StubListReader<E> {
    elements: Vec<Scripted<E>>,
}

impl<E> StubListReader<E> {
    /// Reader yielding `elements`; `None` entries are holes the dispatcher skips.
    #[must_use]
    pub fn with_elements(elements: impl IntoIterator<Item = Option<E>>) -> Self {
        Self {
            elements: elements.into_iter().map(Scripted::Value).collect(),
        }
    }

    /// Reader replaying `elements`, which may include failures.
    #[must_use]
    pub fn scripted(elements: impl IntoIterator<Item = Scripted<E>>) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }
}

impl<E: Clone> ListDataReader<E> for StubListReader<E> {
    fn iterator(&mut self) -> Result<ElementIter<'_, E>, DataError> {
        Ok(Box::new(self.elements.iter().map(Scripted::replay)))
    }
}
