//! Collaborator contracts executed on worker threads.
//!
//! Each contract pairs one blocking domain call with a factory for the
//! observable it populates. The factory runs on the confinement thread before
//! the collaborator is moved to a worker; the domain call runs on the worker.

use crate::{DataError, ObservableList, ObservableObject};

/// Iterator over list elements; `None` items are skipped by the dispatcher.
pub type ElementIter<'a, E> = Box<dyn Iterator<Item = Result<Option<E>, DataError>> + 'a>;

/// Reads a single object.
///
/// ```
/// use conduit_core::{DataError, ObjectDataReader};
///
/// struct Fixed(u32);
///
/// impl ObjectDataReader<u32> for Fixed {
///     fn read_object(&mut self) -> Result<Option<u32>, DataError> {
///         Ok(Some(self.0))
///     }
/// }
///
/// assert_eq!(Fixed(7).read_object()?, Some(7));
/// # Ok::<(), DataError>(())
/// ```
pub trait ObjectDataReader<T> {
    /// Observable that will receive the result.
    fn create_observable(&self) -> ObservableObject<T> {
        ObservableObject::new()
    }

    /// Read the object. `Ok(None)` means the source holds no value.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Cancelled`] to cancel the operation, or any other
    /// variant to fail it.
    fn read_object(&mut self) -> Result<Option<T>, DataError>;
}

/// Persists a single object.
pub trait ObjectDataWriter<T> {
    /// Observable that will receive the stored value.
    fn create_observable(&self) -> ObservableObject<T> {
        ObservableObject::new()
    }

    /// Write `value`, returning the value as the destination now holds it.
    ///
    /// `Ok(None)` means the destination echoed nothing back; the dispatcher
    /// then keeps `value` itself.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Cancelled`] to cancel the operation, or any other
    /// variant to fail it.
    fn write_object(&mut self, value: &T) -> Result<Option<T>, DataError>;
}

/// Deletes the object behind an observable.
pub trait ObjectDataRemover<T> {
    /// Remove the object whose last known value is `current`.
    ///
    /// Returns the value the observable should hold afterwards, usually
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Cancelled`] to cancel the operation, or any other
    /// variant to fail it.
    fn remove_object(&mut self, current: Option<&T>) -> Result<Option<T>, DataError>;
}

/// Reads a sequence of elements.
pub trait ListDataReader<E> {
    /// Observable that will receive the elements.
    fn create_observable(&self) -> ObservableList<E> {
        ObservableList::new()
    }

    /// Open the element iterator.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be opened. Errors yielded by
    /// the iterator itself end the retrieval after the elements already
    /// produced.
    fn iterator(&mut self) -> Result<ElementIter<'_, E>, DataError>;
}
