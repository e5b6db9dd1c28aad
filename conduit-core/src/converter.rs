//! Marshaling contracts between byte streams and values.

use std::io::{Read, Write};

use crate::DataError;
use crate::provider::ElementIter;

/// Turns a byte stream into a value.
pub trait InputConverter<T> {
    /// Read one value from `input`.
    ///
    /// `Ok(None)` is a valid outcome for converters that produce nothing,
    /// such as the void converter.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] when the stream fails and
    /// [`DataError::Conversion`] when the bytes do not describe a `T`.
    fn read(&self, input: &mut dyn Read) -> Result<Option<T>, DataError>;
}

/// Turns a value into bytes.
pub trait OutputConverter<T> {
    /// Write `value` to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Io`] when the stream fails and
    /// [`DataError::Conversion`] when `value` cannot be represented.
    fn write(&self, value: &T, output: &mut dyn Write) -> Result<(), DataError>;
}

/// Turns a byte stream into a sequence of values.
pub trait IterableInputConverter<E> {
    /// Consume `input` and iterate over the elements it describes.
    ///
    /// # Errors
    ///
    /// Returns an error when the stream cannot be read or is not a sequence.
    fn iterate<'a>(&self, input: Box<dyn Read + 'a>) -> Result<ElementIter<'a, E>, DataError>;
}

impl<T, C: InputConverter<T> + ?Sized> InputConverter<T> for Box<C> {
    fn read(&self, input: &mut dyn Read) -> Result<Option<T>, DataError> {
        (**self).read(input)
    }
}

impl<T, C: OutputConverter<T> + ?Sized> OutputConverter<T> for Box<C> {
    fn write(&self, value: &T, output: &mut dyn Write) -> Result<(), DataError> {
        (**self).write(value, output)
    }
}

impl<E, C: IterableInputConverter<E> + ?Sized> IterableInputConverter<E> for Box<C> {
    fn iterate<'a>(&self, input: Box<dyn Read + 'a>) -> Result<ElementIter<'a, E>, DataError> {
        (**self).iterate(input)
    }
}
