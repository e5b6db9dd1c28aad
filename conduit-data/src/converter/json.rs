use std::fmt;
use std::io::{Read, Write};
use std::marker::PhantomData;

use conduit_core::{DataError, ElementIter, InputConverter, IterableInputConverter, OutputConverter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::json_error;

/// Reads and writes a single JSON document.
///
/// A JSON `null` reads as `None`.
pub struct JsonConverter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonConverter<T> {
    /// Create the converter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonConverter")
    }
}

impl<T: DeserializeOwned> InputConverter<T> for JsonConverter<T> {
    fn read(&self, input: &mut dyn Read) -> Result<Option<T>, DataError> {
        serde_json::from_reader::<_, Option<T>>(input).map_err(json_error::<T>)
    }
}

impl<T: Serialize> OutputConverter<T> for JsonConverter<T> {
    fn write(&self, value: &T, output: &mut dyn Write) -> Result<(), DataError> {
        serde_json::to_writer(&mut *output, value).map_err(json_error::<T>)?;
        output
            .flush()
            .map_err(|source| DataError::io("flushing a JSON document", source))
    }
}

/// Reads a JSON array as a sequence of elements.
///
/// The array is parsed up front; elements are converted lazily, so a
/// malformed element fails the iteration at its position. `null` elements
/// yield `None`.
pub struct JsonArrayConverter<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E> JsonArrayConverter<E> {
    /// Create the converter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E> Default for JsonArrayConverter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for JsonArrayConverter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonArrayConverter")
    }
}

impl<E: DeserializeOwned> IterableInputConverter<E> for JsonArrayConverter<E> {
    fn iterate<'a>(&self, input: Box<dyn Read + 'a>) -> Result<ElementIter<'a, E>, DataError> {
        let values: Vec<Value> = serde_json::from_reader(input).map_err(json_error::<Vec<E>>)?;
        Ok(Box::new(values.into_iter().map(|value| {
            serde_json::from_value::<Option<E>>(value).map_err(json_error::<E>)
        })))
    }
}
