use std::io::{Read, Write};

use conduit_core::{DataError, InputConverter, OutputConverter};

/// Reads nothing and writes nothing.
///
/// Used for bodiless responses such as `204 No Content`, and for `()`
/// payloads.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoidConverter;

impl<T> InputConverter<T> for VoidConverter {
    fn read(&self, _input: &mut dyn Read) -> Result<Option<T>, DataError> {
        Ok(None)
    }
}

impl<T> OutputConverter<T> for VoidConverter {
    fn write(&self, _value: &T, _output: &mut dyn Write) -> Result<(), DataError> {
        Ok(())
    }
}
