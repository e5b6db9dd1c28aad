use std::any::type_name;
use std::io::{BufRead, BufReader, Read, Write};

use conduit_core::{DataError, InputConverter, OutputConverter};
use serde::de::value::{Error as ValueError, StringDeserializer};
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::Serialize;
use serde_json::Value;

/// Plain text in and out.
///
/// Reading joins the stream's lines with `\n`, dropping a trailing line
/// break and normalising `\r\n`. The text is handed to the target type's
/// string deserializer, so `String` and string-like types are supported.
/// Writing accepts only values that serialize to a string, written raw.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextConverter;

impl TextConverter {
    /// Create the converter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn read_text(input: &mut dyn Read) -> Result<String, DataError> {
        let mut lines = Vec::new();
        for line in BufReader::new(input).lines() {
            lines.push(line.map_err(|source| DataError::io("reading text", source))?);
        }
        Ok(lines.join("\n"))
    }
}

impl<T: DeserializeOwned> InputConverter<T> for TextConverter {
    fn read(&self, input: &mut dyn Read) -> Result<Option<T>, DataError> {
        let text = Self::read_text(input)?;
        let deserializer: StringDeserializer<ValueError> = text.into_deserializer();
        T::deserialize(deserializer)
            .map(Some)
            .map_err(|err| DataError::conversion(format!("text into {}", type_name::<T>()), err))
    }
}

impl<T: Serialize> OutputConverter<T> for TextConverter {
    fn write(&self, value: &T, output: &mut dyn Write) -> Result<(), DataError> {
        let what = || format!("{} as text", type_name::<T>());
        match serde_json::to_value(value) {
            Ok(Value::String(text)) => output
                .write_all(text.as_bytes())
                .and_then(|()| output.flush())
                .map_err(|source| DataError::io("writing text", source)),
            Ok(other) => Err(DataError::conversion(
                what(),
                format!("expected a string, found {other}"),
            )),
            Err(err) => Err(DataError::conversion(what(), err)),
        }
    }
}
