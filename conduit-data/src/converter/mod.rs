//! Ready-made converters between byte streams and `serde` values.
//!
//! Field mapping is the `serde` derive of the target type; no converter
//! inspects types at runtime.

mod json;
mod text;
mod void;

pub use json::{JsonArrayConverter, JsonConverter};
pub use text::TextConverter;
pub use void::VoidConverter;

use std::any::type_name;
use std::io;

use conduit_core::DataError;

/// Map a `serde_json` failure onto the data error taxonomy.
pub(crate) fn json_error<T: ?Sized>(error: serde_json::Error) -> DataError {
    if error.is_io() {
        DataError::io(
            format!("streaming JSON for {}", type_name::<T>()),
            io::Error::from(error),
        )
    } else {
        DataError::conversion(format!("JSON for {}", type_name::<T>()), error)
    }
}
