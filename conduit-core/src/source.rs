//! Raw byte-stream contracts.

use std::io::{Read, Write};

use crate::DataError;

/// Something that can be read as a byte stream.
pub trait InputDataSource {
    /// Open the stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying resource cannot be opened.
    fn input_stream(&mut self) -> Result<Box<dyn Read + '_>, DataError>;
}

/// Something that can be written as a byte stream.
pub trait OutputDataSource {
    /// Open the stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying resource cannot be opened.
    fn output_stream(&mut self) -> Result<Box<dyn Write + '_>, DataError>;
}

/// Output data source wrapping any writer.
///
/// ```
/// use std::io::Write;
/// use conduit_core::{OutputDataSource, WriterDataSource};
///
/// let mut source = WriterDataSource::new(Vec::new());
/// source.output_stream()?.write_all(b"hello")?;
/// assert_eq!(source.into_inner(), b"hello");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct WriterDataSource<W> {
    writer: W,
}

impl<W: Write> WriterDataSource<W> {
    /// Wrap `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputDataSource for WriterDataSource<W> {
    fn output_stream(&mut self) -> Result<Box<dyn Write + '_>, DataError> {
        Ok(Box::new(&mut self.writer))
    }
}
