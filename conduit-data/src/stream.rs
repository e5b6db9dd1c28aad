//! Providers pairing any data source with a converter.

use conduit_core::{
    DataError, ElementIter, InputConverter, InputDataSource, IterableInputConverter,
    ListDataReader, ObjectDataReader, ObjectDataWriter, OutputConverter, OutputDataSource,
};

/// Reads one object by converting a data source's input stream.
#[derive(Debug, Clone)]
pub struct StreamObjectReader<S, C> {
    source: S,
    converter: C,
}

impl<S, C> StreamObjectReader<S, C> {
    /// Read from `source` through `converter`.
    pub const fn new(source: S, converter: C) -> Self {
        Self { source, converter }
    }
}

impl<T, S, C> ObjectDataReader<T> for StreamObjectReader<S, C>
where
    S: InputDataSource,
    C: InputConverter<T>,
{
    fn read_object(&mut self) -> Result<Option<T>, DataError> {
        let mut input = self.source.input_stream()?;
        self.converter.read(&mut input)
    }
}

/// Writes one object by converting it into a data source's output stream.
///
/// Echoes nothing back, so the observable keeps the stored value.
#[derive(Debug, Clone)]
pub struct StreamObjectWriter<S, C> {
    source: S,
    converter: C,
}

impl<S, C> StreamObjectWriter<S, C> {
    /// Write to `source` through `converter`.
    pub const fn new(source: S, converter: C) -> Self {
        Self { source, converter }
    }

    /// Recover the data source, for example to inspect written bytes.
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<T, S, C> ObjectDataWriter<T> for StreamObjectWriter<S, C>
where
    S: OutputDataSource,
    C: OutputConverter<T>,
{
    fn write_object(&mut self, value: &T) -> Result<Option<T>, DataError> {
        let mut output = self.source.output_stream()?;
        self.converter.write(value, &mut *output)?;
        Ok(None)
    }
}

/// Reads a list by iterating over a data source's input stream.
#[derive(Debug, Clone)]
pub struct StreamListReader<S, C> {
    source: S,
    converter: C,
}

impl<S, C> StreamListReader<S, C> {
    /// Iterate over `source` through `converter`.
    pub const fn new(source: S, converter: C) -> Self {
        Self { source, converter }
    }
}

impl<E, S, C> ListDataReader<E> for StreamListReader<S, C>
where
    S: InputDataSource,
    C: IterableInputConverter<E>,
{
    fn iterator(&mut self) -> Result<ElementIter<'_, E>, DataError> {
        let input = self.source.input_stream()?;
        self.converter.iterate(input)
    }
}
