//! Object and list providers issuing one HTTP exchange per call.

use std::fmt;
use std::io::Read;

use conduit_core::{
    DataError, ElementIter, InputConverter, IterableInputConverter, ListDataReader,
    ObjectDataReader, ObjectDataRemover, ObjectDataWriter, OutputConverter, OutputDataSource,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::negotiation;
use super::request::RequestSpec;
use super::response::ResponseMeta;
use super::source::RestDataSource;

type BoxedInput<T> = Box<dyn InputConverter<T> + Send>;
type BoxedOutput<T> = Box<dyn OutputConverter<T> + Send>;
type BoxedIterable<E> = Box<dyn IterableInputConverter<E> + Send>;

fn open(spec: &RequestSpec) -> RestDataSource {
    RestDataSource::new(spec.clone())
}

fn opened(source: &RestDataSource) -> Result<&ResponseMeta, DataError> {
    source
        .response()
        .ok_or_else(|| DataError::configuration("response metadata missing after send"))
}

fn read_response<T>(
    source: &mut RestDataSource,
    converter: Option<&BoxedInput<T>>,
) -> Result<Option<T>, DataError>
where
    T: DeserializeOwned + 'static,
{
    let mut body: Box<dyn Read + Send> = source.send()?;
    match converter {
        Some(converter) => converter.read(&mut body),
        None => negotiation::object_input::<T>(opened(source)?)?.read(&mut body),
    }
}

/// Reads one object from a REST endpoint.
///
/// Without an explicit converter the response decides: see
/// [`RestClient::object_reader`](super::RestClient::object_reader).
pub struct RestObjectReader<T> {
    spec: RequestSpec,
    converter: Option<BoxedInput<T>>,
}

impl<T> RestObjectReader<T> {
    pub(crate) fn new(spec: RequestSpec, converter: Option<BoxedInput<T>>) -> Self {
        Self { spec, converter }
    }
}

impl<T> fmt::Debug for RestObjectReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestObjectReader")
            .field("spec", &self.spec)
            .field("explicit_converter", &self.converter.is_some())
            .finish()
    }
}

impl<T: DeserializeOwned + 'static> ObjectDataReader<T> for RestObjectReader<T> {
    fn read_object(&mut self) -> Result<Option<T>, DataError> {
        read_response(&mut open(&self.spec), self.converter.as_ref())
    }
}

/// Writes or removes one object through a REST endpoint.
///
/// The value is written into the request body through the output
/// converter, then the response is read back through the input converter.
pub struct RestObjectWriter<T> {
    spec: RequestSpec,
    output: Option<BoxedOutput<T>>,
    input: Option<BoxedInput<T>>,
}

impl<T> RestObjectWriter<T> {
    pub(crate) fn new(
        spec: RequestSpec,
        output: Option<BoxedOutput<T>>,
        input: Option<BoxedInput<T>>,
    ) -> Self {
        Self {
            spec,
            output,
            input,
        }
    }
}

impl<T> fmt::Debug for RestObjectWriter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestObjectWriter")
            .field("spec", &self.spec)
            .field("explicit_converters", &self.output.is_some())
            .finish()
    }
}

impl<T> RestObjectWriter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn exchange(&self, value: Option<&T>) -> Result<Option<T>, DataError> {
        let mut source = open(&self.spec);
        {
            let mut body = source.output_stream()?;
            if let Some(value) = value {
                match &self.output {
                    Some(converter) => converter.write(value, &mut *body)?,
                    None => negotiation::object_output::<T>(self.spec.content_type.as_deref())?
                        .write(value, &mut *body)?,
                }
            }
        }
        read_response(&mut source, self.input.as_ref())
    }
}

impl<T> ObjectDataWriter<T> for RestObjectWriter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn write_object(&mut self, value: &T) -> Result<Option<T>, DataError> {
        self.exchange(Some(value))
    }
}

impl<T> ObjectDataRemover<T> for RestObjectWriter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn remove_object(&mut self, current: Option<&T>) -> Result<Option<T>, DataError> {
        self.exchange(current)
    }
}

/// Reads a list from a REST endpoint.
pub struct RestListReader<E> {
    spec: RequestSpec,
    converter: Option<BoxedIterable<E>>,
}

impl<E> RestListReader<E> {
    pub(crate) fn new(spec: RequestSpec, converter: Option<BoxedIterable<E>>) -> Self {
        Self { spec, converter }
    }
}

impl<E> fmt::Debug for RestListReader<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestListReader")
            .field("spec", &self.spec)
            .field("explicit_converter", &self.converter.is_some())
            .finish()
    }
}

impl<E: DeserializeOwned + 'static> ListDataReader<E> for RestListReader<E> {
    fn iterator(&mut self) -> Result<ElementIter<'_, E>, DataError> {
        let mut source = open(&self.spec);
        let body = source.send()?;
        match &self.converter {
            Some(converter) => converter.iterate(body),
            None => negotiation::list_input::<E>(opened(&source)?)?.iterate(body),
        }
    }
}
