use std::time::Duration;

use conduit_core::{InputConverter, IterableInputConverter, OutputConverter};

use super::provider::{RestListReader, RestObjectReader, RestObjectWriter};
use super::request::RequestSpec;
use super::source::RestDataSource;

/// Builder for REST data sources and providers.
///
/// Every data source or provider created from the builder works on a
/// snapshot of its settings.
///
/// # Examples
///
/// ```
/// use conduit_data::rest::{FORM_URLENCODED, RestClient};
///
/// let mut source = RestClient::new()
///     .with_host("http://h")
///     .with_path("p")
///     .with_form_param("k", "v")
///     .data_source();
///
/// let request = source.prepared()?;
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.path(), "/p");
/// let payload = request.payload().expect("form body");
/// assert_eq!(payload.content_type, FORM_URLENCODED);
/// assert_eq!(payload.bytes, b"k=v");
/// # Ok::<(), conduit_core::DataError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RestClient {
    spec: RequestSpec,
}

impl RestClient {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme, host and optional port, for example `https://api.example.com`.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.spec.host = Some(host.into());
        self
    }

    /// Request path; a leading `/` is added when missing.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.spec.path = Some(path.into());
        self
    }

    /// HTTP method. When unset, requests with a body or form parameters use
    /// POST and all others GET.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.spec.method = Some(method.into());
        self
    }

    /// Timeout for reading the response. Unset leaves the client default.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.spec.read_timeout = Some(timeout);
        self
    }

    /// Timeout for establishing the connection. Unset leaves the client
    /// default.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.spec.connect_timeout = Some(timeout);
        self
    }

    /// Literal request body. Form parameters are appended to it.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.spec.body = Some(body.into());
        self
    }

    /// OAuth 1.0 consumer key; requests are signed when it is set.
    #[must_use]
    pub fn with_consumer_key(mut self, key: impl Into<String>) -> Self {
        self.spec.consumer_key = Some(key.into());
        self
    }

    /// OAuth 1.0 consumer secret.
    #[must_use]
    pub fn with_consumer_secret(mut self, secret: impl Into<String>) -> Self {
        self.spec.consumer_secret = Some(secret.into());
        self
    }

    /// Set a query parameter. Values are sent as supplied.
    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.query.set(key, value);
        self
    }

    /// Set a form parameter. Values are URL-encoded into the body.
    #[must_use]
    pub fn with_form_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.form.set(key, value);
        self
    }

    /// Set a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.spec.headers.set(name, value);
        self
    }

    /// Set a text field of a multipart body.
    ///
    /// Multipart fields are only sent when the content type is exactly
    /// [`MULTIPART_FORM_DATA`](super::MULTIPART_FORM_DATA).
    #[must_use]
    pub fn with_multipart_text(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.spec.multipart.set_text(name, value);
        self
    }

    /// Set a binary field of a multipart body.
    #[must_use]
    pub fn with_multipart_bytes(
        mut self,
        name: impl Into<String>,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.spec.multipart.set_bytes(name, value.into());
        self
    }

    /// Request content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.spec.content_type = Some(content_type.into());
        self
    }

    /// The accumulated request description.
    #[must_use]
    pub const fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// A data source for one exchange with the configured endpoint.
    #[must_use]
    pub fn data_source(&self) -> RestDataSource {
        RestDataSource::new(self.spec.clone())
    }

    /// Object reader choosing its converter from the response.
    ///
    /// `String` targets read text and `()` targets read nothing. For other
    /// targets a `204` reads nothing; otherwise the response content type
    /// selects JSON (`application/json` or no header) or text
    /// (`text/plain`). Any other content type fails the read with a
    /// configuration error.
    #[must_use]
    pub fn object_reader<T>(&self) -> RestObjectReader<T> {
        RestObjectReader::new(self.spec.clone(), None)
    }

    /// Object reader with an explicit converter.
    #[must_use]
    pub fn object_reader_with<T, C>(&self, converter: C) -> RestObjectReader<T>
    where
        C: InputConverter<T> + Send + 'static,
    {
        RestObjectReader::new(self.spec.clone(), Some(Box::new(converter)))
    }

    /// Object writer choosing its converters.
    ///
    /// The body is JSON when the request content type starts with
    /// `application/json`; any other configured content type fails the
    /// write. Without one, `String` values are written as text, `()`
    /// writes nothing and other values are JSON. The response is read as
    /// by [`RestClient::object_reader`].
    #[must_use]
    pub fn object_writer<T>(&self) -> RestObjectWriter<T> {
        RestObjectWriter::new(self.spec.clone(), None, None)
    }

    /// Object writer with explicit converters.
    #[must_use]
    pub fn object_writer_with<T, O, I>(&self, output: O, input: I) -> RestObjectWriter<T>
    where
        O: OutputConverter<T> + Send + 'static,
        I: InputConverter<T> + Send + 'static,
    {
        RestObjectWriter::new(
            self.spec.clone(),
            Some(Box::new(output)),
            Some(Box::new(input)),
        )
    }

    /// Object remover sending the current value as the request body.
    ///
    /// Converters are chosen as by [`RestClient::object_writer`]; pair it
    /// with [`RestClient::with_method`] to issue a `DELETE`.
    #[must_use]
    pub fn object_remover<T>(&self) -> RestObjectWriter<T> {
        self.object_writer()
    }

    /// Object remover with explicit converters.
    #[must_use]
    pub fn object_remover_with<T, O, I>(&self, output: O, input: I) -> RestObjectWriter<T>
    where
        O: OutputConverter<T> + Send + 'static,
        I: InputConverter<T> + Send + 'static,
    {
        self.object_writer_with(output, input)
    }

    /// List reader decoding a JSON array response.
    ///
    /// Responses with a content type other than `application/json` fail the
    /// read with a configuration error.
    #[must_use]
    pub fn list_reader<E>(&self) -> RestListReader<E> {
        RestListReader::new(self.spec.clone(), None)
    }

    /// List reader with an explicit converter.
    #[must_use]
    pub fn list_reader_with<E, C>(&self, converter: C) -> RestListReader<E>
    where
        C: IterableInputConverter<E> + Send + 'static,
    {
        RestListReader::new(self.spec.clone(), Some(Box::new(converter)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn builders_replace_single_valued_params() {
        let client = RestClient::new()
            .with_query_param("page", "1")
            .with_query_param("page", "2")
            .with_header("Accept", "text/plain");
        assert_eq!(client.spec().query.get("page"), Some("2"));
        assert_eq!(client.spec().headers.get("Accept"), Some("text/plain"));
    }

    #[rstest]
    fn data_sources_snapshot_the_builder() {
        let client = RestClient::new().with_host("http://h");
        let mut source = client.clone().with_path("later").data_source();
        let mut original = client.data_source();
        assert_eq!(source.prepared().expect("valid").url(), "http://h/later");
        assert_eq!(original.prepared().expect("valid").url(), "http://h");
    }
}
