use std::io::{Read, Write};

use conduit_core::{DataError, InputDataSource, OutputDataSource};
use hyper::ext::ReasonPhrase;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};

use super::gzip::decode_if_gzip;
use super::request::{Payload, PreparedRequest, RequestSpec};
use super::response::ResponseMeta;
use super::runtime::Executor;

/// Byte streams backed by a single HTTP exchange.
///
/// The request is prepared on first use and sent when the input stream is
/// opened. Bytes written through [`OutputDataSource::output_stream`] before
/// that become the request body. The response status and headers are
/// available from [`RestDataSource::response`] once the input stream has
/// been opened.
#[derive(Debug)]
pub struct RestDataSource {
    spec: RequestSpec,
    prepared: Option<PreparedRequest>,
    streamed: Option<Payload>,
    response: Option<ResponseMeta>,
}

impl RestDataSource {
    /// Data source for `spec`.
    #[must_use]
    pub const fn new(spec: RequestSpec) -> Self {
        Self {
            spec,
            prepared: None,
            streamed: None,
            response: None,
        }
    }

    /// The request description.
    #[must_use]
    pub const fn spec(&self) -> &RequestSpec {
        &self.spec
    }

    /// The prepared request, building it on first call.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Configuration`] when the request cannot be built.
    pub fn prepared(&mut self) -> Result<&PreparedRequest, DataError> {
        self.prepare().map(|prepared| &*prepared)
    }

    fn prepare(&mut self) -> Result<&mut PreparedRequest, DataError> {
        let prepared = match self.prepared.take() {
            Some(prepared) => prepared,
            None => self.spec.prepare()?,
        };
        Ok(self.prepared.insert(prepared))
    }

    /// Status line and headers, captured when the response was opened.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseMeta> {
        self.response.as_ref()
    }

    /// Send the request and open the response body.
    ///
    /// Bodies of responses below 400 and error bodies are both returned;
    /// either is decoded transparently when gzip-compressed.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Configuration`] for an invalid request or a
    /// second call, [`DataError::Transport`] when the exchange fails, and
    /// [`DataError::Io`] when the body cannot be opened.
    pub fn send(&mut self) -> Result<Box<dyn Read + Send>, DataError> {
        if self.response.is_some() {
            return Err(DataError::configuration(
                "the response of this REST data source was already opened",
            ));
        }
        let streamed = self.streamed.take();
        let prepared = self.prepare()?;
        let payload = streamed.or_else(|| prepared.payload());
        let url = prepared.url().to_owned();

        let executor = Executor::acquire()
            .map_err(|source| DataError::io("starting the HTTP runtime", source))?;
        let mut builder = Client::builder();
        if let Some(timeout) = prepared.connect_timeout() {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = prepared.read_timeout() {
            builder = builder.read_timeout(timeout);
        }
        let client = builder.build().map_err(|err| transport(&url, err))?;

        let mut headers = header_map(prepared.headers())?;
        let mut request = client.request(prepared.method().clone(), &url);
        if let Some(Payload {
            content_type,
            bytes,
        }) = payload
        {
            headers.insert(CONTENT_TYPE, header_value(&content_type)?);
            request = request.body(bytes);
        }
        log::debug!("sending {} {url}", prepared.method());
        let response = executor
            .block_on(request.headers(headers).send())
            .map_err(|err| transport(&url, err))?;

        let reason = response
            .extensions()
            .get::<ReasonPhrase>()
            .map(|phrase| String::from_utf8_lossy(phrase.as_bytes()).into_owned());
        let meta =
            ResponseMeta::new(response.status(), response.headers().clone()).with_reason(reason);
        log::debug!("{url} answered {} {}", meta.status(), meta.message());
        self.response = Some(meta);

        decode_if_gzip(Box::new(executor.reader(response)))
            .map_err(|source| DataError::io(format!("opening the response body of {url}"), source))
    }
}

fn transport(url: &str, error: reqwest::Error) -> DataError {
    DataError::Transport {
        url: url.to_owned(),
        source: Box::new(error),
    }
}

fn header_value(value: &str) -> Result<HeaderValue, DataError> {
    HeaderValue::from_str(value)
        .map_err(|err| DataError::configuration(format!("invalid header value {value:?}: {err}")))
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, DataError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let parsed = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            DataError::configuration(format!("invalid header name {name:?}: {err}"))
        })?;
        map.append(parsed, header_value(value)?);
    }
    Ok(map)
}

impl InputDataSource for RestDataSource {
    fn input_stream(&mut self) -> Result<Box<dyn Read + '_>, DataError> {
        Ok(self.send()?)
    }
}

impl OutputDataSource for RestDataSource {
    /// Buffer the request body.
    ///
    /// The buffer starts with the literal body (form content type) or the
    /// multipart fields (multipart content type). An implicit GET becomes a
    /// POST.
    fn output_stream(&mut self) -> Result<Box<dyn Write + '_>, DataError> {
        if self.response.is_some() {
            return Err(DataError::configuration(
                "the request of this REST data source was already sent",
            ));
        }
        if self.streamed.is_none() {
            let prepared = self.prepare()?;
            prepared.expect_streamed_body();
            self.streamed = Some(prepared.streamed_prelude());
        }
        match &mut self.streamed {
            Some(payload) => Ok(Box::new(&mut payload.bytes)),
            None => Err(DataError::configuration("request body buffer unavailable")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn spec(content_type: Option<&str>) -> RequestSpec {
        RequestSpec {
            host: Some("http://127.0.0.1:9".to_owned()),
            content_type: content_type.map(str::to_owned),
            ..RequestSpec::default()
        }
    }

    #[rstest]
    fn output_streams_buffer_the_body() {
        let mut source = RestDataSource::new(spec(Some("application/json")));
        source
            .output_stream()
            .expect("buffer")
            .write_all(b"{}")
            .expect("write");
        source
            .output_stream()
            .expect("buffer")
            .write_all(b"[]")
            .expect("write");

        assert_eq!(
            source.streamed,
            Some(Payload {
                content_type: "application/json".to_owned(),
                bytes: b"{}[]".to_vec(),
            })
        );
        assert_eq!(
            source.prepared().expect("prepared").method(),
            &reqwest::Method::POST
        );
    }

    #[rstest]
    fn preparation_happens_once() {
        let mut source = RestDataSource::new(spec(None));
        let first = source.prepared().expect("prepared").url().to_owned();
        source.spec.path = Some("changed".to_owned());
        assert_eq!(source.prepared().expect("prepared").url(), first);
    }

    #[rstest]
    fn invalid_requests_fail_before_sending() {
        let mut source = RestDataSource::new(RequestSpec::default());
        assert!(matches!(
            source.send(),
            Err(DataError::Configuration { .. })
        ));
        assert!(source.response().is_none());
    }

    #[rstest]
    fn invalid_header_names_are_configuration_errors() {
        let headers = vec![("bad header".to_owned(), "x".to_owned())];
        assert!(matches!(
            header_map(&headers),
            Err(DataError::Configuration { .. })
        ));
    }
}
