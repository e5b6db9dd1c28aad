//! Request description and one-shot preparation.

use std::time::Duration;

use conduit_core::DataError;
use reqwest::Method;
use url::Url;

use super::multipart::{self, MultipartFields};
use super::oauth::OAuthCredentials;
use super::params::Params;

/// Content type of URL-encoded form bodies, and the default for literal
/// bodies.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
/// Content type that selects a multipart body.
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Everything needed to issue one HTTP request.
///
/// Built by [`RestClient`](super::RestClient); turned into a
/// [`PreparedRequest`] exactly once per data source.
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub(crate) host: Option<String>,
    pub(crate) path: Option<String>,
    pub(crate) method: Option<String>,
    pub(crate) read_timeout: Option<Duration>,
    pub(crate) connect_timeout: Option<Duration>,
    pub(crate) body: Option<String>,
    pub(crate) consumer_key: Option<String>,
    pub(crate) consumer_secret: Option<String>,
    pub(crate) query: Params,
    pub(crate) form: Params,
    pub(crate) headers: Params,
    pub(crate) multipart: MultipartFields,
    pub(crate) content_type: Option<String>,
}

/// Body bytes together with the content type announcing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// `Content-Type` header value.
    pub content_type: String,
    /// Raw body.
    pub bytes: Vec<u8>,
}

/// A request with its URL, method, headers and literal body resolved.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    method: Method,
    method_explicit: bool,
    base_url: String,
    url: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
    content_type: Option<String>,
    multipart: MultipartFields,
    read_timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
}

impl RequestSpec {
    /// Resolve the request.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Configuration`] when the host is missing, the
    /// URL does not parse, or the method is not a valid token.
    pub fn prepare(&self) -> Result<PreparedRequest, DataError> {
        let host = self
            .host
            .as_deref()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| DataError::configuration("a REST request needs a host"))?;
        let path = self.path.as_deref().map(normalise_path).unwrap_or_default();
        let base_url = format!("{host}{path}");
        let url = if self.query.is_empty() {
            base_url.clone()
        } else {
            format!("{base_url}?{}", self.query.join_with(str::to_owned))
        };
        Url::parse(&url).map_err(|err| {
            DataError::configuration(format!("invalid request URL {url}: {err}"))
        })?;

        let method = match &self.method {
            Some(explicit) => Method::from_bytes(explicit.to_ascii_uppercase().as_bytes())
                .map_err(|_| DataError::configuration(format!("invalid HTTP method {explicit}")))?,
            None if self.form.is_empty() && self.body.is_none() => Method::GET,
            None => Method::POST,
        };

        let mut headers = Vec::new();
        if let Some(key) = &self.consumer_key {
            let credentials = OAuthCredentials::new(key.clone(), self.consumer_secret.clone());
            let signed = self.query.iter().chain(self.form.iter());
            let authorization = credentials.authorization(method.as_str(), &base_url, signed)?;
            headers.push(("Authorization".to_owned(), authorization));
        }
        headers.extend(
            self.headers
                .iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned())),
        );

        let body = if self.form.is_empty() {
            self.body.clone()
        } else {
            let encoded = self.form.join_with(|value| {
                url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
            });
            Some(match self.body.as_deref() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{encoded}"),
                _ => encoded,
            })
        };

        log::debug!(
            "prepared REST request: method {method}, url {url}, form params {:?}, content type {:?}, consumer credentials {} / {}",
            self.form,
            self.content_type,
            self.consumer_key.as_deref().unwrap_or("none"),
            if self.consumer_secret.is_some() { "********" } else { "none" },
        );

        Ok(PreparedRequest {
            method,
            method_explicit: self.method.is_some(),
            base_url,
            url,
            path,
            headers,
            body,
            content_type: self.content_type.clone(),
            multipart: self.multipart.clone(),
            read_timeout: self.read_timeout,
            connect_timeout: self.connect_timeout,
        })
    }
}

fn normalise_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{path}")
    }
}

impl PreparedRequest {
    /// Resolved method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Host and path, without the query string.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Normalised path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Headers in the order they are sent, excluding `Content-Type`.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of header `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Literal body, including any URL-encoded form parameters.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Configured content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub(crate) const fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub(crate) const fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Body sent when nothing was written through an output stream.
    ///
    /// A literal body wins and defaults its content type to
    /// [`FORM_URLENCODED`]; otherwise a [`MULTIPART_FORM_DATA`] content
    /// type sends the multipart fields. Anything else sends no body.
    #[must_use]
    pub fn payload(&self) -> Option<Payload> {
        if let Some(body) = &self.body {
            return Some(Payload {
                content_type: self
                    .content_type
                    .clone()
                    .unwrap_or_else(|| FORM_URLENCODED.to_owned()),
                bytes: body.clone().into_bytes(),
            });
        }
        (self.content_type.as_deref() == Some(MULTIPART_FORM_DATA))
            .then(|| self.multipart_payload())
    }

    /// Content type and leading bytes of a body about to be written through
    /// an output stream.
    ///
    /// The content type defaults to [`FORM_URLENCODED`]. A literal body is
    /// written first when the content type is the form type; multipart
    /// fields are written first for [`MULTIPART_FORM_DATA`].
    pub(crate) fn streamed_prelude(&self) -> Payload {
        let content_type = self.content_type.as_deref().unwrap_or(FORM_URLENCODED);
        match (&self.body, content_type) {
            (Some(body), FORM_URLENCODED) => Payload {
                content_type: FORM_URLENCODED.to_owned(),
                bytes: body.clone().into_bytes(),
            },
            (_, MULTIPART_FORM_DATA) => self.multipart_payload(),
            _ => Payload {
                content_type: content_type.to_owned(),
                bytes: Vec::new(),
            },
        }
    }

    /// A streamed body turns an implicit GET into a POST.
    pub(crate) fn expect_streamed_body(&mut self) {
        if !self.method_explicit && self.method == Method::GET {
            self.method = Method::POST;
        }
    }

    fn multipart_payload(&self) -> Payload {
        let boundary = multipart::boundary();
        Payload {
            content_type: format!("{MULTIPART_FORM_DATA}; boundary={boundary}"),
            bytes: self.multipart.encode(&boundary),
        }
    }
}
