//! HTTP data sources and providers.
//!
//! A [`RestClient`] accumulates request settings and produces
//! [`RestDataSource`]s, each good for exactly one exchange, and providers
//! that open a fresh data source per call. Preparation resolves the URL,
//! method, OAuth signature and literal body; the body is then either the
//! literal body, the multipart fields, or whatever was written through the
//! output stream.

mod client;
mod gzip;
mod multipart;
mod negotiation;
mod oauth;
mod params;
mod provider;
mod request;
mod response;
mod runtime;
mod source;

pub use client::RestClient;
pub use gzip::decode_if_gzip;
pub use params::Params;
pub use provider::{RestListReader, RestObjectReader, RestObjectWriter};
pub use request::{FORM_URLENCODED, MULTIPART_FORM_DATA, Payload, PreparedRequest, RequestSpec};
pub use response::ResponseMeta;
pub use source::RestDataSource;
