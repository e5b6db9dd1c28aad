//! Data sources, converters and providers for Conduit.
//!
//! - [`rest`]: HTTP exchanges with URL and form assembly, OAuth 1.0
//!   signing, multipart bodies, transparent gzip decoding and
//!   content-type driven converter selection.
//! - [`file`]: per-call file streams through capability-based file access.
//! - [`converter`]: JSON, text and void converters built on `serde`.
//! - [`stream`]: generic providers pairing a data source with a converter.
//!
//! Every provider here performs blocking I/O and is meant to run on a
//! dispatcher worker.

#![forbid(unsafe_code)]

pub mod converter;
pub mod file;
pub mod rest;
pub mod stream;

pub use converter::{JsonArrayConverter, JsonConverter, TextConverter, VoidConverter};
pub use file::{FileClient, FileDataSource, FileRemover};
pub use rest::{RestClient, RestDataSource, RestListReader, RestObjectReader, RestObjectWriter};
pub use stream::{StreamListReader, StreamObjectReader, StreamObjectWriter};
