//! Local file data sources and providers.
//!
//! Files are opened per call and closed when the stream is dropped.

mod client;
mod source;

pub use client::{FileClient, FileRemover};
pub use source::FileDataSource;
