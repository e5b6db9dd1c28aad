//! Bridging blocking callers onto the async HTTP client.
//!
//! Inside a multi-threaded Tokio runtime (the dispatcher's workers run in
//! one) the ambient handle drives requests through
//! [`tokio::task::block_in_place`]. Anywhere else, including a
//! `current_thread` runtime, a private runtime is built for the exchange.
//! Blocking on the private runtime from inside a `current_thread` runtime
//! can deadlock when the request depends on I/O that runtime drives.

use std::future::Future;
use std::io::{self, Read};
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, TryStreamExt};
use tokio::runtime::{Builder, Handle, Runtime, RuntimeFlavor};
use tokio_util::io::{StreamReader, SyncIoBridge};

type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Runtime used to drive one HTTP exchange.
#[derive(Clone)]
pub(crate) enum Executor {
    Ambient(Handle),
    Owned(Arc<Runtime>),
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ambient(_) => f.write_str("Executor::Ambient"),
            Self::Owned(_) => f.write_str("Executor::Owned(<tokio::runtime::Runtime>)"),
        }
    }
}

impl Executor {
    /// Pick the ambient multi-threaded runtime, or build a private one.
    pub(crate) fn acquire() -> io::Result<Self> {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Ok(Self::Ambient(handle))
            }
            _ => Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("conduit-http")
                .enable_all()
                .build()
                .map(|runtime| Self::Owned(Arc::new(runtime))),
        }
    }

    fn handle(&self) -> Handle {
        match self {
            Self::Ambient(handle) => handle.clone(),
            Self::Owned(runtime) => runtime.handle().clone(),
        }
    }

    /// Block the current thread on `future`.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        match self {
            Self::Ambient(handle) => tokio::task::block_in_place(|| handle.block_on(future)),
            Self::Owned(runtime) => runtime.block_on(future),
        }
    }

    /// Expose a response's byte stream as a blocking reader.
    pub(crate) fn reader(&self, response: reqwest::Response) -> ResponseBody {
        let stream: ByteStream = Box::pin(response.bytes_stream().map_err(io::Error::other));
        ResponseBody {
            inner: SyncIoBridge::new_with_handle(StreamReader::new(stream), self.handle()),
            executor: self.clone(),
        }
    }
}

/// Blocking view of a response body.
///
/// Keeps its runtime alive for as long as the body is being read.
pub(crate) struct ResponseBody {
    inner: SyncIoBridge<StreamReader<ByteStream, Bytes>>,
    executor: Executor,
}

impl Read for ResponseBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &self.executor {
            Executor::Ambient(_) => tokio::task::block_in_place(|| self.inner.read(buf)),
            Executor::Owned(_) => self.inner.read(buf),
        }
    }
}
