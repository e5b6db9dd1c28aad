//! Errors raised while setting up a dispatcher.

use std::io;

use thiserror::Error;

/// Error type for [`Dispatcher`](crate::Dispatcher) construction failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    /// The configured pool had no worker threads.
    #[error("worker pool size must be at least one")]
    EmptyPool,
    /// The runtime backing the worker pool could not be built.
    #[error("failed to start the worker pool")]
    Runtime {
        /// Underlying I/O error from the runtime builder.
        #[source]
        source: io::Error,
    },
}
