//! Error taxonomy for data operations.
//!
//! Configuration errors surface at construction or converter-selection time.
//! Everything a worker raises is caught by the dispatcher and attached to the
//! observable; [`DataError::Cancelled`] is the one variant that maps to
//! [`State::Cancelled`](crate::State::Cancelled) instead of a failure.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error raised by a collaborator.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors raised while reading, writing, or removing data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DataError {
    /// Cooperative cancellation signal raised by domain code.
    #[error("operation cancelled")]
    Cancelled,
    /// The operation was misconfigured.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the misconfiguration.
        message: String,
    },
    /// Reading from or writing to a byte stream failed.
    #[error("I/O failure while {context}")]
    Io {
        /// What the operation was doing.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The HTTP exchange with `url` failed before a response was available.
    #[error("request to {url} failed")]
    Transport {
        /// Target URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: BoxError,
    },
    /// Marshaling between bytes and values failed.
    #[error("failed to convert {what}")]
    Conversion {
        /// The value or payload being converted.
        what: String,
        /// Underlying converter error.
        #[source]
        source: BoxError,
    },
    /// A worker panicked while running the operation.
    #[error("worker panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
    /// Error raised by domain code.
    #[error(transparent)]
    Domain(BoxError),
    /// An error annotated with the call site that submitted the operation.
    #[error("{source}\nsubmitted from:\n{call_site}")]
    WithCallSite {
        /// The error raised by the worker.
        source: Box<DataError>,
        /// Backtrace captured on the submitting thread.
        call_site: Arc<Backtrace>,
    },
}

impl DataError {
    /// Build a [`DataError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a [`DataError::Io`].
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Build a [`DataError::Conversion`].
    pub fn conversion(what: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Conversion {
            what: what.into(),
            source: source.into(),
        }
    }

    /// Wrap an arbitrary domain error.
    pub fn domain(source: impl Into<BoxError>) -> Self {
        Self::Domain(source.into())
    }

    /// Annotate `self` with the backtrace of the submitting call.
    #[must_use]
    pub fn with_call_site(self, call_site: Arc<Backtrace>) -> Self {
        Self::WithCallSite {
            source: Box::new(self),
            call_site,
        }
    }

    /// The error underneath any call-site annotations.
    ///
    /// ```
    /// use std::backtrace::Backtrace;
    /// use std::sync::Arc;
    /// use conduit_core::DataError;
    ///
    /// let err = DataError::configuration("no host")
    ///     .with_call_site(Arc::new(Backtrace::disabled()));
    /// assert!(matches!(err.root_cause(), DataError::Configuration { .. }));
    /// ```
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::WithCallSite { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the error is the cancellation signal.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self.root_cause(), Self::Cancelled)
    }
}

impl From<io::Error> for DataError {
    fn from(source: io::Error) -> Self {
        Self::io("accessing a data stream", source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn cancellation_is_seen_through_call_site_annotations() {
        let err = DataError::Cancelled
            .with_call_site(Arc::new(Backtrace::disabled()))
            .with_call_site(Arc::new(Backtrace::disabled()));
        assert!(err.is_cancellation());
    }

    #[rstest]
    fn domain_errors_render_transparently() {
        let err = DataError::domain("record 7 is locked");
        assert_eq!(err.to_string(), "record 7 is locked");
    }

    #[rstest]
    fn call_site_annotation_keeps_the_original_message_first() {
        let err = DataError::configuration("host must be set")
            .with_call_site(Arc::new(Backtrace::disabled()));
        assert!(
            err.to_string()
                .starts_with("invalid configuration: host must be set"),
            "unexpected message: {err}"
        );
    }

    #[rstest]
    fn io_errors_keep_their_source() {
        let err = DataError::from(io::Error::other("disk gone"));
        let source = err.source().expect("source should be present");
        assert_eq!(source.to_string(), "disk gone");
    }
}
