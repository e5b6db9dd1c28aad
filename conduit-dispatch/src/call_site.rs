//! Submitting-thread backtraces attached to failed operations.

use std::backtrace::Backtrace;
use std::sync::Arc;

use conduit_core::DataError;

use crate::config::CallSiteCapture;

/// Backtrace captured on the confinement thread when an operation is
/// submitted.
#[derive(Debug, Clone)]
pub(crate) struct CallSite(Arc<Backtrace>);

impl CallSite {
    pub(crate) fn capture(policy: CallSiteCapture) -> Option<Self> {
        let enabled = match policy {
            CallSiteCapture::Always => true,
            CallSiteCapture::Never => false,
            CallSiteCapture::FollowLogLevel => log::log_enabled!(log::Level::Debug),
        };
        enabled.then(|| Self(Arc::new(Backtrace::force_capture())))
    }

    pub(crate) fn annotate(call_site: Option<&Self>, error: DataError) -> DataError {
        match call_site {
            Some(site) => error.with_call_site(Arc::clone(&site.0)),
            None => error,
        }
    }
}
