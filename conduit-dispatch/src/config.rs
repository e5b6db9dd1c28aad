//! Dispatcher configuration.

use std::fmt;
use std::sync::Arc;

/// Default number of worker threads.
pub const DEFAULT_POOL_SIZE: usize = 5;

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_PREFIX: &str = "conduit-worker";

/// Callback invoked on a worker thread after a completion is queued.
pub type WakeHook = Arc<dyn Fn() + Send + Sync>;

/// When to capture the submitting call site for failure diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CallSiteCapture {
    /// Capture when `log` is enabled at debug level for this crate.
    #[default]
    FollowLogLevel,
    /// Always capture.
    Always,
    /// Never capture.
    Never,
}

/// Configuration for [`Dispatcher`](crate::Dispatcher).
#[derive(Clone)]
pub struct DispatcherConfig {
    /// Number of worker threads executing blocking jobs.
    pub pool_size: usize,
    /// Worker threads are named `<thread_prefix>-<n>`.
    pub thread_prefix: String,
    /// Call-site capture policy for failed operations.
    pub call_sites: CallSiteCapture,
    /// Invoked from worker threads whenever a completion is queued.
    pub wakeup: Option<WakeHook>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            thread_prefix: DEFAULT_THREAD_PREFIX.to_owned(),
            call_sites: CallSiteCapture::default(),
            wakeup: None,
        }
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("pool_size", &self.pool_size)
            .field("thread_prefix", &self.thread_prefix)
            .field("call_sites", &self.call_sites)
            .field("wakeup", &self.wakeup.as_ref().map(|_| "<hook>"))
            .finish()
    }
}

impl DispatcherConfig {
    /// Create a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the worker thread name prefix.
    #[must_use]
    pub fn with_thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    /// Set the call-site capture policy.
    #[must_use]
    pub const fn with_call_sites(mut self, policy: CallSiteCapture) -> Self {
        self.call_sites = policy;
        self
    }

    /// Install a hook a UI event loop can use to schedule
    /// [`Dispatcher::process_pending`](crate::Dispatcher::process_pending).
    #[must_use]
    pub fn with_wakeup(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.wakeup = Some(Arc::new(hook));
        self
    }
}
