//! Bounded worker pool backed by a Tokio runtime.
//!
//! Jobs run on the runtime's blocking pool. At most `size` of them run at
//! once; the rest wait for a permit. The blocking pool itself stays at
//! Tokio's default size, so blocking work a job waits on (such as the HTTP
//! client's DNS lookups) always finds a thread. A single async worker keeps
//! the runtime's I/O and timer drivers turning so jobs may block on futures
//! through [`tokio::runtime::Handle::current`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Runtime};
use tokio::sync::Semaphore;

use crate::DispatchError;

static THREAD_NUMBER: AtomicUsize = AtomicUsize::new(1);

pub(crate) struct WorkerPool {
    runtime: Option<Runtime>,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub(crate) fn new(size: usize, prefix: &str) -> Result<Self, DispatchError> {
        if size == 0 {
            return Err(DispatchError::EmptyPool);
        }
        let prefix = prefix.to_owned();
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name_fn(move || {
                let n = THREAD_NUMBER.fetch_add(1, Ordering::Relaxed);
                format!("{prefix}-{n}")
            })
            .enable_all()
            .build()
            .map_err(|source| DispatchError::Runtime { source })?;
        Ok(Self {
            runtime: Some(runtime),
            permits: Arc::new(Semaphore::new(size.min(Semaphore::MAX_PERMITS))),
        })
    }

    pub(crate) fn submit(&self, job: impl FnOnce() + Send + 'static) {
        let Some(runtime) = &self.runtime else {
            return;
        };
        let permits = Arc::clone(&self.permits);
        drop(runtime.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if tokio::task::spawn_blocking(job).await.is_err() {
                log::debug!("worker job abandoned during shutdown");
            }
        }));
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Never wait for in-flight jobs; their results are discarded.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
