//! The dispatcher: submits collaborator calls to workers and republishes
//! their outcomes on the confinement thread.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use conduit_core::{
    DataError, ListDataReader, ObjectDataReader, ObjectDataRemover, ObjectDataWriter,
    ObservableList, ObservableObject,
};

use crate::call_site::CallSite;
use crate::config::{CallSiteCapture, DispatcherConfig};
use crate::confinement::{
    ConfinementQueue, ListCompletion, ListMessage, ObjectCompletion, ObjectMessage, ObjectOutcome,
};
use crate::pool::WorkerPool;
use crate::DispatchError;

/// Runs data operations on a bounded worker pool and applies their results
/// on the thread that owns the dispatcher.
///
/// The dispatcher is `!Send`. The thread that creates it is its confinement
/// thread: every observable it hands out is mutated, and every notification
/// fired, only from [`Dispatcher::process_pending`] and
/// [`Dispatcher::run_until_idle`] on that thread.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use conduit_core::{DataError, ObjectDataReader, Observable, State};
/// use conduit_dispatch::Dispatcher;
///
/// struct Greeting;
///
/// impl ObjectDataReader<String> for Greeting {
///     fn read_object(&mut self) -> Result<Option<String>, DataError> {
///         Ok(Some("hello".to_owned()))
///     }
/// }
///
/// let dispatcher = Dispatcher::with_defaults()?;
/// let greeting = dispatcher.retrieve_object(Greeting);
/// assert_eq!(greeting.state(), State::Ready);
///
/// assert!(dispatcher.run_until_idle(Duration::from_secs(5)));
/// assert_eq!(greeting.state(), State::Succeeded);
/// assert_eq!(greeting.get().as_deref(), Some("hello"));
/// # Ok::<(), conduit_dispatch::DispatchError>(())
/// ```
pub struct Dispatcher {
    pool: WorkerPool,
    queue: ConfinementQueue,
    call_sites: CallSiteCapture,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pool", &"<tokio::runtime::Runtime>")
            .field("pending", &self.queue.pending())
            .field("call_sites", &self.call_sites)
            .finish()
    }
}

/// How a guarded worker call ended.
enum Settlement<V> {
    Done(V),
    Failed(DataError),
    Cancelled,
}

impl Dispatcher {
    /// Create a dispatcher with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool fails to start.
    pub fn with_defaults() -> Result<Self, DispatchError> {
        Self::new(DispatcherConfig::default())
    }

    /// Create a dispatcher with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::EmptyPool`] for a zero pool size, or
    /// [`DispatchError::Runtime`] if the worker pool fails to start.
    pub fn new(config: DispatcherConfig) -> Result<Self, DispatchError> {
        let pool = WorkerPool::new(config.pool_size, &config.thread_prefix)?;
        log::debug!(
            "dispatcher started with {} workers named {}-<n>",
            config.pool_size,
            config.thread_prefix
        );
        Ok(Self {
            pool,
            queue: ConfinementQueue::new(config.wakeup),
            call_sites: config.call_sites,
        })
    }

    /// Read an object on a worker.
    ///
    /// The observable comes from [`ObjectDataReader::create_observable`]. It
    /// moves to RUNNING on the next drain, then to SUCCEEDED, FAILED, or
    /// CANCELLED.
    pub fn retrieve_object<T, R>(&self, reader: R) -> ObservableObject<T>
    where
        T: Send + 'static,
        R: ObjectDataReader<T> + Send + 'static,
    {
        let observable = reader.create_observable();
        self.retrieve_object_into(&observable, reader);
        observable
    }

    /// Read an object on a worker into an existing observable.
    ///
    /// Used to refresh an observable after an earlier operation, such as a
    /// removal, without handing out a new handle.
    pub fn retrieve_object_into<T, R>(&self, observable: &ObservableObject<T>, mut reader: R)
    where
        T: Send + 'static,
        R: ObjectDataReader<T> + Send + 'static,
    {
        let outbox = self
            .queue
            .open(|rx| ObjectCompletion::new(observable.clone(), rx));
        outbox.post(ObjectMessage::Started);

        let call_site = CallSite::capture(self.call_sites);
        log::debug!("submitting retrieve_object");
        self.pool.submit(move || {
            let outcome = match guarded(call_site.as_ref(), || reader.read_object()) {
                Settlement::Done(value) => ObjectOutcome::Succeeded(value),
                Settlement::Failed(error) => ObjectOutcome::Failed(error),
                Settlement::Cancelled => ObjectOutcome::Cancelled,
            };
            outbox.post(ObjectMessage::Settled(outcome));
        });
    }

    /// Write `value` on a worker.
    ///
    /// No RUNNING transition precedes the write. On success the observable
    /// holds the value echoed by the writer, or `value` itself when the
    /// writer echoes nothing.
    pub fn store_object<T, W>(&self, value: T, mut writer: W) -> ObservableObject<T>
    where
        T: Send + 'static,
        W: ObjectDataWriter<T> + Send + 'static,
    {
        let observable = writer.create_observable();
        let outbox = self
            .queue
            .open(|rx| ObjectCompletion::new(observable.clone(), rx));

        let call_site = CallSite::capture(self.call_sites);
        log::debug!("submitting store_object");
        self.pool.submit(move || {
            let outcome = match guarded(call_site.as_ref(), || writer.write_object(&value)) {
                Settlement::Done(echo) => ObjectOutcome::Succeeded(echo.or(Some(value))),
                Settlement::Failed(error) => ObjectOutcome::Failed(error),
                Settlement::Cancelled => ObjectOutcome::Cancelled,
            };
            outbox.post(ObjectMessage::Settled(outcome));
        });
        observable
    }

    /// Remove the object behind `observable` on a worker.
    ///
    /// The remover receives a snapshot of the current value. On success the
    /// observable holds the remover's result, its exception is cleared, and
    /// it moves to REMOVED.
    pub fn remove_object<T, R>(&self, observable: &ObservableObject<T>, mut remover: R)
    where
        T: Clone + Send + 'static,
        R: ObjectDataRemover<T> + Send + 'static,
    {
        let snapshot = observable.get();
        let outbox = self
            .queue
            .open(|rx| ObjectCompletion::new(observable.clone(), rx));
        outbox.post(ObjectMessage::Started);

        let call_site = CallSite::capture(self.call_sites);
        log::debug!("submitting remove_object");
        self.pool.submit(move || {
            let outcome = match guarded(call_site.as_ref(), || {
                remover.remove_object(snapshot.as_ref())
            }) {
                Settlement::Done(value) => ObjectOutcome::Removed(value),
                Settlement::Failed(error) => ObjectOutcome::Failed(error),
                Settlement::Cancelled => ObjectOutcome::Cancelled,
            };
            outbox.post(ObjectMessage::Settled(outcome));
        });
    }

    /// Read a list on a worker.
    ///
    /// Elements are appended one drain at a time as the worker produces
    /// them; `None` elements are skipped. Elements appended before a failure
    /// stay in the list.
    pub fn retrieve_list<E, R>(&self, reader: R) -> ObservableList<E>
    where
        E: Send + 'static,
        R: ListDataReader<E> + Send + 'static,
    {
        let observable = reader.create_observable();
        self.retrieve_list_into(&observable, reader);
        observable
    }

    /// Read a list on a worker, appending to an existing observable.
    pub fn retrieve_list_into<E, R>(&self, observable: &ObservableList<E>, mut reader: R)
    where
        E: Send + 'static,
        R: ListDataReader<E> + Send + 'static,
    {
        let outbox = self
            .queue
            .open(|rx| ListCompletion::new(observable.clone(), rx));
        outbox.post(ListMessage::Started);

        let call_site = CallSite::capture(self.call_sites);
        log::debug!("submitting retrieve_list");
        self.pool.submit(move || {
            let settlement = guarded(call_site.as_ref(), || {
                for item in reader.iterator()? {
                    if let Some(element) = item? {
                        outbox.post(ListMessage::Element(element));
                    }
                }
                Ok(())
            });
            outbox.post(match settlement {
                Settlement::Done(()) => ListMessage::Finished,
                Settlement::Failed(error) => ListMessage::Failed(error),
                Settlement::Cancelled => ListMessage::Cancelled,
            });
        });
    }

    /// Apply every completion queued so far without blocking.
    ///
    /// Returns the number of operations that reached a terminal state.
    pub fn process_pending(&self) -> usize {
        self.queue.process_pending()
    }

    /// Block, applying completions as they arrive, until no operation is in
    /// flight or `timeout` elapses.
    ///
    /// Returns `true` when the dispatcher went idle. Pass [`Duration::MAX`]
    /// to wait without a deadline.
    pub fn run_until_idle(&self, timeout: Duration) -> bool {
        self.queue.run_until_idle(timeout)
    }

    /// Number of operations that have not reached a terminal state yet.
    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.queue.pending()
    }
}

/// Run `job`, classifying its result and containing panics.
fn guarded<V>(
    call_site: Option<&CallSite>,
    job: impl FnOnce() -> Result<V, DataError>,
) -> Settlement<V> {
    let result = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        log::error!("worker panicked: {message}");
        Err(DataError::Panicked { message })
    });
    match result {
        Ok(value) => Settlement::Done(value),
        Err(error) if error.is_cancellation() => Settlement::Cancelled,
        Err(error) => Settlement::Failed(CallSite::annotate(call_site, error)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
