//! Integration tests for the four dispatcher operations.
//!
//! Collaborators come from `conduit_core::test_support`; every test drains
//! completions on the test thread, which acts as the confinement thread.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Barrier, Mutex};
use std::thread::{self, ThreadId};
use std::time::Duration;

use conduit_core::test_support::{
    Scripted, StubListReader, StubObjectReader, StubObjectRemover, StubObjectWriter,
};
use conduit_core::{
    DataError, ObjectDataReader, Observable, ObservableList, ObservableObject, State,
};
use conduit_dispatch::{CallSiteCapture, Dispatcher, DispatcherConfig};
use rstest::{fixture, rstest};

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[fixture]
fn dispatcher() -> Dispatcher {
    Dispatcher::new(DispatcherConfig::new().with_call_sites(CallSiteCapture::Never))
        .expect("dispatcher should start")
}

fn record_states<O: Observable>(observable: &O) -> Rc<RefCell<Vec<State>>> {
    let states = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&states);
    observable.subscribe_all(move |event| sink.borrow_mut().push(event.state()));
    states
}

#[rstest]
fn retrieve_object_populates_on_success(dispatcher: Dispatcher) {
    let object = dispatcher.retrieve_object(StubObjectReader::with_value(7_u32));
    let states = record_states(&object);

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(*states.borrow(), vec![State::Running, State::Succeeded]);
    assert_eq!(object.get(), Some(7));
    assert!(object.is_initialized());
    assert!(object.exception().is_none());
}

#[rstest]
fn retrieve_object_records_failures(dispatcher: Dispatcher) {
    let object = dispatcher.retrieve_object(StubObjectReader::<u32>::with_error("no such row"));
    let states = record_states(&object);

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(*states.borrow(), vec![State::Running, State::Failed]);
    assert!(object.get().is_none());
    assert!(!object.is_initialized());
    let error = object.exception().expect("failure should be recorded");
    assert!(matches!(error.root_cause(), DataError::Domain(_)));
    assert_eq!(error.root_cause().to_string(), "no such row");
}

#[rstest]
fn cancellation_leaves_the_exception_untouched(dispatcher: Dispatcher) {
    let object = dispatcher.retrieve_object(StubObjectReader::<u32>::scripted(Scripted::Cancel));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(object.state(), State::Cancelled);
    assert!(object.exception().is_none());
}

#[rstest]
fn worker_panics_surface_as_failures(dispatcher: Dispatcher) {
    let object = dispatcher.retrieve_object(StubObjectReader::<u32>::scripted(Scripted::Panic(
        "reader exploded".to_owned(),
    )));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(object.state(), State::Failed);
    let error = object.exception().expect("panic should be recorded");
    assert!(matches!(
        error.root_cause(),
        DataError::Panicked { message } if message == "reader exploded"
    ));
}

#[rstest]
fn call_sites_are_attached_when_enabled() {
    let dispatcher =
        Dispatcher::new(DispatcherConfig::new().with_call_sites(CallSiteCapture::Always))
            .expect("dispatcher should start");
    let object = dispatcher.retrieve_object(StubObjectReader::<u32>::with_error("nope"));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    let error = object.exception().expect("failure should be recorded");
    assert!(matches!(*error, DataError::WithCallSite { .. }));
}

#[rstest]
fn store_object_skips_running_and_keeps_the_stored_value(dispatcher: Dispatcher) {
    let writer = StubObjectWriter::silent();
    let object = dispatcher.store_object("draft".to_owned(), writer.clone());
    let states = record_states(&object);

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(*states.borrow(), vec![State::Succeeded]);
    assert_eq!(object.get().as_deref(), Some("draft"));
    assert_eq!(writer.written(), vec!["draft".to_owned()]);
    assert!(object.is_initialized());
}

#[rstest]
fn store_object_prefers_the_echoed_value(dispatcher: Dispatcher) {
    let writer = StubObjectWriter::scripted(Scripted::Value(Some("saved#1".to_owned())));
    let object = dispatcher.store_object("draft".to_owned(), writer);

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(object.get().as_deref(), Some("saved#1"));
}

#[rstest]
fn remove_then_retrieve_refreshes_the_same_observable(dispatcher: Dispatcher) {
    let object = dispatcher.retrieve_object(StubObjectReader::with_value(1_u32));
    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    let remover = StubObjectRemover::succeeding();
    dispatcher.remove_object(&object, remover.clone());
    let states = record_states(&object);
    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(*states.borrow(), vec![State::Running, State::Removed]);
    assert!(object.get().is_none());
    assert_eq!(remover.removed(), vec![Some(1)]);

    dispatcher.retrieve_object_into(&object, StubObjectReader::with_value(2_u32));
    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));
    assert_eq!(
        *states.borrow(),
        vec![State::Running, State::Removed, State::Running, State::Succeeded]
    );
    assert_eq!(object.get(), Some(2));
}

#[rstest]
fn retrieve_list_skips_holes_and_preserves_order(dispatcher: Dispatcher) {
    let list = dispatcher.retrieve_list(StubListReader::with_elements([
        Some("A"),
        None,
        Some("B"),
    ]));
    let lengths = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&lengths);
    list.on_change(move |list, _| sink.borrow_mut().push(list.len()));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(list.to_vec(), vec!["A", "B"]);
    assert_eq!(*lengths.borrow(), vec![1, 2]);
    assert_eq!(list.state(), State::Succeeded);
    assert!(list.is_initialized());
}

#[rstest]
fn retrieve_list_keeps_the_prefix_on_failure(dispatcher: Dispatcher) {
    let list: ObservableList<u8> = dispatcher.retrieve_list(StubListReader::scripted([
        Scripted::Value(Some(1)),
        Scripted::Value(Some(2)),
        Scripted::Fail("truncated feed".to_owned()),
        Scripted::Value(Some(3)),
    ]));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(list.to_vec(), vec![1, 2]);
    assert_eq!(list.state(), State::Failed);
    assert!(!list.is_initialized());
}

/// Reader recording the thread it runs on.
struct ThreadProbe {
    seen: Arc<Mutex<Vec<(ThreadId, Option<String>)>>>,
}

impl ObjectDataReader<u8> for ThreadProbe {
    fn read_object(&mut self) -> Result<Option<u8>, DataError> {
        let current = thread::current();
        self.seen
            .lock()
            .map_err(|_| DataError::domain("probe lock poisoned"))?
            .push((current.id(), current.name().map(str::to_owned)));
        Ok(Some(0))
    }
}

#[rstest]
fn work_runs_on_named_workers_and_results_on_the_caller() {
    let dispatcher = Dispatcher::new(DispatcherConfig::new().with_thread_prefix("probe"))
        .expect("dispatcher should start");
    let seen = Arc::new(Mutex::new(Vec::new()));
    let object = dispatcher.retrieve_object(ThreadProbe {
        seen: Arc::clone(&seen),
    });
    let handler_thread = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&handler_thread);
    object.set_on(State::Succeeded, move |_| {
        *sink.borrow_mut() = Some(thread::current().id());
    });

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    let recorded = seen.lock().expect("probe lock");
    let (worker_id, worker_name) = recorded.first().expect("reader should have run");
    assert_ne!(*worker_id, thread::current().id());
    assert!(
        worker_name
            .as_deref()
            .is_some_and(|name| name.starts_with("probe-")),
        "unexpected worker name {worker_name:?}"
    );
    assert_eq!(*handler_thread.borrow(), Some(thread::current().id()));
}

/// Reader that waits at a barrier, proving jobs overlap on the pool.
struct Rendezvous(Arc<Barrier>);

impl ObjectDataReader<u8> for Rendezvous {
    fn read_object(&mut self) -> Result<Option<u8>, DataError> {
        self.0.wait();
        Ok(Some(1))
    }
}

#[rstest]
fn pool_runs_jobs_concurrently() {
    let dispatcher = Dispatcher::new(DispatcherConfig::new().with_pool_size(2))
        .expect("dispatcher should start");
    let barrier = Arc::new(Barrier::new(2));
    let first = dispatcher.retrieve_object(Rendezvous(Arc::clone(&barrier)));
    let second = dispatcher.retrieve_object(Rendezvous(barrier));

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    assert_eq!(first.state(), State::Succeeded);
    assert_eq!(second.state(), State::Succeeded);
}

#[rstest]
fn operations_return_before_completion(dispatcher: Dispatcher) {
    let object: ObservableObject<u32> =
        dispatcher.retrieve_object(StubObjectReader::with_value(3));

    assert_eq!(object.state(), State::Ready);
    assert_eq!(dispatcher.pending_operations(), 1);

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));
    assert_eq!(dispatcher.pending_operations(), 0);
}

#[rstest]
fn waiting_without_a_deadline_returns_once_idle(dispatcher: Dispatcher) {
    assert!(dispatcher.run_until_idle(Duration::MAX));

    let object = dispatcher.retrieve_object(StubObjectReader::with_value(4_u32));
    assert!(dispatcher.run_until_idle(Duration::MAX));
    assert_eq!(object.get(), Some(4));
}

#[rstest]
fn handlers_may_chain_new_operations() {
    let dispatcher = Rc::new(Dispatcher::with_defaults().expect("dispatcher should start"));
    let follow_up: Rc<RefCell<Option<ObservableObject<u32>>>> = Rc::new(RefCell::new(None));
    let object = dispatcher.retrieve_object(StubObjectReader::with_value(1_u32));
    let chained = Rc::clone(&dispatcher);
    let slot = Rc::clone(&follow_up);
    object.set_on(State::Succeeded, move |_| {
        *slot.borrow_mut() = Some(chained.retrieve_object(StubObjectReader::with_value(2_u32)));
    });

    assert!(dispatcher.run_until_idle(IDLE_TIMEOUT));

    let second = follow_up.borrow().clone().expect("handler should submit");
    assert_eq!(second.get(), Some(2));
}
