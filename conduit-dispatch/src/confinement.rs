//! Marshaling worker results back onto the confinement thread.
//!
//! Every operation owns a typed channel carrying its messages in the order
//! the worker posted them. Workers also push the operation's ticket onto one
//! shared wake channel, which the confinement thread drains. The pending
//! table, and therefore every observable it references, never leaves the
//! confinement thread.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use conduit_core::{DataError, Observable, ObservableList, ObservableObject, State};

use crate::config::WakeHook;

pub(crate) type Ticket = u64;

/// Worker-side handle for posting one operation's messages.
pub(crate) struct Outbox<M> {
    ticket: Ticket,
    messages: Sender<M>,
    wake: Sender<Ticket>,
    hook: Option<WakeHook>,
}

impl<M> Outbox<M> {
    pub(crate) fn post(&self, message: M) {
        if self.messages.send(message).is_err() || self.wake.send(self.ticket).is_err() {
            log::debug!(
                "dispatcher dropped; discarding message for operation {}",
                self.ticket
            );
            return;
        }
        if let Some(hook) = &self.hook {
            hook();
        }
    }
}

/// Confinement-side state of one in-flight operation.
pub(crate) trait Completion {
    /// Apply every queued message. Returns `true` once the operation ended.
    fn drain(&mut self) -> bool;
}

/// Messages posted for object operations.
pub(crate) enum ObjectMessage<T> {
    Started,
    Settled(ObjectOutcome<T>),
}

/// Terminal result of an object operation.
pub(crate) enum ObjectOutcome<T> {
    Succeeded(Option<T>),
    Removed(Option<T>),
    Failed(DataError),
    Cancelled,
}

/// Messages posted for list operations.
pub(crate) enum ListMessage<E> {
    Started,
    Element(E),
    Finished,
    Failed(DataError),
    Cancelled,
}

pub(crate) struct ObjectCompletion<T> {
    observable: ObservableObject<T>,
    messages: Receiver<ObjectMessage<T>>,
}

impl<T> ObjectCompletion<T> {
    pub(crate) const fn new(
        observable: ObservableObject<T>,
        messages: Receiver<ObjectMessage<T>>,
    ) -> Self {
        Self {
            observable,
            messages,
        }
    }
}

impl<T: 'static> Completion for ObjectCompletion<T> {
    fn drain(&mut self) -> bool {
        loop {
            match self.messages.try_recv() {
                Ok(ObjectMessage::Started) => {
                    self.observable.set_state(State::Running);
                }
                Ok(ObjectMessage::Settled(outcome)) => {
                    settle_object(&self.observable, outcome);
                    return true;
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("worker vanished before settling an object operation");
                    return true;
                }
            }
        }
    }
}

pub(crate) struct ListCompletion<E> {
    observable: ObservableList<E>,
    messages: Receiver<ListMessage<E>>,
}

impl<E> ListCompletion<E> {
    pub(crate) const fn new(
        observable: ObservableList<E>,
        messages: Receiver<ListMessage<E>>,
    ) -> Self {
        Self {
            observable,
            messages,
        }
    }
}

impl<E: 'static> Completion for ListCompletion<E> {
    fn drain(&mut self) -> bool {
        loop {
            let message = match self.messages.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Disconnected) => {
                    log::warn!("worker vanished before settling a list operation");
                    return true;
                }
            };
            match message {
                ListMessage::Started => {
                    self.observable.set_state(State::Running);
                }
                ListMessage::Element(element) => self.observable.push(element),
                ListMessage::Finished => {
                    if !self.observable.is_initialized() {
                        self.observable.mark_initialized();
                    }
                    self.observable.set_state(State::Succeeded);
                    return true;
                }
                ListMessage::Failed(error) => {
                    fail(&self.observable, error);
                    return true;
                }
                ListMessage::Cancelled => {
                    self.observable.set_state(State::Cancelled);
                    return true;
                }
            }
        }
    }
}

/// Apply a terminal object outcome.
///
/// Values are applied even when the observable is already cancelled; only
/// the state transition is latched.
pub(crate) fn settle_object<T: 'static>(
    observable: &ObservableObject<T>,
    outcome: ObjectOutcome<T>,
) {
    match outcome {
        ObjectOutcome::Succeeded(value) => {
            observable.set(value);
            if !observable.is_initialized() {
                observable.mark_initialized();
            }
            observable.set_state(State::Succeeded);
        }
        ObjectOutcome::Removed(value) => {
            observable.set(value);
            observable.set_exception(None);
            observable.set_state(State::Removed);
        }
        ObjectOutcome::Failed(error) => fail(observable, error),
        ObjectOutcome::Cancelled => {
            observable.set_state(State::Cancelled);
        }
    }
}

fn fail<O: Observable>(observable: &O, error: DataError) {
    observable.set_exception(Some(Arc::new(error)));
    observable.set_state(State::Failed);
}

/// Pending operations and the wake channel, owned by the confinement thread.
pub(crate) struct ConfinementQueue {
    wake_tx: Sender<Ticket>,
    wake_rx: Receiver<Ticket>,
    pending: RefCell<HashMap<Ticket, Box<dyn Completion>>>,
    next_ticket: Cell<Ticket>,
    hook: Option<WakeHook>,
}

impl ConfinementQueue {
    pub(crate) fn new(hook: Option<WakeHook>) -> Self {
        let (wake_tx, wake_rx) = mpsc::channel();
        Self {
            wake_tx,
            wake_rx,
            pending: RefCell::new(HashMap::new()),
            next_ticket: Cell::new(0),
            hook,
        }
    }

    /// Register an operation and return the outbox its worker posts to.
    pub(crate) fn open<M, C>(&self, completion: impl FnOnce(Receiver<M>) -> C) -> Outbox<M>
    where
        C: Completion + 'static,
    {
        let ticket = self.next_ticket.get();
        self.next_ticket.set(ticket.wrapping_add(1));
        let (messages, receiver) = mpsc::channel();
        self.pending
            .borrow_mut()
            .insert(ticket, Box::new(completion(receiver)));
        Outbox {
            ticket,
            messages,
            wake: self.wake_tx.clone(),
            hook: self.hook.clone(),
        }
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Drain every queued wake-up without blocking.
    ///
    /// Returns the number of operations that ended.
    pub(crate) fn process_pending(&self) -> usize {
        let mut finished = 0;
        while let Ok(ticket) = self.wake_rx.try_recv() {
            if self.handle(ticket) {
                finished += 1;
            }
        }
        finished
    }

    /// Drain wake-ups until nothing is pending or `timeout` elapses.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub(crate) fn run_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            self.process_pending();
            if self.pending() == 0 {
                return true;
            }
            let Some(ticket) = self.next_wake(deadline) else {
                return self.pending() == 0;
            };
            self.handle(ticket);
        }
    }

    /// Wait for the next wake-up, indefinitely when there is no deadline.
    fn next_wake(&self, deadline: Option<Instant>) -> Option<Ticket> {
        let Some(at) = deadline else {
            return self.wake_rx.recv().ok();
        };
        let remaining = at.checked_duration_since(Instant::now())?;
        self.wake_rx.recv_timeout(remaining).ok()
    }

    fn handle(&self, ticket: Ticket) -> bool {
        // Taken out of the table while draining: handlers may open new
        // operations re-entrantly.
        let Some(mut completion) = self.pending.borrow_mut().remove(&ticket) else {
            return false;
        };
        let done = completion.drain();
        if !done {
            self.pending.borrow_mut().insert(ticket, completion);
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::rc::Rc;

    #[rstest]
    fn messages_apply_in_posting_order() {
        let queue = ConfinementQueue::new(None);
        let list = ObservableList::<u8>::new();
        let outbox = queue.open(|rx| ListCompletion::new(list.clone(), rx));
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        list.subscribe_all(move |event| {
            sink.borrow_mut()
                .push((event.state(), event.source().to_vec()));
        });

        outbox.post(ListMessage::Started);
        outbox.post(ListMessage::Element(1));
        outbox.post(ListMessage::Element(2));
        outbox.post(ListMessage::Finished);
        queue.process_pending();

        assert_eq!(
            *states.borrow(),
            vec![(State::Running, vec![]), (State::Succeeded, vec![1, 2])]
        );
        assert_eq!(queue.pending(), 0);
    }

    #[rstest]
    fn partial_batches_keep_the_operation_pending() {
        let queue = ConfinementQueue::new(None);
        let object = ObservableObject::<u8>::new();
        let outbox = queue.open(|rx| ObjectCompletion::new(object.clone(), rx));

        outbox.post(ObjectMessage::Started);
        assert_eq!(queue.process_pending(), 0);
        assert_eq!(object.state(), State::Running);
        assert_eq!(queue.pending(), 1);

        outbox.post(ObjectMessage::Settled(ObjectOutcome::Succeeded(Some(9))));
        assert_eq!(queue.process_pending(), 1);
        assert_eq!(object.get(), Some(9));
        assert!(object.is_initialized());
    }

    #[rstest]
    fn dropped_outboxes_end_the_operation() {
        let queue = ConfinementQueue::new(None);
        let object = ObservableObject::<u8>::new();
        let outbox = queue.open(|rx| ObjectCompletion::new(object.clone(), rx));
        outbox.post(ObjectMessage::Started);
        drop(outbox);

        assert!(queue.run_until_idle(Duration::from_secs(1)));
        assert_eq!(object.state(), State::Running);
    }

    #[rstest]
    fn unbounded_waits_return_once_idle() {
        let queue = ConfinementQueue::new(None);
        assert!(queue.run_until_idle(Duration::MAX));

        let object = ObservableObject::<u8>::new();
        let outbox = queue.open(|rx| ObjectCompletion::new(object.clone(), rx));
        let worker = std::thread::spawn(move || {
            outbox.post(ObjectMessage::Started);
            outbox.post(ObjectMessage::Settled(ObjectOutcome::Succeeded(Some(2))));
        });

        assert!(queue.run_until_idle(Duration::MAX));
        worker.join().expect("worker thread should finish");
        assert_eq!(object.get(), Some(2));
    }

    #[rstest]
    fn removal_clears_a_previous_failure() {
        let object = ObservableObject::<u8>::new();
        object.set(Some(3));
        settle_object(&object, ObjectOutcome::Failed(DataError::domain("locked")));
        assert!(object.exception().is_some());

        settle_object(&object, ObjectOutcome::Removed(None));

        assert_eq!(object.state(), State::Removed);
        assert!(object.exception().is_none());
        assert!(object.get().is_none());
    }

    #[rstest]
    fn late_values_land_on_cancelled_objects_without_a_transition() {
        let object = ObservableObject::<u8>::new();
        settle_object(&object, ObjectOutcome::Cancelled);
        settle_object(&object, ObjectOutcome::Succeeded(Some(4)));

        assert_eq!(object.state(), State::Cancelled);
        assert_eq!(object.get(), Some(4));
    }

    #[rstest]
    fn hooks_fire_for_each_post() {
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let hook: WakeHook = Arc::new(move || {
            seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        let queue = ConfinementQueue::new(Some(hook));
        let object = ObservableObject::<u8>::new();
        let outbox = queue.open(|rx| ObjectCompletion::new(object.clone(), rx));

        outbox.post(ObjectMessage::Started);
        outbox.post(ObjectMessage::Settled(ObjectOutcome::Cancelled));

        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
