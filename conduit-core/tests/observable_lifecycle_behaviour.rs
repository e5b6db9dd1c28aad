//! Behavioural tests for observable state transitions and notification order.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use conduit_core::{DataError, Observable, ObservableObject, State, StateChangeEvent};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Ordered record of handler invocations.
type Journal = Rc<RefCell<Vec<String>>>;

#[fixture]
fn observable() -> ObservableObject<String> {
    ObservableObject::new()
}

#[fixture]
fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

fn note(
    journal: &Journal,
    label: &'static str,
) -> impl Fn(&StateChangeEvent<ObservableObject<String>>) + 'static {
    let journal = Rc::clone(journal);
    move |event| journal.borrow_mut().push(format!("{label}:{}", event.state()))
}

// --- Given steps ---

#[given("an object observable with handlers on every tier")]
fn handlers_on_every_tier(
    #[from(observable)] observable: &ObservableObject<String>,
    #[from(journal)] journal: &Journal,
) {
    observable.subscribe_all(note(journal, "any"));
    for state in State::ALL {
        observable.set_on(state, note(journal, "primary"));
        observable.subscribe(state, note(journal, "state"));
    }
}

// --- When steps ---

#[when("the observable enters the failed state")]
fn enters_failed(#[from(observable)] observable: &ObservableObject<String>) {
    observable.set_state(State::Running);
    observable.set_exception(Some(Arc::new(DataError::domain("disk full"))));
    observable.set_state(State::Failed);
}

#[when("the observable is cancelled")]
fn cancelled(#[from(observable)] observable: &ObservableObject<String>) {
    observable.set_state(State::Cancelled);
}

#[when("the observable is told it succeeded")]
fn told_succeeded(#[from(observable)] observable: &ObservableObject<String>) {
    observable.set(Some("late".to_owned()));
    observable.set_state(State::Succeeded);
}

#[when("the observable is populated successfully")]
fn populated(#[from(observable)] observable: &ObservableObject<String>) {
    observable.set_state(State::Running);
    observable.set(Some("first".to_owned()));
    observable.mark_initialized();
    observable.set_state(State::Succeeded);
}

#[when("the observable then fails")]
fn then_fails(#[from(observable)] observable: &ObservableObject<String>) {
    observable.set_state(State::Running);
    observable.set_exception(Some(Arc::new(DataError::domain("gone away"))));
    observable.set_state(State::Failed);
}

// --- Then steps ---

#[then("the state subscriber, primary handler, and catch-all listener ran in that order")]
fn tier_order(#[from(journal)] journal: &Journal) {
    let entries = journal.borrow();
    let failed: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|entry| entry.ends_with(":FAILED"))
        .collect();
    assert_eq!(failed, vec!["state:FAILED", "primary:FAILED", "any:FAILED"]);
}

#[then("the observable remains cancelled")]
fn remains_cancelled(#[from(observable)] observable: &ObservableObject<String>) {
    assert_eq!(observable.state(), State::Cancelled);
}

#[then("only the cancellation was announced")]
fn only_cancellation(#[from(journal)] journal: &Journal) {
    assert!(
        journal.borrow().iter().all(|entry| entry.ends_with(":CANCELLED")),
        "unexpected notifications: {:?}",
        journal.borrow()
    );
}

#[then("the observable is still initialised")]
fn still_initialised(#[from(observable)] observable: &ObservableObject<String>) {
    assert_eq!(observable.state(), State::Failed);
    assert!(observable.is_initialized());
    assert_eq!(observable.get().as_deref(), Some("first"));
    let error = observable.exception().expect("failure should be recorded");
    assert_eq!(error.to_string(), "gone away");
}

// --- Scenario registrations ---

#[scenario(path = "tests/features/observable_lifecycle.feature", index = 0)]
fn notifying_in_tier_order(observable: ObservableObject<String>, journal: Journal) {
    let _ = (observable, journal);
}

#[scenario(path = "tests/features/observable_lifecycle.feature", index = 1)]
fn latching_cancelled(observable: ObservableObject<String>, journal: Journal) {
    let _ = (observable, journal);
}

#[scenario(path = "tests/features/observable_lifecycle.feature", index = 2)]
fn keeping_initialised_flag(observable: ObservableObject<String>, journal: Journal) {
    let _ = (observable, journal);
}
