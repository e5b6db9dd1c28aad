//! Lifecycle states shared by every observable.
//!
//! ```text
//! READY ──► RUNNING ──► SUCCEEDED
//!              │  ├───► FAILED
//!              │  ├───► CANCELLED  (absorbing)
//!              │  └───► REMOVED    (object variant only)
//! ```
//!
//! The table is descriptive: observables enforce only the cancellation latch
//! and the object-only restriction on [`State::Removed`]. Everything else is
//! sequenced by the dispatcher.

use std::fmt;

/// Lifecycle state of an observable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Freshly created; no operation has started.
    #[default]
    Ready,
    /// An operation is in flight on a worker.
    Running,
    /// The last operation completed and populated the observable.
    Succeeded,
    /// The last operation raised an error; see the observable's exception.
    Failed,
    /// The operation was cancelled. No further transition is accepted.
    Cancelled,
    /// A remove operation completed. Only object observables reach this state.
    Removed,
}

impl State {
    /// Every state, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Ready,
        Self::Running,
        Self::Succeeded,
        Self::Failed,
        Self::Cancelled,
        Self::Removed,
    ];

    /// Whether the state ends an operation.
    ///
    /// ```
    /// use conduit_core::State;
    ///
    /// assert!(State::Failed.is_terminal());
    /// assert!(!State::Running.is_terminal());
    /// ```
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::Removed
        )
    }

    /// Whether a transition out of this state is accepted.
    ///
    /// Only [`State::Cancelled`] refuses transitions; it latches.
    #[must_use]
    pub const fn accepts_transitions(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether entering this state notifies subscribers.
    ///
    /// Resetting to [`State::Ready`] is silent.
    #[must_use]
    pub const fn notifies(self) -> bool {
        !matches!(self, Self::Ready)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Removed => "REMOVED",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(State::Ready, false)]
    #[case(State::Running, false)]
    #[case(State::Succeeded, true)]
    #[case(State::Failed, true)]
    #[case(State::Cancelled, true)]
    #[case(State::Removed, true)]
    fn terminal_states(#[case] state: State, #[case] expected: bool) {
        assert_eq!(state.is_terminal(), expected);
    }

    #[rstest]
    fn only_cancelled_latches() {
        let latched: Vec<State> = State::ALL
            .into_iter()
            .filter(|s| !s.accepts_transitions())
            .collect();
        assert_eq!(latched, vec![State::Cancelled]);
    }

    #[rstest]
    fn only_ready_is_silent() {
        let silent: Vec<State> = State::ALL.into_iter().filter(|s| !s.notifies()).collect();
        assert_eq!(silent, vec![State::Ready]);
    }

    #[rstest]
    fn display_uses_upper_case_labels() {
        assert_eq!(State::Succeeded.to_string(), "SUCCEEDED");
    }
}
