//! Core lifecycle types for Conduit data operations.
//!
//! # Responsibilities
//!
//! - Model the six-state operation lifecycle ([`State`]) and the observables
//!   that carry it ([`ObservableObject`], [`ObservableList`]).
//! - Deliver state-change notifications in a fixed, documented order
//!   ([`event`]).
//! - Define the collaborator contracts executed on worker threads: readers,
//!   writers, removers ([`provider`]), converters ([`converter`]), and byte
//!   sources ([`source`]).
//! - Describe every failure as a [`DataError`].
//!
//! # Boundaries
//!
//! Nothing here spawns threads or performs I/O. Scheduling lives in
//! `conduit-dispatch`; REST and file access live in `conduit-data`.
//!
//! # Invariants
//!
//! - Observables are `!Send`: all mutation and notification happens on the
//!   thread that created them.
//! - [`State::Cancelled`] is absorbing; later transitions are refused.
//! - The initialisation flag only ever moves from `false` to `true`.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub mod converter;
pub mod event;
mod lifecycle;
mod list;
mod object;
pub mod provider;
pub mod source;
mod state;

#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;

pub use converter::{InputConverter, IterableInputConverter, OutputConverter};
pub use error::{BoxError, DataError};
pub use event::{Notifier, StateChangeEvent, Subscription};
pub use lifecycle::Observable;
pub use list::{ListChange, ObservableList};
pub use object::ObservableObject;
pub use provider::{
    ElementIter, ListDataReader, ObjectDataReader, ObjectDataRemover, ObjectDataWriter,
};
pub use source::{InputDataSource, OutputDataSource, WriterDataSource};
pub use state::State;
