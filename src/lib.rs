//! Facade crate for Conduit, a background data-fetch dispatcher.
//!
//! This crate re-exports the lifecycle types, collaborator contracts and the
//! dispatcher, and exposes the REST and file providers behind the `data`
//! feature.

#![forbid(unsafe_code)]

pub use conduit_core::{
    DataError, InputConverter, InputDataSource, IterableInputConverter, ListChange,
    ListDataReader, ObjectDataReader, ObjectDataRemover, ObjectDataWriter, Observable,
    ObservableList, ObservableObject, OutputConverter, OutputDataSource, State, StateChangeEvent,
    Subscription,
};
pub use conduit_dispatch::{CallSiteCapture, DispatchError, Dispatcher, DispatcherConfig};

#[cfg(feature = "data")]
pub use conduit_data::{
    FileClient, JsonArrayConverter, JsonConverter, RestClient, TextConverter, VoidConverter,
};

#[cfg(feature = "test-support")]
pub use conduit_core::test_support;
