//! Background execution of Conduit data operations.
//!
//! [`Dispatcher`] maps each fetch, store, remove, or list request onto a
//! bounded pool of named worker threads, tracks it through the lifecycle in
//! [`conduit_core::State`], and republishes every result on the thread that
//! owns the dispatcher.
//!
//! Completions do not apply themselves. The owning thread drains them with
//! [`Dispatcher::process_pending`] (typically from a UI loop, prompted by the
//! [`DispatcherConfig::with_wakeup`] hook) or [`Dispatcher::run_until_idle`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod call_site;
mod config;
mod confinement;
mod dispatcher;
mod error;
mod pool;

pub use config::{
    CallSiteCapture, DEFAULT_POOL_SIZE, DEFAULT_THREAD_PREFIX, DispatcherConfig, WakeHook,
};
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
