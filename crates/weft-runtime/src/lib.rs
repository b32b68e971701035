//! # weft-runtime
//!
//! Concrete [`weft_core::Scheduler`] adapters and the glue that picks one
//! for the process.
//!
//! The only adapter right now is [`ThreadScheduler`], one OS thread per
//! spawned task. [`NullScheduler`] backs the case where no adapter could be
//! selected. [`install_default_scheduler`] reads `WEFT_BACKEND` to decide
//! which to install as the process-wide global scheduler.

#![allow(dead_code)]

pub mod scheduler;

pub use scheduler::{NullScheduler, ThreadScheduler};

use std::sync::Arc;
use weft_core::env::env_get_str;
use weft_core::error::WeftResult;
use weft_core::scheduler::{set_global_scheduler, Scheduler};

/// Recognized values for `WEFT_BACKEND`. Anything else falls back to
/// `NullScheduler`, which raises `NoValidBackend` from every operation.
const BACKEND_ENV_VAR: &str = "WEFT_BACKEND";
const BACKEND_THREAD: &str = "thread";
const BACKEND_NULL: &str = "null";

/// Build the adapter named by `WEFT_BACKEND`, defaulting to `thread` when
/// unset.
pub fn backend_from_env() -> Arc<dyn Scheduler> {
    match env_get_str(BACKEND_ENV_VAR, BACKEND_THREAD).as_str() {
        BACKEND_NULL => Arc::new(NullScheduler),
        _ => ThreadScheduler::new(),
    }
}

/// Install the `WEFT_BACKEND`-selected adapter as the process-wide global
/// scheduler. Fails with `AlreadyInitialized` if one is already installed.
pub fn install_default_scheduler() -> WeftResult<()> {
    set_global_scheduler(backend_from_env())
}
