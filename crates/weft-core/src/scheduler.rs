//! The host task runtime abstraction.
//!
//! The channel and select engine consumes only this trait; it never spawns
//! an OS thread or touches a fiber stack directly. Concrete adapters
//! (a thread-backed scheduler, a null fallback, or anything else that can
//! satisfy the receiver-priority requirement below) live in `weft-runtime`
//! and register themselves with [`set_global_scheduler`] at startup.

use crate::error::{WeftError, WeftResult};
use std::any::Any;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// The interface the channel/select engine needs from a host task runtime.
///
/// # Receiver-priority requirement
///
/// After a matched rendezvous (a send meeting a parked receiver, or a
/// receive meeting a parked sender), the receiver must be the party that
/// continues running; the sender only resumes later. [`Rendezvous`] already
/// satisfies this on its own (the matching side never blocks), so a
/// `Scheduler` built around cooperative single-threaded tasks only needs to
/// preserve this when its own yield/wake order is involved — e.g. in
/// `would_deadlock` bookkeeping.
///
/// [`Rendezvous`]: crate::rendezvous::Rendezvous
pub trait Scheduler: Send + Sync {
    /// Spawn a new task running `body`.
    fn spawn(&self, body: Box<dyn FnOnce() + Send + 'static>);

    /// Yield control to another runnable task, if any.
    fn yield_now(&self);

    /// Suspend the calling task for `duration`.
    fn sleep(&self, duration: Duration);

    /// True when no task other than the caller is runnable.
    fn would_deadlock(&self) -> bool;

    /// Route an unhandled task panic's payload to the process-wide policy.
    fn propagate_panic(&self, payload: Box<dyn Any + Send>);

    /// Record that the calling task is about to block on a channel or
    /// select operation, for `would_deadlock` bookkeeping. Default no-op
    /// for adapters that don't track this.
    fn mark_blocked(&self) {}

    /// Record that the calling task is no longer blocked. Default no-op.
    fn mark_runnable(&self) {}
}

static GLOBAL_SCHEDULER: OnceLock<Arc<dyn Scheduler>> = OnceLock::new();

/// Register the process-wide scheduler adapter.
///
/// Spec.md's Non-goals rule out retargeting after startup, so this can only
/// succeed once; later calls fail with [`WeftError::AlreadyInitialized`].
pub fn set_global_scheduler(scheduler: Arc<dyn Scheduler>) -> WeftResult<()> {
    GLOBAL_SCHEDULER
        .set(scheduler)
        .map_err(|_| WeftError::AlreadyInitialized)
}

/// Fetch the registered scheduler, failing if none has been installed.
pub fn global_scheduler() -> WeftResult<Arc<dyn Scheduler>> {
    GLOBAL_SCHEDULER.get().cloned().ok_or(WeftError::NotInitialized)
}

/// Fetch the registered scheduler without erroring when none is installed.
///
/// Channel operations use this for best-effort deadlock checks and the
/// close courtesy yield: a program exercising channels without registering
/// a scheduler (e.g. a single-threaded unit test) still gets correct
/// blocking semantics, just without deadlock detection or fairness help.
pub fn try_global_scheduler() -> Option<Arc<dyn Scheduler>> {
    GLOBAL_SCHEDULER.get().cloned()
}

#[cfg(test)]
pub(crate) fn is_initialized_for_test() -> bool {
    GLOBAL_SCHEDULER.get().is_some()
}
