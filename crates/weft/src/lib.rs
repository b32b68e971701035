//! # weft
//!
//! Go-style channels, `select`, and `WaitGroup` for cooperative Rust tasks.
//!
//! `weft` doesn't bring its own scheduler; it asks a host task runtime
//! (currently [`weft_runtime::ThreadScheduler`], one OS thread per task) to
//! supply cooperative spawn/yield/sleep, and builds CSP primitives on top.
//!
//! ## Quick start
//!
//! ```ignore
//! use weft::{chan, go, Capacity};
//!
//! weft::init().unwrap();
//!
//! let ch = chan::<i32>(0);
//! let sender = ch.clone();
//! go(move || {
//!     sender.send(42).unwrap();
//! });
//! assert_eq!(ch.recv().unwrap(), 42);
//! ```
//!
//! ## Select
//!
//! ```ignore
//! use weft::{chan, rcase, dcase, select_ok};
//!
//! let ch = chan::<i32>(1);
//! let outcome = select_ok(vec![rcase(&ch), dcase()]).unwrap();
//! ```

#![allow(dead_code)]

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

// Re-export the engine types as the public surface.
pub use weft_core::{
    dcase, env_get, env_get_bool, env_get_opt, env_get_str, env_is_set, rcase, scase, select,
    select_ok, set_panic_handler, Capacity, Case, CaseValue, Channel, ChannelIter, PanicHandler,
    Rendezvous, Scheduler, SelectOutcome, SpinLock, TaskId, WaitGroup, WeftError, WeftResult,
};

pub use weft_core::{kdebug, kerror, kinfo, kprint, kprintln, ktrace, kwarn};
pub use weft_core::kprint::{
    init as init_logging, set_flush_enabled, set_log_level, set_time_enabled, LogLevel,
};

pub use weft_runtime::{backend_from_env, install_default_scheduler, NullScheduler, ThreadScheduler};

use weft_core::scheduler::{global_scheduler, try_global_scheduler};

/// Install the `WEFT_BACKEND`-selected scheduler adapter as the process-wide
/// global scheduler. Call once at startup before `chan`/`go`/`select`.
/// Fails with `AlreadyInitialized` on a second call.
pub fn init() -> WeftResult<()> {
    install_default_scheduler()
}

/// Create a channel. `size == 0` is a synchronous (zero-capacity) channel,
/// `size > 0` a bounded buffer of that capacity, `size < 0` an unbounded one.
pub fn chan<T>(size: i64) -> Channel<T> {
    let capacity = match size {
        0 => Capacity::Sync,
        n if n > 0 => Capacity::Bounded(n as usize),
        _ => Capacity::Unbounded,
    };
    Channel::new(capacity)
}

/// Spawn `body` as a new task under the installed scheduler.
///
/// Any panic inside `body` is caught at this boundary and routed to the
/// process-wide panic handler rather than unwinding into the scheduler's
/// own thread bookkeeping; the default handler logs it and ends the
/// process. Install a different handler with [`set_panic_handler`] to
/// change that.
///
/// # Panics
///
/// Panics if no scheduler has been installed via [`init`].
pub fn go<F>(body: F)
where
    F: FnOnce() + Send + 'static,
{
    let sched = global_scheduler().expect("weft::init() must be called before spawning tasks");
    sched.spawn(Box::new(move || {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(body)) {
            propagate_panic(payload);
        }
    }));
}

/// Spawn `body` without requiring a scheduler to already be installed; the
/// `WEFT_BACKEND`-selected adapter is installed lazily on first use if none
/// is present yet.
pub fn spawn<F>(body: F)
where
    F: FnOnce() + Send + 'static,
{
    if try_global_scheduler().is_none() {
        let _ = init();
    }
    go(body);
}

fn propagate_panic(payload: Box<dyn Any + Send>) {
    match try_global_scheduler() {
        Some(sched) => sched.propagate_panic(payload),
        None => weft_core::panic_policy::invoke_panic_handler(payload),
    }
}

/// Yield the current task back to the scheduler.
pub fn yield_now() {
    match try_global_scheduler() {
        Some(sched) => sched.yield_now(),
        None => std::thread::yield_now(),
    }
}

/// Suspend the current task for `duration`.
pub fn sleep(duration: std::time::Duration) {
    match try_global_scheduler() {
        Some(sched) => sched.sleep(duration),
        None => std::thread::sleep(duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    fn ensure_scheduler() {
        let _ = init();
    }

    #[test]
    fn test_chan_size_mapping() {
        let sync_ch: Channel<i32> = chan(0);
        assert_eq!(sync_ch.capacity(), Capacity::Sync);
        let bounded_ch: Channel<i32> = chan(4);
        assert_eq!(bounded_ch.capacity(), Capacity::Bounded(4));
        let unbounded_ch: Channel<i32> = chan(-1);
        assert_eq!(unbounded_ch.capacity(), Capacity::Unbounded);
    }

    #[test]
    fn test_go_round_trip() {
        ensure_scheduler();
        let ch = chan::<i32>(0);
        let sender = ch.clone();
        go(move || {
            sender.send(42).unwrap();
        });
        assert_eq!(ch.recv().unwrap(), 42);
    }

    #[test]
    fn test_go_panic_does_not_poison_process() {
        ensure_scheduler();
        set_panic_handler(Box::new(|_payload| {}));
        let done = chan::<()>(0);
        let done2 = done.clone();
        go(move || {
            let _ = done2.clone();
            panic!("boom");
        });
        // Panic is swallowed by the installed handler; process keeps running.
        std::thread::sleep(std::time::Duration::from_millis(20));
    }

    #[test]
    fn test_select_over_spawned_sends() {
        ensure_scheduler();
        let a = chan::<i32>(1);
        let b = chan::<i32>(1);
        let total = Arc::new(AtomicI32::new(0));

        let a2 = a.clone();
        go(move || {
            a2.send(1).unwrap();
        });
        let b2 = b.clone();
        go(move || {
            b2.send(2).unwrap();
        });

        for _ in 0..2 {
            let outcome = select_ok(vec![rcase(&a), rcase(&b)]).unwrap().unwrap();
            if let Some(v) = outcome.1 {
                total.fetch_add(*v.downcast::<i32>().unwrap(), Ordering::SeqCst);
            }
        }
        assert_eq!(total.load(Ordering::SeqCst), 3);
    }
}
