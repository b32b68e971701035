//! Concrete `Scheduler` adapters.
//!
//! `ThreadScheduler` spawns one OS thread per task (mirroring the
//! one-greenlet-per-`go()` behavior of the original's gevent backend) and
//! tracks runnable-vs-blocked task counts with atomics to answer
//! `would_deadlock`. `NullScheduler` backs the "no adapter available"
//! fallback path.

use crossbeam_queue::SegQueue;
use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use weft_core::error::WeftError;
use weft_core::id::TaskId;
use weft_core::kprint;
use weft_core::panic_policy::invoke_panic_handler;
use weft_core::scheduler::Scheduler;

struct AliveGuard {
    alive: Arc<AtomicUsize>,
}

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.alive.fetch_sub(1, Ordering::SeqCst);
        kprint::clear_task_id();
    }
}

/// One OS thread per spawned task.
///
/// `alive` starts at 1, counting the founding (main) task, which is never
/// itself spawned through this scheduler but still occupies a runnable
/// slot. Every `spawn` adds one; every task's exit (panicking or not)
/// removes one. `blocked` tracks tasks currently parked inside a channel
/// or select operation. `would_deadlock` is true exactly when the number
/// of alive-but-not-blocked tasks, excluding the caller, is zero.
pub struct ThreadScheduler {
    alive: Arc<AtomicUsize>,
    blocked: Arc<AtomicUsize>,
    handles: SegQueue<JoinHandle<()>>,
}

impl ThreadScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(ThreadScheduler {
            alive: Arc::new(AtomicUsize::new(1)),
            blocked: Arc::new(AtomicUsize::new(0)),
            handles: SegQueue::new(),
        })
    }

    /// Join every task spawned so far. Intended for orderly shutdown; does
    /// not prevent further spawns.
    pub fn join_all(&self) {
        while let Some(handle) = self.handles.pop() {
            let _ = handle.join();
        }
    }

    /// Number of tasks spawned through this scheduler that haven't
    /// finished, including the founding task's baseline slot.
    pub fn alive_count(&self) -> usize {
        self.alive.load(Ordering::SeqCst)
    }
}

impl Scheduler for ThreadScheduler {
    fn spawn(&self, body: Box<dyn FnOnce() + Send + 'static>) {
        self.alive.fetch_add(1, Ordering::SeqCst);
        let alive = Arc::clone(&self.alive);
        let task_id = TaskId::next();

        let handle = thread::Builder::new()
            .name(format!("weft-task-{}", task_id))
            .spawn(move || {
                let _guard = AliveGuard { alive };
                kprint::set_task_id(task_id.as_u64());
                body();
            })
            .expect("failed to spawn OS thread for task");
        self.handles.push(handle);
    }

    fn yield_now(&self) {
        thread::yield_now();
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }

    fn would_deadlock(&self) -> bool {
        let alive = self.alive.load(Ordering::SeqCst);
        let blocked = self.blocked.load(Ordering::SeqCst);
        alive.saturating_sub(blocked) <= 1
    }

    fn propagate_panic(&self, payload: Box<dyn Any + Send>) {
        invoke_panic_handler(payload);
    }

    fn mark_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::SeqCst);
    }

    fn mark_runnable(&self) {
        self.blocked.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        // Only used where callers need a bare value rather than the `Arc`
        // `new()` returns (e.g. wrapping in their own `Arc` for tests).
        ThreadScheduler {
            alive: Arc::new(AtomicUsize::new(1)),
            blocked: Arc::new(AtomicUsize::new(0)),
            handles: SegQueue::new(),
        }
    }
}

/// Raised from every operation: backs the "no valid adapter" fallback when
/// `WEFT_BACKEND` names an adapter that isn't compiled in, or none is
/// configured at all.
pub struct NullScheduler;

impl Scheduler for NullScheduler {
    fn spawn(&self, _body: Box<dyn FnOnce() + Send + 'static>) {
        panic!("{}", WeftError::NoValidBackend);
    }

    fn yield_now(&self) {}

    fn sleep(&self, _duration: Duration) {}

    fn would_deadlock(&self) -> bool {
        true
    }

    fn propagate_panic(&self, payload: Box<dyn Any + Send>) {
        invoke_panic_handler(payload);
    }
}
