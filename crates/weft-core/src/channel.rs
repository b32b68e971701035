//! The unified channel engine: one algorithm for sync, bounded, and
//! unbounded channels, parameterized on [`Capacity`].

use crate::error::{WeftError, WeftResult};
use crate::rendezvous::Rendezvous;
use crate::scheduler;
use crate::spinlock::SpinLock;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A channel's capacity. `Unbounded` is backed by a genuinely growable
/// buffer rather than a capped sentinel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Capacity 0: every send/recv is a direct rendezvous.
    Sync,
    /// Capacity n > 0.
    Bounded(usize),
    /// No effective limit; send never blocks on buffer space.
    Unbounded,
}

impl Capacity {
    fn limit(self) -> usize {
        match self {
            Capacity::Sync => 0,
            Capacity::Bounded(n) => n,
            Capacity::Unbounded => usize::MAX,
        }
    }
}

struct Shared<T> {
    capacity: Capacity,
    // Short, non-blocking critical section: a spinlock, as the teacher
    // guards its own channel buffers, rather than a parking `Mutex`.
    buffer: SpinLock<VecDeque<T>>,
    closed: AtomicBool,
    rendezvous: Rendezvous<Option<T>>,
}

/// A shared channel handle. Cloning shares the same underlying state, the
/// way Go's channel values are references to one runtime object.
pub struct Channel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Channel<T> {
    /// Create a new channel with the given capacity.
    pub fn new(capacity: Capacity) -> Self {
        Channel {
            shared: Arc::new(Shared {
                capacity,
                buffer: SpinLock::new(VecDeque::new()),
                closed: AtomicBool::new(false),
                rendezvous: Rendezvous::new(),
            }),
        }
    }

    /// The channel's fixed capacity.
    pub fn capacity(&self) -> Capacity {
        self.shared.capacity
    }

    /// True once `close` has transitioned this channel.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// True iff a subsequent `recv` would produce a value without blocking:
    /// the buffer is nonempty, or a sender is already parked.
    pub fn recv_ready(&self) -> bool {
        !self.shared.buffer.lock().is_empty() || self.shared.rendezvous.balance() > 0
    }

    /// True iff a subsequent `send` would complete without blocking: the
    /// buffer has room, or a receiver is already parked.
    pub fn send_ready(&self) -> bool {
        self.shared.rendezvous.balance() < 0
            || self.shared.buffer.lock().len() < self.shared.capacity.limit()
    }

    /// Place `v` into the channel.
    ///
    /// Fails with `ChannelClosed` if the channel is already closed, checked
    /// before blocking, and again if it closes while the caller is parked.
    pub fn send(&self, value: T) -> WeftResult<()> {
        if self.is_closed() {
            return Err(WeftError::ChannelClosed);
        }

        let (direct_handoff, buffer_full) = {
            let buffer = self.shared.buffer.lock();
            (
                self.shared.rendezvous.balance() < 0,
                buffer.len() >= self.shared.capacity.limit(),
            )
        };

        if direct_handoff || buffer_full {
            // A receiver is already parked (`direct_handoff`): the handoff
            // below completes it without blocking the caller, so there is
            // no parking to deadlock-check or count as blocked.
            let will_block = !direct_handoff;
            let sched = scheduler::try_global_scheduler();
            if will_block {
                if let Some(ref sched) = sched {
                    if sched.would_deadlock() {
                        return Err(WeftError::Deadlock);
                    }
                    sched.mark_blocked();
                }
            }
            self.shared.rendezvous.send(Some(value));
            if will_block {
                if let Some(ref sched) = sched {
                    sched.mark_runnable();
                }
            }
            if self.is_closed() {
                return Err(WeftError::ChannelClosed);
            }
        } else {
            self.shared.buffer.lock().push_back(value);
        }
        Ok(())
    }

    /// Non-blocking send: succeeds only if it would not block.
    pub fn try_send(&self, value: T) -> WeftResult<()> {
        if self.is_closed() {
            return Err(WeftError::ChannelClosed);
        }
        if !self.send_ready() {
            return Err(WeftError::Deadlock);
        }
        self.send(value)
    }

    /// Return the next value.
    ///
    /// Fails with `ChannelClosed` if the channel is closed and drained
    /// (`recv_ready()` is false), or if it closes while the caller is
    /// parked waiting for a sender.
    pub fn recv(&self) -> WeftResult<T> {
        if self.is_closed() && !self.recv_ready() {
            return Err(WeftError::ChannelClosed);
        }

        let popped = self.shared.buffer.lock().pop_front();
        if let Some(value) = popped {
            // A parked sender's value moves into the buffer to keep the
            // three-way fullness invariant and preserve FIFO.
            if self.shared.rendezvous.balance() > 0 {
                if let Some(handed_off) = self.shared.rendezvous.receive() {
                    self.shared.buffer.lock().push_back(handed_off);
                }
            }
            return Ok(value);
        }

        // A sender is already parked: `receive()` below completes
        // immediately against it, so this call never actually blocks and
        // must not be treated as a deadlock candidate.
        let sender_waiting = self.shared.rendezvous.balance() > 0;
        let sched = scheduler::try_global_scheduler();
        if !sender_waiting {
            if let Some(ref sched) = sched {
                if sched.would_deadlock() {
                    return Err(WeftError::Deadlock);
                }
                sched.mark_blocked();
            }
        }
        let received = self.shared.rendezvous.receive();
        if !sender_waiting {
            if let Some(ref sched) = sched {
                sched.mark_runnable();
            }
        }

        match received {
            Some(value) => Ok(value),
            None => Err(WeftError::ChannelClosed),
        }
    }

    /// Non-blocking receive: succeeds only if it would not block.
    pub fn try_recv(&self) -> WeftResult<T> {
        if self.is_closed() && !self.recv_ready() {
            return Err(WeftError::ChannelClosed);
        }
        if !self.recv_ready() {
            return Err(WeftError::Deadlock);
        }
        self.recv()
    }

    /// Idempotent transition to closed. Wakes every currently parked
    /// sender and receiver so each re-checks and raises `ChannelClosed`.
    pub fn close(&self) {
        if self.is_closed() {
            return;
        }

        // Courtesy yield: give an already-ready handoff a last chance to
        // complete before anyone observes the closed state.
        if let Some(sched) = scheduler::try_global_scheduler() {
            sched.yield_now();
        }

        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return; // someone else closed it during the yield above
        }

        // Wake parked receivers with the close sentinel, one per balance unit.
        while self.shared.rendezvous.balance() < 0 {
            self.shared.rendezvous.send(None);
        }
        // Drain parked senders; their values are discarded, matching
        // "send on closed channel fails" for callers already blocked.
        while self.shared.rendezvous.balance() > 0 {
            self.shared.rendezvous.receive();
        }
    }
}

/// Lazy iterator over `recv()` values, ending (not erroring) at `ChannelClosed`.
pub struct ChannelIter<T> {
    channel: Channel<T>,
}

impl<T> Iterator for ChannelIter<T> {
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.channel.recv().ok()
    }
}

impl<T> IntoIterator for Channel<T> {
    type Item = T;
    type IntoIter = ChannelIter<T>;
    fn into_iter(self) -> ChannelIter<T> {
        ChannelIter { channel: self }
    }
}

impl<T> IntoIterator for &Channel<T> {
    type Item = T;
    type IntoIter = ChannelIter<T>;
    fn into_iter(self) -> ChannelIter<T> {
        ChannelIter {
            channel: self.clone(),
        }
    }
}
