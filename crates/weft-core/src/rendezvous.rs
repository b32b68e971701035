//! Raw rendezvous primitive: a zero-capacity synchronous handoff.
//!
//! This is the parking lot the unified channel algorithm builds on. A
//! `send` either hands its value directly to an already-parked receiver,
//! or parks the caller until one arrives; `receive` is the mirror image.
//! `balance` is the signed count described in the glossary: positive
//! means senders are parked, negative means receivers are parked.
//!
//! Every parked party gets its own slot (a `Mutex`/`Condvar` pair), so
//! multiple simultaneously-parked senders or receivers queue and are
//! woken one at a time in arrival order.

use crate::spinlock::SpinLock;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

struct Slot<T> {
    value: Mutex<Option<T>>,
    cv: Condvar,
}

impl<T> Slot<T> {
    fn empty() -> Self {
        Slot {
            value: Mutex::new(None),
            cv: Condvar::new(),
        }
    }

    fn with_value(v: T) -> Self {
        Slot {
            value: Mutex::new(Some(v)),
            cv: Condvar::new(),
        }
    }

    /// Block until the slot holds a value, then take and return it.
    fn take(&self) -> T {
        let mut guard = self.value.lock().unwrap();
        while guard.is_none() {
            guard = self.cv.wait(guard).unwrap();
        }
        let v = guard.take().unwrap();
        self.cv.notify_all();
        v
    }

    /// Deposit a value into an empty slot, waking whoever is taking it.
    fn fulfil(&self, v: T) {
        let mut guard = self.value.lock().unwrap();
        *guard = Some(v);
        self.cv.notify_all();
    }

    /// Block until a value deposited via `with_value` has been taken.
    fn wait_until_taken(&self) {
        let mut guard = self.value.lock().unwrap();
        while guard.is_some() {
            guard = self.cv.wait(guard).unwrap();
        }
    }
}

struct State<T> {
    senders: VecDeque<Arc<Slot<T>>>,
    receivers: VecDeque<Arc<Slot<T>>>,
}

/// A zero-capacity synchronous handoff with an observable signed balance.
pub struct Rendezvous<T> {
    // Guards only the two queues of parked slots, never the parking wait
    // itself, so a spinlock (the teacher's choice for this kind of
    // microsecond-scale critical section) fits better than a parking
    // `Mutex`.
    state: SpinLock<State<T>>,
}

impl<T> Rendezvous<T> {
    pub fn new() -> Self {
        Rendezvous {
            state: SpinLock::new(State {
                senders: VecDeque::new(),
                receivers: VecDeque::new(),
            }),
        }
    }

    /// Signed balance: positive means senders parked, negative means
    /// receivers parked, zero means nobody is waiting.
    pub fn balance(&self) -> isize {
        let state = self.state.lock();
        state.senders.len() as isize - state.receivers.len() as isize
    }

    /// Hand `value` to a receiver. Delivers directly to an already-parked
    /// receiver if one exists, otherwise parks the caller.
    pub fn send(&self, value: T) {
        let slot = {
            let mut state = self.state.lock();
            if let Some(receiver_slot) = state.receivers.pop_front() {
                drop(state);
                receiver_slot.fulfil(value);
                return;
            }
            let slot = Arc::new(Slot::with_value(value));
            state.senders.push_back(Arc::clone(&slot));
            slot
        };
        slot.wait_until_taken();
    }

    /// Receive a value from a sender. Takes directly from an already-parked
    /// sender if one exists, otherwise parks the caller.
    ///
    /// Note this never blocks the matched sender beyond its own parking:
    /// the receiver returns immediately on a match without waiting on the
    /// sender's thread, which is what gives the receiver priority the
    /// channel algorithm depends on.
    pub fn receive(&self) -> T {
        let slot = {
            let mut state = self.state.lock();
            if let Some(sender_slot) = state.senders.pop_front() {
                drop(state);
                return sender_slot.take();
            }
            let slot = Arc::new(Slot::empty());
            state.receivers.push_back(Arc::clone(&slot));
            slot
        };
        slot.take()
    }

    /// Non-blocking send: succeeds only if a receiver is already parked.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let mut state = self.state.lock();
        if let Some(receiver_slot) = state.receivers.pop_front() {
            drop(state);
            receiver_slot.fulfil(value);
            Ok(())
        } else {
            Err(value)
        }
    }

    /// Non-blocking receive: succeeds only if a sender is already parked.
    pub fn try_receive(&self) -> Option<T> {
        let mut state = self.state.lock();
        if let Some(sender_slot) = state.senders.pop_front() {
            drop(state);
            Some(sender_slot.take())
        } else {
            None
        }
    }
}

impl<T> Default for Rendezvous<T> {
    fn default() -> Self {
        Rendezvous::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_balance_starts_zero() {
        let r: Rendezvous<i32> = Rendezvous::new();
        assert_eq!(r.balance(), 0);
    }

    #[test]
    fn test_try_send_without_receiver_fails() {
        let r: Rendezvous<i32> = Rendezvous::new();
        assert_eq!(r.try_send(7), Err(7));
    }

    #[test]
    fn test_try_receive_without_sender_fails() {
        let r: Rendezvous<i32> = Rendezvous::new();
        assert_eq!(r.try_receive(), None);
    }

    #[test]
    fn test_send_then_receive_across_threads() {
        let r = Arc::new(Rendezvous::new());
        let r2 = Arc::clone(&r);
        let handle = thread::spawn(move || {
            r2.send(42);
        });
        // Give the sender a moment to park, exercising the blocking path.
        thread::sleep(Duration::from_millis(10));
        assert_eq!(r.balance(), 1);
        let v = r.receive();
        assert_eq!(v, 42);
        handle.join().unwrap();
    }

    #[test]
    fn test_receive_then_send_across_threads() {
        let r = Arc::new(Rendezvous::new());
        let r2 = Arc::clone(&r);
        let handle = thread::spawn(move || r2.receive());
        thread::sleep(Duration::from_millis(10));
        assert_eq!(r.balance(), -1);
        r.send(99);
        let v = handle.join().unwrap();
        assert_eq!(v, 99);
    }

    #[test]
    fn test_fifo_order_among_parked_senders() {
        let r = Arc::new(Rendezvous::new());
        let mut handles = vec![];
        for i in 0..4 {
            let r2 = Arc::clone(&r);
            handles.push(thread::spawn(move || {
                r2.send(i);
            }));
            thread::sleep(Duration::from_millis(5));
        }
        thread::sleep(Duration::from_millis(10));
        assert_eq!(r.balance(), 4);
        let mut received = vec![];
        for _ in 0..4 {
            received.push(r.receive());
        }
        assert_eq!(received, vec![0, 1, 2, 3]);
        for h in handles {
            h.join().unwrap();
        }
    }
}
