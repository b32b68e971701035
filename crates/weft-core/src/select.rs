//! The select engine: case objects plus the ready-scan / default-fallback /
//! deadlock-checked poll loop.
//!
//! Rust has no runtime reflection, so selecting over cases bound to
//! channels of different element types needs one level of type erasure —
//! the same accommodation Go's own `reflect.Select` makes. A fired
//! `RecvCase` returns its value as `Box<dyn Any + Send>`; callers downcast
//! to the type they know the channel carries.

use crate::channel::Channel;
use crate::error::{WeftError, WeftResult};
use crate::scheduler;
use std::any::Any;
use std::sync::Mutex;

/// What executing a ready case produced.
pub enum CaseValue {
    /// A `RecvCase` fired; the boxed value came out of the channel.
    Recv(Box<dyn Any + Send>),
    /// A `SendCase` or `DefaultCase` fired; there is no value to report.
    None,
}

/// A single communication attempt, bound to zero or one channel.
///
/// Implementors are constructed once per `select` call and live only for
/// its duration, mirroring the case-object lifetime in the data model.
pub trait Case: Send {
    /// True iff executing this case right now would not block.
    fn ready(&self) -> bool;

    /// True only for the one allowed default case.
    fn is_default(&self) -> bool {
        false
    }

    /// Perform the communication. Only called when `ready()` was true (or
    /// for the default case, when nothing else was ready).
    fn exec(&self) -> WeftResult<CaseValue>;
}

struct RecvCase<T> {
    channel: Channel<T>,
}

impl<T: Send + 'static> Case for RecvCase<T> {
    fn ready(&self) -> bool {
        self.channel.is_closed() || self.channel.recv_ready()
    }

    fn exec(&self) -> WeftResult<CaseValue> {
        let value = self.channel.recv()?;
        Ok(CaseValue::Recv(Box::new(value)))
    }
}

struct SendCase<T> {
    channel: Channel<T>,
    value: Mutex<Option<T>>,
}

impl<T: Send + 'static> Case for SendCase<T> {
    fn ready(&self) -> bool {
        self.channel.is_closed() || self.channel.send_ready()
    }

    fn exec(&self) -> WeftResult<CaseValue> {
        let value = self
            .value
            .lock()
            .unwrap()
            .take()
            .expect("SendCase executed more than once");
        self.channel.send(value)?;
        Ok(CaseValue::None)
    }
}

struct DefaultCase;

impl Case for DefaultCase {
    fn ready(&self) -> bool {
        false
    }

    fn is_default(&self) -> bool {
        true
    }

    fn exec(&self) -> WeftResult<CaseValue> {
        Ok(CaseValue::None)
    }
}

/// A case that receives from `channel` when selected.
pub fn rcase<T: Send + 'static>(channel: &Channel<T>) -> Box<dyn Case> {
    Box::new(RecvCase {
        channel: channel.clone(),
    })
}

/// A case that sends `value` on `channel` when selected.
pub fn scase<T: Send + 'static>(channel: &Channel<T>, value: T) -> Box<dyn Case> {
    Box::new(SendCase {
        channel: channel.clone(),
        value: Mutex::new(Some(value)),
    })
}

/// A case that fires only when no other case is ready.
pub fn dcase() -> Box<dyn Case> {
    Box::new(DefaultCase)
}

/// `(chosen_case_index, erased_recv_value, ok)`.
///
/// `ok` is false iff the chosen channel was closed-and-drained. `value` is
/// `Some` only for a fired `RecvCase`.
pub type SelectOutcome = (usize, Option<Box<dyn Any + Send>>, bool);

fn exec_at(index: usize, case: &dyn Case) -> WeftResult<SelectOutcome> {
    match case.exec() {
        Ok(CaseValue::Recv(v)) => Ok((index, Some(v), true)),
        Ok(CaseValue::None) => Ok((index, None, true)),
        Err(WeftError::ChannelClosed) => Ok((index, None, false)),
        Err(e) => Err(e),
    }
}

/// `select_ok`: returns `None` for an empty case list (a no-op), otherwise
/// `Some((chosen_case, value, ok))` with `ok` carrying whether the chosen
/// channel was closed-and-drained rather than raising for it.
pub fn select_ok(cases: Vec<Box<dyn Case>>) -> WeftResult<Option<SelectOutcome>> {
    if cases.is_empty() {
        return Ok(None);
    }

    let default_count = cases.iter().filter(|c| c.is_default()).count();
    if default_count > 1 {
        return Err(WeftError::MultipleDefaultCases);
    }
    let default_index = cases.iter().position(|c| c.is_default());

    for (i, case) in cases.iter().enumerate() {
        if case.is_default() {
            continue;
        }
        if case.ready() {
            return exec_at(i, case.as_ref());
        }
    }

    if let Some(i) = default_index {
        return Ok(Some((i, None, true)));
    }

    let sched = scheduler::try_global_scheduler();
    if let Some(ref sched) = sched {
        if sched.would_deadlock() {
            return Err(WeftError::Deadlock);
        }
        sched.mark_blocked();
    }

    let result = loop {
        let mut fired = None;
        for (i, case) in cases.iter().enumerate() {
            if case.is_default() {
                continue;
            }
            if case.ready() {
                fired = Some(exec_at(i, case.as_ref()));
                break;
            }
        }
        if let Some(outcome) = fired {
            break outcome;
        }
        match sched {
            Some(ref sched) => sched.yield_now(),
            None => std::thread::yield_now(),
        }
    };

    if let Some(ref sched) = sched {
        sched.mark_runnable();
    }
    result
}

/// `select`: like `select_ok`, but raises `ChannelClosed` instead of
/// returning `ok = false`.
pub fn select(cases: Vec<Box<dyn Case>>) -> WeftResult<Option<(usize, Option<Box<dyn Any + Send>>)>> {
    match select_ok(cases)? {
        None => Ok(None),
        Some((_, _, false)) => Err(WeftError::ChannelClosed),
        Some((i, v, true)) => Ok(Some((i, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Capacity;

    #[test]
    fn test_select_first_ready_s4() {
        let a: Channel<i32> = Channel::new(Capacity::Bounded(1));
        let b: Channel<i32> = Channel::new(Capacity::Bounded(1));
        b.send(3).unwrap();

        let outcome = select_ok(vec![rcase(&a), rcase(&b), dcase()])
            .unwrap()
            .unwrap();
        assert_eq!(outcome.0, 1);
        let value = *outcome.1.unwrap().downcast::<i32>().unwrap();
        assert_eq!(value, 3);
        assert!(outcome.2);
    }

    #[test]
    fn test_select_default_fallback_s5() {
        let a: Channel<i32> = Channel::new(Capacity::Sync);
        let outcome = select_ok(vec![rcase(&a), dcase()]).unwrap().unwrap();
        assert_eq!(outcome.0, 1);
        assert!(outcome.1.is_none());
        assert!(outcome.2);
    }

    #[test]
    fn test_select_empty_is_noop() {
        let outcome = select_ok(vec![]).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_select_rejects_multiple_defaults() {
        let err = select_ok(vec![dcase(), dcase()]).unwrap_err();
        assert_eq!(err, WeftError::MultipleDefaultCases);
    }

    #[test]
    fn test_select_list_order_tie_break() {
        let a: Channel<i32> = Channel::new(Capacity::Bounded(1));
        let b: Channel<i32> = Channel::new(Capacity::Bounded(1));
        a.send(1).unwrap();
        b.send(2).unwrap();

        let outcome = select_ok(vec![rcase(&a), rcase(&b)]).unwrap().unwrap();
        assert_eq!(outcome.0, 0);
    }

    #[test]
    fn test_select_raises_on_closed_channel() {
        let a: Channel<i32> = Channel::new(Capacity::Sync);
        a.close();
        let err = select(vec![rcase(&a)]).unwrap_err();
        assert_eq!(err, WeftError::ChannelClosed);
    }

    #[test]
    fn test_send_case_fires() {
        let ch: Channel<i32> = Channel::new(Capacity::Bounded(1));
        let outcome = select_ok(vec![scase(&ch, 7)]).unwrap().unwrap();
        assert_eq!(outcome.0, 0);
        assert_eq!(ch.recv().unwrap(), 7);
    }
}
