//! One-shot fan-in counter, usable standalone or as a select case.

use crate::channel::{Capacity, Channel};
use crate::error::{WeftError, WeftResult};
use crate::select::{rcase, Case};
use std::sync::Mutex;

struct State {
    count: i64,
    finalized: bool,
    signal: Option<Channel<()>>,
}

/// A one-shot fan-in barrier built atop a bounded(1) signal channel.
///
/// `add`/`done` may be called any number of times before the first
/// `wait`/`wait_case`; after that call the group is finalized and a second
/// `wait`/`wait_case`, or any further `add`, fails with `InvalidWaitGroup`.
pub struct WaitGroup {
    state: Mutex<State>,
}

impl WaitGroup {
    /// A fresh WaitGroup with counter 0.
    pub fn new() -> Self {
        WaitGroup {
            state: Mutex::new(State {
                count: 0,
                finalized: false,
                signal: None,
            }),
        }
    }

    /// A fresh WaitGroup pre-seeded with an initial `add(delta)`.
    pub fn with_delta(delta: i64) -> WeftResult<Self> {
        let wg = WaitGroup::new();
        wg.add(delta)?;
        Ok(wg)
    }

    /// Increment the counter by `n`. `n` must be positive; forbidden after
    /// finalization.
    pub fn add(&self, n: i64) -> WeftResult<()> {
        if n <= 0 {
            return Err(WeftError::InvalidWaitGroup("add delta must be positive"));
        }
        let mut state = self.state.lock().unwrap();
        if state.finalized {
            return Err(WeftError::InvalidWaitGroup("add called after wait"));
        }
        state.count += n;
        Ok(())
    }

    /// Decrement the counter by one. Reaching zero signals the lazily
    /// allocated wait channel, if `wait`/`wait_case` already allocated one.
    pub fn done(&self) -> WeftResult<()> {
        let signal = {
            let mut state = self.state.lock().unwrap();
            state.count -= 1;
            if state.count < 0 {
                return Err(WeftError::InvalidWaitGroup(
                    "done called more times than add",
                ));
            }
            if state.count == 0 {
                state.signal.clone()
            } else {
                None
            }
        };
        if let Some(ch) = signal {
            // Best-effort: if nobody is waiting yet there is no channel to
            // signal, which is exactly the branch above skips.
            let _ = ch.send(());
        }
        Ok(())
    }

    /// Finalize the group and block until the counter reaches zero.
    /// Succeeds immediately if it is already zero. A second call fails.
    pub fn wait(&self) -> WeftResult<()> {
        let channel = self.finalize_and_signal_channel()?;
        match channel {
            None => Ok(()),
            Some(ch) => ch.recv().map(|_| ()),
        }
    }

    /// Finalize the group and return a `RecvCase` over its signal channel,
    /// so a `WaitGroup` composes into a `select` alongside ordinary
    /// channel cases. If the counter was already zero, the returned case's
    /// channel is pre-primed and fires immediately.
    pub fn wait_case(&self) -> WeftResult<Box<dyn Case>> {
        match self.finalize_and_signal_channel()? {
            Some(ch) => Ok(rcase(&ch)),
            None => {
                let ch = Channel::new(Capacity::Bounded(1));
                let _ = ch.send(());
                Ok(rcase(&ch))
            }
        }
    }

    fn finalize_and_signal_channel(&self) -> WeftResult<Option<Channel<()>>> {
        let mut state = self.state.lock().unwrap();
        if state.finalized {
            return Err(WeftError::InvalidWaitGroup(
                "wait/wait_case called more than once",
            ));
        }
        state.finalized = true;
        if state.count == 0 {
            return Ok(None);
        }
        let ch = Channel::new(Capacity::Bounded(1));
        state.signal = Some(ch.clone());
        Ok(Some(ch))
    }
}

impl Default for WaitGroup {
    fn default() -> Self {
        WaitGroup::new()
    }
}
