//! # weft-core
//!
//! Platform-agnostic channel, select, and waitgroup engine: Go-style CSP
//! primitives built on a raw rendezvous handoff and a minimal `Scheduler`
//! abstraction supplied by a host task runtime.
//!
//! This crate contains no OS-specific code. Concrete scheduler adapters
//! live in `weft-runtime`.
//!
//! ## Modules
//!
//! - `id` - task identifier type
//! - `error` - error taxonomy
//! - `scheduler` - the `Scheduler` trait and global adapter registration
//! - `rendezvous` - the raw zero-capacity handoff primitive
//! - `channel` - the unified `Channel<T>` engine
//! - `select` - case objects and the `select`/`select_ok` engine
//! - `waitgroup` - one-shot fan-in counter
//! - `spinlock` - internal spinlock primitive
//! - `kprint` - kernel-style leveled debug printing macros
//! - `env` - environment variable configuration helpers
//! - `panic_policy` - process-wide unhandled-panic routing

#![allow(dead_code)]

pub mod channel;
pub mod env;
pub mod error;
pub mod id;
pub mod kprint;
pub mod panic_policy;
pub mod rendezvous;
pub mod scheduler;
pub mod select;
pub mod spinlock;
pub mod waitgroup;

pub use channel::{Capacity, Channel, ChannelIter};
pub use env::{env_get, env_get_bool, env_get_opt, env_get_str, env_is_set};
pub use error::{WeftError, WeftResult};
pub use id::TaskId;
pub use panic_policy::{set_panic_handler, PanicHandler};
pub use rendezvous::Rendezvous;
pub use scheduler::{global_scheduler, set_global_scheduler, try_global_scheduler, Scheduler};
pub use select::{dcase, rcase, scase, select, select_ok, Case, CaseValue, SelectOutcome};
pub use spinlock::SpinLock;
pub use waitgroup::WaitGroup;
