//! Error types for the weft channel/select/waitgroup engine

use core::fmt;

/// Result type for weft operations
pub type WeftResult<T> = Result<T, WeftError>;

/// Errors that can occur while using channels, select, or WaitGroup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeftError {
    /// Sent on a closed channel, or received on a closed and drained one
    ChannelClosed,

    /// A channel op or `select` would block the only runnable task
    Deadlock,

    /// Programming error in WaitGroup usage (bad `add`, unbalanced `done`,
    /// double `wait`, or `add` after finalization)
    InvalidWaitGroup(&'static str),

    /// No scheduler adapter is available under the current configuration
    NoValidBackend,

    /// Scheduler not initialized
    NotInitialized,

    /// Scheduler already initialized
    AlreadyInitialized,

    /// More than one default case was passed to `select`/`select_ok`
    MultipleDefaultCases,
}

impl fmt::Display for WeftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeftError::ChannelClosed => write!(f, "channel closed"),
            WeftError::Deadlock => write!(f, "deadlock: no other runnable task"),
            WeftError::InvalidWaitGroup(reason) => write!(f, "invalid waitgroup use: {}", reason),
            WeftError::NoValidBackend => write!(f, "no valid scheduler backend available"),
            WeftError::NotInitialized => write!(f, "scheduler not initialized"),
            WeftError::AlreadyInitialized => write!(f, "scheduler already initialized"),
            WeftError::MultipleDefaultCases => write!(f, "select given more than one default case"),
        }
    }
}

impl std::error::Error for WeftError {}
