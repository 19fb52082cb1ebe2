//! Error types for the worker thread pool engine

use core::fmt;

/// Result type for pool/worker operations
pub type WtpResult<T> = Result<T, WtpError>;

/// Errors surfaced by the pool and worker API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WtpError {
    /// Allocation failure while growing the slot table or copying a debug tag
    OutOfMemory,

    /// `advise_max_workers`/`start_worker` found no free slot
    NoMoreThreads,

    /// `shutdown_all` did not drain before its deadline
    TimedOut,

    /// A configuration setter was called after `finalize`, or an invalid
    /// argument was passed (e.g. `shutdown_all` with `PoolState::Running`)
    ParamError,

    /// A worker observed its cancellation token while inside `do_work`
    Cancelled,
}

impl fmt::Display for WtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WtpError::OutOfMemory => write!(f, "out of memory"),
            WtpError::NoMoreThreads => write!(f, "no more worker threads available"),
            WtpError::TimedOut => write!(f, "operation timed out"),
            WtpError::ParamError => write!(f, "invalid parameter or state"),
            WtpError::Cancelled => write!(f, "worker cancelled"),
        }
    }
}

impl std::error::Error for WtpError {}
