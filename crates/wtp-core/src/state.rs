//! Pool and worker lifecycle state machines

use core::fmt;

/// Lifecycle state of the pool as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Normal operation: workers come and go as `advise_max_workers` directs
    Running,

    /// Graceful shutdown: workers exit once the producer reports idle
    Shutdown,

    /// Immediate shutdown: workers exit on their next safepoint regardless
    /// of idle state
    ShutdownImmediate,
}

impl PoolState {
    /// True for either shutdown variant
    #[inline]
    pub const fn is_shutting_down(&self) -> bool {
        matches!(self, PoolState::Shutdown | PoolState::ShutdownImmediate)
    }

    #[inline]
    pub const fn is_immediate(&self) -> bool {
        matches!(self, PoolState::ShutdownImmediate)
    }
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Running => write!(f, "RUNNING"),
            PoolState::Shutdown => write!(f, "SHUTDOWN"),
            PoolState::ShutdownImmediate => write!(f, "SHUTDOWN_IMMEDIATE"),
        }
    }
}

/// Command-state of a single worker slot.
///
/// Transitions only ever move to a strictly later variant below, with the
/// sole exception of the harvester resetting a `Terminated` slot back to
/// `Stopped` once it has been joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WorkerCmd {
    /// Slot is free; no thread is running
    Stopped = 0,

    /// Thread handle acquired; thread has not yet entered the worker shell
    RunCreated = 1,

    /// Thread is inside the worker shell, holding the pool mutex during
    /// late initialization
    RunInit = 2,

    /// Thread is executing the worker loop
    Running = 3,

    /// Thread has been asked to stop, or is winding down on its own
    Terminating = 4,

    /// Thread is about to exit, or has exited; needs to be joined
    Terminated = 5,
}

impl WorkerCmd {
    /// Whether `next` is a legal transition from `self`, per the state table.
    ///
    /// The harvester's `Terminated -> Stopped` reset is intentionally not
    /// considered legal here: it is a distinct reset operation, not a
    /// worker-driven transition, and is applied directly by the harvester.
    pub const fn can_transition_to(&self, next: WorkerCmd) -> bool {
        use WorkerCmd::*;
        matches!(
            (*self, next),
            (Stopped, RunCreated)
                | (RunCreated, RunInit)
                | (RunCreated, Terminating)
                | (RunInit, Running)
                | (RunInit, Terminating)
                | (Running, Terminating)
                | (Terminating, Terminated)
        )
    }

    #[inline]
    pub const fn is_live(&self) -> bool {
        !matches!(self, WorkerCmd::Stopped)
    }
}

impl fmt::Display for WorkerCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerCmd::Stopped => "STOPPED",
            WorkerCmd::RunCreated => "RUN_CREATED",
            WorkerCmd::RunInit => "RUN_INIT",
            WorkerCmd::Running => "RUNNING",
            WorkerCmd::Terminating => "TERMINATING",
            WorkerCmd::Terminated => "TERMINATED",
        };
        write!(f, "{}", s)
    }
}
