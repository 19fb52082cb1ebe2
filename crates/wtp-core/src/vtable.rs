//! The `Producer` callback interface
//!
//! This is the pool's only view of the "user" object (typically a queue).
//! The pool never reaches past this trait into the producer's internals:
//! it does not store a raw mutex or condition-variable handle, only this
//! trait object. All locking the producer needs around its own busy
//! condition happens inside the trait methods themselves.

use std::any::Any;
use std::time::Instant;

use crate::cancel::CancelToken;
use crate::error::WtpResult;

/// Opaque per-call scratch payload a producer may stash across a `do_work`
/// call, so that a cooperative cancellation mid-flight can be compensated
/// for in `on_worker_cancel` with the same payload.
pub type Scratch = Box<dyn Any + Send>;

/// Outcome of `Producer::chk_stop_worker`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// Keep looping
    Continue,
    /// Wind down now
    TerminateNow,
}

/// Outcome of `Producer::on_idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleOutcome {
    /// New work arrived before the deadline; re-check `is_idle`
    WorkArrived,
    /// The deadline elapsed with no new work; the worker should self-terminate
    TimedOut,
}

/// The callback interface a producer implements to drive the pool.
///
/// Every method has a default that keeps the pool live but does no work,
/// mirroring the "not implemented" no-op callbacks a freshly constructed
/// pool installs before a real producer is attached.
///
/// # Locking
///
/// `chk_stop_worker` may be called by the pool while the pool's own mutex
/// is held. Implementations must not block on anything that could, in
/// turn, require the pool mutex (that would invert the documented lock
/// order). Every other method is called with the pool mutex NOT held.
pub trait Producer: Send + Sync {
    /// Producer-specific stop check, consulted only after the pool's own
    /// shutdown-state check has passed.
    fn chk_stop_worker(&self) -> StopSignal {
        StopSignal::Continue
    }

    /// Pure predicate: is there currently no work pending?
    fn is_idle(&self) -> bool {
        true
    }

    /// Perform one unit of work.
    ///
    /// Implementations that block should periodically call
    /// `token.check()?` so a cooperative cancellation can be observed and
    /// compensated for via `on_worker_cancel`.
    fn do_work(&self, token: &CancelToken, scratch: &mut Option<Scratch>) -> WtpResult<()> {
        let _ = (token, scratch);
        Ok(())
    }

    /// Wait for new work, up to `deadline`. Typically implemented as a
    /// condition-variable wait with a timeout over the producer's own
    /// internal mutex.
    fn on_idle(&self, deadline: Instant) -> IdleOutcome {
        let _ = deadline;
        IdleOutcome::TimedOut
    }

    /// Called once per worker thread lifetime, before the first loop
    /// iteration.
    fn on_worker_startup(&self) {}

    /// Called once per worker thread lifetime, after the loop exits.
    fn on_worker_shutdown(&self) {}

    /// Compensation hook: called when a worker observes cancellation while
    /// `scratch` held an in-flight payload, so the producer can requeue it.
    fn on_worker_cancel(&self, scratch: &mut Option<Scratch>) {
        let _ = scratch;
    }

    /// Wake at least one parked worker.
    fn wakeup_one(&self) {}

    /// Wake every parked worker.
    fn wakeup_all(&self) {}
}

/// A producer that never has work and never blocks; used as the pool's
/// default before a real producer is attached, and in unit tests that only
/// exercise pool-internal bookkeeping.
#[derive(Debug, Default)]
pub struct NullProducer;

impl Producer for NullProducer {}
