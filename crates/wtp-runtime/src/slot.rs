//! Worker slot (WTI) - one per pool capacity unit
//!
//! A slot owns the command-state cell, the OS thread handle once one is
//! running, the "startup done" condition, and the cooperative cancellation
//! token for whatever thread currently occupies it.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;

use wtp_core::{CancelToken, WorkerCmd};

/// A single worker slot.
///
/// Slots never move or get reallocated after the pool finalizes
/// construction: the pool holds them in a `Vec` indexed by slot number for
/// the lifetime of the pool.
pub struct WorkerSlot {
    pub index: usize,
    pub debug_tag: String,
    cmd: Mutex<WorkerCmd>,
    started: Condvar,
    handle: Mutex<Option<JoinHandle<()>>>,
    cancel: Mutex<CancelToken>,
}

impl WorkerSlot {
    pub fn new(index: usize, debug_tag: String) -> Self {
        Self {
            index,
            debug_tag,
            cmd: Mutex::new(WorkerCmd::Stopped),
            started: Condvar::new(),
            handle: Mutex::new(None),
            cancel: Mutex::new(CancelToken::new()),
        }
    }

    /// Current command-state
    pub fn get_state(&self) -> WorkerCmd {
        *self.cmd.lock().unwrap()
    }

    /// Transition to `next`, refusing the change per `active_only` semantics:
    /// when `active_only` is true, a `Stopped` slot is left untouched (used
    /// to address every *live* worker without accidentally booting a dead
    /// slot, e.g. a broadcast shutdown request).
    ///
    /// Panics (a programmer error, not a runtime error) if the transition is
    /// not legal per the state table and the slot is live.
    pub fn set_state(&self, next: WorkerCmd, active_only: bool) {
        let mut guard = self.cmd.lock().unwrap();
        self.set_state_locked(&mut guard, next, active_only);
    }

    fn set_state_locked(&self, guard: &mut MutexGuard<'_, WorkerCmd>, next: WorkerCmd, active_only: bool) {
        if active_only && **guard == WorkerCmd::Stopped {
            return;
        }
        debug_assert!(
            guard.can_transition_to(next),
            "illegal worker-cmd transition {} -> {} on slot {}",
            **guard,
            next,
            self.index
        );
        **guard = next;
    }

    /// The harvester's reset: `Terminated -> Stopped`. Distinct from
    /// `set_state` because it is the one transition that is allowed to
    /// regress, and only the harvester performs it, only after a
    /// successful join.
    fn reset_to_stopped(&self) {
        let mut guard = self.cmd.lock().unwrap();
        debug_assert_eq!(*guard, WorkerCmd::Terminated, "only a Terminated slot may be reset");
        *guard = WorkerCmd::Stopped;
    }

    /// Install the freshly spawned thread's handle
    pub fn set_handle(&self, handle: JoinHandle<()>) {
        *self.handle.lock().unwrap() = Some(handle);
    }

    /// Signal that this thread has completed its one-shot startup sequence
    pub fn signal_started(&self) {
        self.started.notify_all();
    }

    /// Wait (with a deadline) for this thread to report it has completed
    /// startup. Kept for producers that depend on "worker N is up" ordering
    /// even though the pool's own shutdown logic does not need it.
    pub fn wait_started(&self, deadline: std::time::Instant) -> bool {
        let guard = self.cmd.lock().unwrap();
        if *guard >= WorkerCmd::Running {
            return true;
        }
        let now = std::time::Instant::now();
        if deadline <= now {
            return *guard >= WorkerCmd::Running;
        }
        let (guard, _) = self
            .started
            .wait_timeout(guard, deadline - now)
            .unwrap();
        *guard >= WorkerCmd::Running
    }

    /// This slot's cooperative cancellation token for the thread currently
    /// occupying it (if any)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.lock().unwrap().clone()
    }

    /// Request cancellation of whatever thread currently occupies this slot
    pub fn cancel(&self) {
        self.cancel.lock().unwrap().cancel();
    }

    /// Re-arm the cancellation token for a freshly spawned thread, dropping
    /// any stale cancellation flag from a previous occupant.
    fn rearm_cancel_token(&self) {
        *self.cancel.lock().unwrap() = CancelToken::new();
    }

    /// Prepare the slot for a new worker thread about to be spawned:
    /// transitions `Stopped -> RunCreated` and rearms the cancel token.
    pub fn prepare_for_spawn(&self) {
        self.set_state(WorkerCmd::RunCreated, false);
        self.rearm_cancel_token();
    }

    /// Called by the slot's own thread once it is inside the worker shell
    pub fn mark_run_init(&self) {
        self.set_state(WorkerCmd::RunInit, false);
    }

    /// Called by the slot's own thread once it begins executing the worker loop
    pub fn mark_running(&self) {
        self.set_state(WorkerCmd::Running, false);
        self.signal_started();
    }

    /// Called by the slot's own thread when it is winding down
    pub fn mark_terminating(&self) {
        self.set_state(WorkerCmd::Terminating, false);
    }

    /// Called by the slot's own thread right before it returns; the caller
    /// is responsible for setting the pool's `any_thread_state_changed` hint.
    pub fn mark_terminated(&self) {
        self.set_state(WorkerCmd::Terminated, false);
    }

    /// If this slot is `Terminated`, join its thread handle and reset it to
    /// `Stopped`. A no-op (and safe to call repeatedly) otherwise.
    pub fn process_thread_changes(&self) {
        if self.get_state() != WorkerCmd::Terminated {
            return;
        }
        let handle = self.handle.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        self.reset_to_stopped();
    }
}
