//! Worker thread pool (WTP)
//!
//! Owns the slot table, the global lifecycle state, and the termination
//! condition. Drives a pluggable `Producer` by spawning, parking,
//! cancelling and harvesting OS threads in response to `advise_max_workers`
//! and `shutdown_all`.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use wtp_core::{IdleOutcome, NullProducer, PoolState, Producer, Scratch, StopSignal, WorkerCmd, WtpError, WtpResult};
use wtp_core::{wdebug, winfo, wwarn};

use crate::slot::WorkerSlot;

/// Fields protected by the pool mutex
struct Guarded {
    cur_running: usize,
    state: PoolState,
    inactivity_guard: bool,
    any_thread_state_changed: bool,
}

struct PoolInner {
    max_workers: usize,
    shutdown_timeout: Duration,
    debug_tag: String,
    producer: Arc<dyn Producer>,
    mutex: Mutex<Guarded>,
    term_cond: Condvar,
    slots: Vec<WorkerSlot>,
}

/// Builder for a `Pool`. All configuration happens here; once `finalize` is
/// called, the resulting `Pool` is immutable except for the runtime surface
/// (`advise_max_workers`, `shutdown_all`, ...).
pub struct PoolBuilder {
    max_workers: usize,
    shutdown_timeout: Duration,
    debug_tag: String,
    producer: Arc<dyn Producer>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            max_workers: 1,
            shutdown_timeout: Duration::from_secs(60),
            debug_tag: "wtp".to_string(),
            producer: Arc::new(NullProducer),
        }
    }
}

impl PoolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_workers(mut self, n: usize) -> Self {
        self.max_workers = n;
        self
    }

    pub fn shutdown_timeout(mut self, d: Duration) -> Self {
        self.shutdown_timeout = d;
        self
    }

    pub fn debug_tag(mut self, tag: impl Into<String>) -> Self {
        self.debug_tag = tag.into();
        self
    }

    pub fn producer(mut self, producer: Arc<dyn Producer>) -> Self {
        self.producer = producer;
        self
    }

    /// Allocate the slot table and construct each worker slot. After this
    /// call, the returned `Pool` no longer exposes configuration setters.
    pub fn finalize(self) -> WtpResult<Pool> {
        if self.max_workers == 0 {
            return Err(WtpError::ParamError);
        }

        let mut slots = Vec::with_capacity(self.max_workers);
        for i in 0..self.max_workers {
            slots.push(WorkerSlot::new(i, format!("{}/w{}", self.debug_tag, i)));
        }

        let inner = Arc::new(PoolInner {
            max_workers: self.max_workers,
            shutdown_timeout: self.shutdown_timeout,
            debug_tag: self.debug_tag,
            producer: self.producer,
            mutex: Mutex::new(Guarded {
                cur_running: 0,
                state: PoolState::Running,
                inactivity_guard: false,
                any_thread_state_changed: false,
            }),
            term_cond: Condvar::new(),
            slots,
        });

        winfo!(&inner.debug_tag, "finalized with {} worker slots", inner.max_workers);
        Ok(Pool { inner })
    }
}

/// A finalized worker thread pool. Cheap to clone: clones share the same
/// underlying slot table and state.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    pub fn max_workers(&self) -> usize {
        self.inner.max_workers
    }

    /// Number of workers currently alive (created but not yet harvested)
    pub fn cur_running(&self) -> usize {
        self.inner.mutex.lock().unwrap().cur_running
    }

    pub fn state(&self) -> PoolState {
        self.inner.mutex.lock().unwrap().state
    }

    /// Force the pool's lifecycle state directly; exposed for test harnesses
    /// that want to drive the state machine without a full `shutdown_all`.
    pub fn set_state(&self, state: PoolState) {
        self.inner.mutex.lock().unwrap().state = state;
    }

    /// Hint that up to `n` workers should be running.
    ///
    /// Never blocks on the producer. If fewer than `n` are running, starts
    /// enough to reach `n` (clamped to `max_workers`). Otherwise, wakes a
    /// parked worker so it re-evaluates `is_idle`/`do_work`.
    pub fn advise_max_workers(&self, n: usize) -> WtpResult<()> {
        if n == 0 {
            return Ok(());
        }

        self.process_thread_changes();

        let mut guard = self.inner.mutex.lock().unwrap();
        let missing = n
            .saturating_sub(guard.cur_running)
            .min(self.inner.max_workers);

        if missing > 0 {
            wdebug!(&self.inner.debug_tag, "advise_max_workers({}) starting {} worker(s)", n, missing);
            for _ in 0..missing {
                self.start_worker(&mut guard)?;
            }
        } else {
            drop(guard);
            wdebug!(&self.inner.debug_tag, "advise_max_workers({}) signals busy", n);
            self.inner.producer.wakeup_one();
        }

        Ok(())
    }

    /// Start exactly one worker. Caller must hold `guard`.
    fn start_worker(&self, guard: &mut std::sync::MutexGuard<'_, Guarded>) -> WtpResult<()> {
        guard.cur_running += 1;

        let slot_idx = self
            .inner
            .slots
            .iter()
            .position(|s| s.get_state() == WorkerCmd::Stopped);

        let slot_idx = match slot_idx {
            Some(i) => i,
            None => {
                guard.cur_running -= 1;
                wwarn!(&self.inner.debug_tag, "no free worker slot, NoMoreThreads");
                return Err(WtpError::NoMoreThreads);
            }
        };

        self.inner.slots[slot_idx].prepare_for_spawn();

        let inner = Arc::clone(&self.inner);
        let spawned = thread::Builder::new()
            .name(self.inner.slots[slot_idx].debug_tag.clone())
            .spawn(move || worker_shell(inner, slot_idx));

        match spawned {
            Ok(handle) => {
                self.inner.slots[slot_idx].set_handle(handle);
                guard.inactivity_guard = true;
                thread::yield_now();
                Ok(())
            }
            Err(e) => {
                // std::thread::Builder::spawn fails synchronously: unlike a
                // fire-and-forget pthread_create, no child will ever report
                // termination for a thread that was never created, so we
                // reclaim the slot and the running-count immediately.
                wwarn!(&self.inner.debug_tag, "failed to spawn worker {}: {}", slot_idx, e);
                self.inner.slots[slot_idx].mark_terminating();
                self.inner.slots[slot_idx].mark_terminated();
                self.inner.slots[slot_idx].process_thread_changes();
                guard.cur_running -= 1;
                Err(WtpError::NoMoreThreads)
            }
        }
    }

    /// Request shutdown of every worker and wait (up to `deadline_from_now`)
    /// for them to drain.
    pub fn shutdown_all(&self, cmd: PoolState, deadline_from_now: Duration) -> WtpResult<()> {
        if !cmd.is_shutting_down() {
            return Err(WtpError::ParamError);
        }

        self.set_state(cmd);
        winfo!(&self.inner.debug_tag, "shutdown_all({}) requested", cmd);
        self.inner.producer.wakeup_all();

        let deadline = Instant::now() + deadline_from_now;
        let mut guard = self.inner.mutex.lock().unwrap();
        let mut timed_out = false;
        while guard.cur_running > 0 {
            let now = Instant::now();
            if now >= deadline {
                timed_out = true;
                break;
            }
            let (g, wait_result) = self
                .inner
                .term_cond
                .wait_timeout(guard, deadline - now)
                .unwrap();
            guard = g;
            if wait_result.timed_out() && guard.cur_running > 0 {
                timed_out = true;
                break;
            }
        }
        drop(guard);

        self.process_thread_changes();

        if timed_out {
            wwarn!(&self.inner.debug_tag, "shutdown_all timed out with workers still running");
            Err(WtpError::TimedOut)
        } else {
            winfo!(&self.inner.debug_tag, "shutdown_all complete, all workers drained");
            Ok(())
        }
    }

    /// Cooperative cancellation of last resort: sets the cancel token on
    /// every live slot, not only those already past `Terminating`.
    ///
    /// The source this engine is modeled on gates its cancellation on
    /// `tCurrCmd >= eWRKTHRD_TERMINATING` - a worker blocked inside `doWork`
    /// never reaches that phase on its own, so a literal port would make
    /// `cancelAll` unable to reach the exact worker it exists to interrupt
    /// (the source itself marks this spot with a `TODO: cancellation in
    /// wti!`). This resolves that gap: any slot that still holds a thread
    /// (`is_live()`) is a candidate, since `cancel_all` is only ever called
    /// once the pool is already mid-shutdown.
    pub fn cancel_all(&self) {
        self.process_thread_changes();
        for slot in &self.inner.slots {
            if slot.get_state().is_live() {
                wdebug!(&self.inner.debug_tag, "cancelling worker slot {}", slot.index);
                slot.cancel();
            }
        }
        self.process_thread_changes();
    }

    /// Harvest any `Terminated` slots: join their thread and reset to `Stopped`.
    pub fn process_thread_changes(&self) {
        let dirty = {
            let mut guard = self.inner.mutex.lock().unwrap();
            let was_dirty = guard.any_thread_state_changed;
            guard.any_thread_state_changed = false;
            was_dirty
        };
        if !dirty {
            return;
        }
        for slot in &self.inner.slots {
            slot.process_thread_changes();
        }
    }

    /// Wake at least one parked worker
    pub fn wakeup_one(&self) {
        self.inner.producer.wakeup_one();
    }

    /// Wake every parked worker
    pub fn wakeup_all(&self) {
        self.inner.producer.wakeup_all();
    }

    /// Pool-level stop check: the pool's own shutdown state takes priority
    /// over the producer's opinion. Called with the pool mutex held while
    /// consulting `is_idle`, per the documented single exception to "never
    /// hold the pool mutex while calling into the producer".
    fn chk_stop_worker(&self) -> StopSignal {
        {
            let guard = self.inner.mutex.lock().unwrap();
            match guard.state {
                PoolState::ShutdownImmediate => return StopSignal::TerminateNow,
                PoolState::Shutdown => {
                    if self.inner.producer.is_idle() {
                        return StopSignal::TerminateNow;
                    }
                }
                PoolState::Running => {}
            }
        }
        self.inner.producer.chk_stop_worker()
    }

    /// Consume the inactivity guard exactly once: if this is the sole
    /// remaining worker and the guard is still armed, grant one more loop
    /// iteration instead of exiting.
    fn consume_inactivity_guard_if_sole_worker(&self) -> bool {
        let mut guard = self.inner.mutex.lock().unwrap();
        if guard.cur_running == 1 && guard.inactivity_guard {
            guard.inactivity_guard = false;
            true
        } else {
            false
        }
    }

    fn mark_thread_state_changed(&self) {
        self.inner.mutex.lock().unwrap().any_thread_state_changed = true;
    }
}

/// OS thread entry point for every worker.
fn worker_shell(inner: Arc<PoolInner>, slot_idx: usize) {
    let pool = Pool { inner: Arc::clone(&inner) };
    let slot = &inner.slots[slot_idx];

    slot.mark_run_init();
    slot.mark_running();
    wdebug!(&slot.debug_tag, "worker thread running");

    // RAII termination guard: the structured-concurrency replacement for a
    // registered cancellation cleanup handler. Fires on every exit path -
    // normal return or unwind - decrementing cur_running and signalling
    // term_cond exactly once.
    struct TerminationGuard {
        inner: Arc<PoolInner>,
        tag: String,
    }
    impl Drop for TerminationGuard {
        fn drop(&mut self) {
            let mut guard = self.inner.mutex.lock().unwrap();
            guard.cur_running -= 1;
            wdebug!(&self.tag, "worker terminated, {} workers now running", guard.cur_running);
            drop(guard);
            self.inner.term_cond.notify_all();
        }
    }
    let _term_guard = TerminationGuard {
        inner: Arc::clone(&inner),
        tag: slot.debug_tag.clone(),
    };

    worker_loop(&pool, slot_idx);
}

/// The WTI worker loop: startup hook, work loop, shutdown hook, final
/// state transition. Runs outside the pool mutex except for the brief
/// internal locks taken by `chk_stop_worker` and the inactivity-guard check.
fn worker_loop(pool: &Pool, slot_idx: usize) {
    let inner = &pool.inner;
    let slot = &inner.slots[slot_idx];
    let token = slot.cancel_token();
    let idle_timeout = inner.shutdown_timeout;

    inner.producer.on_worker_startup();

    let mut scratch: Option<Scratch> = None;

    loop {
        if token.is_cancelled() {
            wdebug!(&slot.debug_tag, "observed cancellation, compensating");
            inner.producer.on_worker_cancel(&mut scratch);
            break;
        }

        match pool.chk_stop_worker() {
            StopSignal::TerminateNow => {
                if pool.consume_inactivity_guard_if_sole_worker() {
                    wtp_core::wtrace!(&slot.debug_tag, "inactivity guard grants one more iteration");
                    continue;
                }
                break;
            }
            StopSignal::Continue => {}
        }

        if inner.producer.is_idle() {
            let deadline = Instant::now() + idle_timeout;
            match inner.producer.on_idle(deadline) {
                IdleOutcome::WorkArrived => continue,
                IdleOutcome::TimedOut => {
                    if pool.consume_inactivity_guard_if_sole_worker() {
                        continue;
                    }
                    break;
                }
            }
        }

        match inner.producer.do_work(&token, &mut scratch) {
            Ok(()) => {}
            Err(WtpError::Cancelled) => {
                wdebug!(&slot.debug_tag, "do_work observed cancellation, compensating");
                inner.producer.on_worker_cancel(&mut scratch);
                break;
            }
            Err(e) => {
                // do_work errors are the producer's own responsibility; the
                // loop keeps going unless the error IS a cancellation.
                wwarn!(&slot.debug_tag, "do_work returned {}", e);
            }
        }
    }

    inner.producer.on_worker_shutdown();
    slot.mark_terminating();
    slot.mark_terminated();
    pool.mark_thread_state_changed();
}
