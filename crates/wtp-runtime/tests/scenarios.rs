//! End-to-end scenarios for the worker thread pool, run against a real
//! counting-queue producer and real OS threads (no mocked time, no mocked
//! scheduling). Mirrors the six concrete scenarios used to validate the
//! pool's liveness and shutdown-correctness guarantees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use wtp_core::{CancelToken, IdleOutcome, PoolState, Producer, Scratch, WtpError, WtpResult};
use wtp_runtime::Pool;

/// `is_idle ≡ (pending == 0)`, exactly as specified.
struct CountingQueue {
    pending: Mutex<usize>,
    busy: Condvar,
    completed: AtomicUsize,
    cancels: AtomicUsize,
    /// When set, `do_work` blocks for this long before completing, giving
    /// scenario 3 something to cancel mid-flight.
    work_delay: Mutex<Duration>,
}

impl CountingQueue {
    fn new(initial: usize) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(initial),
            busy: Condvar::new(),
            completed: AtomicUsize::new(0),
            cancels: AtomicUsize::new(0),
            work_delay: Mutex::new(Duration::ZERO),
        })
    }

    fn push(&self, n: usize) {
        *self.pending.lock().unwrap() += n;
        self.busy.notify_all();
    }

    fn set_work_delay(&self, d: Duration) {
        *self.work_delay.lock().unwrap() = d;
    }
}

impl Producer for CountingQueue {
    fn is_idle(&self) -> bool {
        *self.pending.lock().unwrap() == 0
    }

    fn do_work(&self, token: &CancelToken, _scratch: &mut Option<Scratch>) -> WtpResult<()> {
        let mut pending = self.pending.lock().unwrap();
        if *pending == 0 {
            return Ok(());
        }
        *pending -= 1;
        drop(pending);

        let delay = *self.work_delay.lock().unwrap();
        let deadline = Instant::now() + delay;
        while Instant::now() < deadline {
            token.check()?;
            std::thread::sleep(Duration::from_millis(5));
        }

        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_idle(&self, deadline: Instant) -> IdleOutcome {
        let guard = self.pending.lock().unwrap();
        if *guard > 0 {
            return IdleOutcome::WorkArrived;
        }
        let now = Instant::now();
        if now >= deadline {
            return IdleOutcome::TimedOut;
        }
        let (guard, timeout_result) = self.busy.wait_timeout(guard, deadline - now).unwrap();
        if timeout_result.timed_out() && *guard == 0 {
            IdleOutcome::TimedOut
        } else {
            IdleOutcome::WorkArrived
        }
    }

    fn on_worker_cancel(&self, _scratch: &mut Option<Scratch>) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn wakeup_one(&self) {
        self.busy.notify_one();
    }

    fn wakeup_all(&self) {
        self.busy.notify_all();
    }
}

/// Scenario 1: maxWorkers=4, 100 unit-work items, advise(4), graceful
/// shutdown ⇒ OK, exactly 100 do_work calls, curRunning==0.
#[test]
fn scenario_1_drains_100_items_with_4_workers() {
    let queue = CountingQueue::new(100);
    let pool = Pool::builder()
        .max_workers(4)
        .producer(queue.clone())
        .debug_tag("scenario1")
        .finalize()
        .unwrap();

    pool.advise_max_workers(4).unwrap();
    let result = pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5));

    assert_eq!(result, Ok(()));
    assert_eq!(queue.completed.load(Ordering::SeqCst), 100);
    assert_eq!(pool.cur_running(), 0);
}

/// Scenario 2: maxWorkers=2, no work, advise(2), wait 200ms, shutdown ⇒ both
/// workers idle-timeout or shutdown-exit; no do_work observed.
#[test]
fn scenario_2_idle_workers_never_do_work() {
    let queue = CountingQueue::new(0);
    let pool = Pool::builder()
        .max_workers(2)
        .producer(queue.clone())
        .debug_tag("scenario2")
        .shutdown_timeout(Duration::from_millis(50))
        .finalize()
        .unwrap();

    pool.advise_max_workers(2).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    let result = pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(1));

    assert_eq!(result, Ok(()));
    assert_eq!(queue.completed.load(Ordering::SeqCst), 0);
    assert_eq!(pool.cur_running(), 0);
}

/// Scenario 3: maxWorkers=1, a work item that blocks 2s,
/// shutdown_immediate(100ms) ⇒ TimedOut; cancel_all then drains with
/// on_worker_cancel observed once.
#[test]
fn scenario_3_immediate_shutdown_times_out_then_cancel_drains() {
    let queue = CountingQueue::new(1);
    queue.set_work_delay(Duration::from_secs(2));
    let pool = Pool::builder()
        .max_workers(1)
        .producer(queue.clone())
        .debug_tag("scenario3")
        .finalize()
        .unwrap();

    pool.advise_max_workers(1).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    let result = pool.shutdown_all(PoolState::ShutdownImmediate, Duration::from_millis(100));
    assert_eq!(result, Err(WtpError::TimedOut));

    pool.cancel_all();

    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.cur_running() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(pool.cur_running(), 0);
    assert_eq!(queue.cancels.load(Ordering::SeqCst), 1);
}

/// Scenario 4: maxWorkers=8, advise(20) ⇒ starts exactly 8, clamped, no
/// NoMoreThreads surfaced.
#[test]
fn scenario_4_advise_clamps_to_max_workers() {
    let queue = CountingQueue::new(0);
    let pool = Pool::builder()
        .max_workers(8)
        .producer(queue.clone())
        .debug_tag("scenario4")
        .finalize()
        .unwrap();

    let result = pool.advise_max_workers(20);
    assert_eq!(result, Ok(()));
    assert_eq!(pool.cur_running(), 8);

    pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
}

/// Scenario 5: maxWorkers=3, 1 queued item, advise(3) called three times
/// concurrently ⇒ total do_work invocations equals 1; curRunning never
/// exceeds 3.
#[test]
fn scenario_5_concurrent_advise_never_double_processes() {
    let queue = CountingQueue::new(1);
    let pool = Pool::builder()
        .max_workers(3)
        .producer(queue.clone())
        .debug_tag("scenario5")
        .finalize()
        .unwrap();

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let pool = pool.clone();
            std::thread::spawn(move || {
                let _ = pool.advise_max_workers(3);
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(pool.cur_running() <= 3);
    pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
    assert_eq!(queue.completed.load(Ordering::SeqCst), 1);
}

/// Scenario 6: maxWorkers=2, one worker is cancelled mid-flight (simulated
/// crash), a second item is enqueued ⇒ it is eventually processed and
/// on_worker_cancel fires for the cancelled worker's payload.
#[test]
fn scenario_6_cancelled_worker_compensates_and_pool_recovers() {
    let queue = CountingQueue::new(1);
    queue.set_work_delay(Duration::from_millis(500));
    let pool = Pool::builder()
        .max_workers(2)
        .producer(queue.clone())
        .debug_tag("scenario6")
        .finalize()
        .unwrap();

    pool.advise_max_workers(1).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    pool.cancel_all();

    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.cur_running() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(queue.cancels.load(Ordering::SeqCst), 1);

    queue.set_work_delay(Duration::ZERO);
    queue.push(1);
    pool.advise_max_workers(1).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while queue.completed.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
    assert_eq!(queue.completed.load(Ordering::SeqCst), 1);
}

/// P5 (join idempotence): repeated process_thread_changes calls across a
/// full spawn/shutdown cycle never double-join.
#[test]
fn process_thread_changes_is_idempotent_across_a_full_cycle() {
    let pool = Pool::builder()
        .max_workers(2)
        .producer(CountingQueue::new(5))
        .debug_tag("idempotence")
        .finalize()
        .unwrap();

    pool.process_thread_changes();
    pool.process_thread_changes();
    pool.advise_max_workers(2).unwrap();
    pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
    pool.process_thread_changes();
    pool.process_thread_changes();
    assert_eq!(pool.cur_running(), 0);
}

/// P2 (no lost wakeup) for the sole-worker case: a lone worker spawned
/// against an already-idle producer still observes work that arrives a
/// few milliseconds later, instead of idle-timing-out and leaving the item
/// stranded with no worker left to pick it up.
#[test]
fn sole_worker_observes_late_arriving_work_before_idle_timeout() {
    let queue = CountingQueue::new(0);
    let pool = Pool::builder()
        .max_workers(1)
        .producer(queue.clone())
        .debug_tag("guard")
        .shutdown_timeout(Duration::from_millis(300))
        .finalize()
        .unwrap();

    pool.advise_max_workers(1).unwrap();
    // Give the worker a moment to at least reach its first is_idle check.
    std::thread::sleep(Duration::from_millis(20));
    queue.push(1);

    let deadline = Instant::now() + Duration::from_secs(5);
    while queue.completed.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(queue.completed.load(Ordering::SeqCst), 1);
    pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
}
