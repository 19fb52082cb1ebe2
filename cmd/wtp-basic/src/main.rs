//! Basic WTP example
//!
//! Wires a toy counting-queue producer to the pool, enqueues some work, and
//! watches the fleet grow, drain, and shut down cleanly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use wtp::{CancelToken, IdleOutcome, Pool, PoolState, Producer, Scratch, WtpResult};

/// A producer that hands out `pending` unit-work items and counts how many
/// were actually completed.
struct CountingQueue {
    pending: Mutex<usize>,
    busy: Condvar,
    completed: AtomicUsize,
}

impl CountingQueue {
    fn new(initial: usize) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(initial),
            busy: Condvar::new(),
            completed: AtomicUsize::new(0),
        })
    }
}

impl Producer for CountingQueue {
    fn is_idle(&self) -> bool {
        *self.pending.lock().unwrap() == 0
    }

    fn do_work(&self, _token: &CancelToken, _scratch: &mut Option<Scratch>) -> WtpResult<()> {
        let mut pending = self.pending.lock().unwrap();
        if *pending == 0 {
            return Ok(());
        }
        *pending -= 1;
        drop(pending);
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        println!("[wtp-basic] completed item #{}", done);
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
        let (guard, timeout) = self.busy.wait_timeout(guard, deadline - now).unwrap();
        if timeout.timed_out() && *guard == 0 {
            IdleOutcome::TimedOut
        } else {
            IdleOutcome::WorkArrived
        }
    }

    fn on_worker_startup(&self) {
        println!("[wtp-basic] worker starting up");
    }

    fn on_worker_shutdown(&self) {
        println!("[wtp-basic] worker shutting down");
    }

    fn wakeup_one(&self) {
        self.busy.notify_one();
    }

    fn wakeup_all(&self) {
        self.busy.notify_all();
    }
}

fn main() {
    wtp::diag::set_log_level(wtp::diag::LogLevel::Info);

    println!("=== WTP Basic Example ===\n");

    let queue = CountingQueue::new(20);
    let pool = Pool::builder()
        .max_workers(4)
        .shutdown_timeout(Duration::from_millis(500))
        .producer(queue.clone())
        .debug_tag("wtp-basic")
        .finalize()
        .expect("pool config is valid");

    println!("Advising 4 workers for 20 queued items...");
    pool.advise_max_workers(4).unwrap();

    // Trickle in a few more items while the fleet is already running.
    std::thread::sleep(Duration::from_millis(20));
    *queue.pending.lock().unwrap() += 5;
    queue.busy.notify_all();

    match pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)) {
        Ok(()) => println!(
            "\nShutdown complete: {} items processed, {} workers remaining",
            queue.completed.load(Ordering::SeqCst),
            pool.cur_running()
        ),
        Err(e) => {
            println!("\nShutdown timed out ({}), cancelling stragglers", e);
            pool.cancel_all();
        }
    }
}
