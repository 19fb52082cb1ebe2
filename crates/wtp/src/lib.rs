//! # wtp - Worker Thread Pool
//!
//! The core concurrency engine of a syslog-style message daemon: a bounded
//! pool of OS worker threads that a producer (typically a queue) drives via
//! a small callback interface.
//!
//! This crate is a thin facade over [`wtp_core`] (the state machines, error
//! taxonomy and `Producer` trait) and [`wtp_runtime`] (the actual OS-thread
//! pool). Most applications only need this crate.
//!
//! ## Quick Start
//!
//! ```no_run
//! use wtp::{Pool, Producer, IdleOutcome, PoolState};
//! use std::sync::{Arc, Condvar, Mutex};
//! use std::time::{Duration, Instant};
//!
//! struct CountingQueue {
//!     pending: Mutex<usize>,
//!     busy: Condvar,
//! }
//!
//! impl Producer for CountingQueue {
//!     fn is_idle(&self) -> bool {
//!         *self.pending.lock().unwrap() == 0
//!     }
//!
//!     fn do_work(&self, _token: &wtp::CancelToken, _scratch: &mut Option<wtp::Scratch>) -> wtp::WtpResult<()> {
//!         let mut pending = self.pending.lock().unwrap();
//!         if *pending > 0 {
//!             *pending -= 1;
//!         }
//!         Ok(())
//!     }
//!
//!     fn on_idle(&self, deadline: Instant) -> IdleOutcome {
//!         let guard = self.pending.lock().unwrap();
//!         if *guard > 0 {
//!             return IdleOutcome::WorkArrived;
//!         }
//!         let now = Instant::now();
//!         if now >= deadline {
//!             return IdleOutcome::TimedOut;
//!         }
//!         let (_guard, timeout) = self.busy.wait_timeout(guard, deadline - now).unwrap();
//!         if timeout.timed_out() { IdleOutcome::TimedOut } else { IdleOutcome::WorkArrived }
//!     }
//!
//!     fn wakeup_one(&self) { self.busy.notify_one(); }
//!     fn wakeup_all(&self) { self.busy.notify_all(); }
//! }
//!
//! let producer = Arc::new(CountingQueue { pending: Mutex::new(0), busy: Condvar::new() });
//! let pool = Pool::builder()
//!     .max_workers(4)
//!     .producer(producer)
//!     .debug_tag("demo")
//!     .finalize()
//!     .unwrap();
//!
//! pool.advise_max_workers(4).unwrap();
//! pool.shutdown_all(PoolState::Shutdown, Duration::from_secs(5)).unwrap();
//! ```

#![allow(dead_code)]

pub use wtp_core::diag;
pub use wtp_core::{
    CancelToken, IdleOutcome, NullProducer, PoolState, Producer, Scratch, StopSignal, WorkerCmd,
    WtpError, WtpResult,
};
pub use wtp_runtime::{Pool, PoolBuilder, WorkerSlot};
