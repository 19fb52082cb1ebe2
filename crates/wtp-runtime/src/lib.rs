//! # wtp-runtime
//!
//! The OS-thread worker pool (WTP) and worker slot (WTI) that drive a
//! pluggable [`wtp_core::Producer`].
//!
//! ## Modules
//!
//! - `slot` - a single worker slot: command-state, thread handle, cancel token
//! - `pool` - the pool itself: slot table, lifecycle state, shutdown/cancel API

#![allow(dead_code)]

pub mod pool;
pub mod slot;

pub use pool::{Pool, PoolBuilder};
pub use slot::WorkerSlot;

pub use wtp_core::{
    CancelToken, IdleOutcome, NullProducer, PoolState, Producer, Scratch, StopSignal, WorkerCmd,
    WtpError, WtpResult,
};
