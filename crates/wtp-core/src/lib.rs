//! # wtp-core
//!
//! Core types and traits for the worker thread pool (WTP) engine.
//!
//! This crate is runtime-agnostic: it defines the state machines, error
//! taxonomy, cooperative cancellation primitive and the `Producer` callback
//! interface. The actual OS-thread pool that drives them lives in
//! `wtp-runtime`.
//!
//! ## Modules
//!
//! - `error` - error types and `WtpResult`
//! - `state` - pool and worker lifecycle state machines
//! - `cancel` - cooperative cancellation token
//! - `vtable` - the `Producer` callback interface
//! - `diag` - leveled diagnostic printing, tagged with the pool/worker debug header

#![allow(dead_code)]

pub mod cancel;
pub mod diag;
pub mod error;
pub mod state;
pub mod vtable;

pub use cancel::CancelToken;
pub use error::{WtpError, WtpResult};
pub use state::{PoolState, WorkerCmd};
pub use vtable::{IdleOutcome, NullProducer, Producer, Scratch, StopSignal};
