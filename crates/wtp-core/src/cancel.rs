//! Cooperative cancellation token
//!
//! This is the structured-concurrency replacement for forced OS thread
//! cancellation: a worker's cancel token is checked at every suspension
//! point (inside `do_work`'s safepoints, and between loop iterations), and
//! on observing it set, the worker runs the producer's compensation hook
//! and winds down on its own.

use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{WtpError, WtpResult};

/// A single worker slot's cancellation flag
///
/// Cheap to clone: clones share the same underlying flag.
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, not-yet-cancelled token
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation was requested
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Check cancellation and return an error if set
    ///
    /// Intended for use at safepoints inside a producer's `do_work`:
    ///
    /// ```ignore
    /// fn do_work(&self, token: &CancelToken, scratch: &mut Option<Scratch>) -> WtpResult<()> {
    ///     for chunk in self.chunks() {
    ///         token.check()?;
    ///         process(chunk);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    #[inline]
    pub fn check(&self) -> WtpResult<()> {
        if self.is_cancelled() {
            Err(WtpError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Reset the token so the underlying slot can be reused by a future worker
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cancellation() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(WtpError::Cancelled));
    }

    #[test]
    fn test_clone_shares_state() {
        let a = CancelToken::new();
        let b = a.clone();
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn test_reset() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!token.is_cancelled());
    }
}
