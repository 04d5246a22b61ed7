//! Critical-section hooks
//!
//! A [`LockHook`] is called by the transfer protocols at two points while locks
//! are held: right after the first lock, and once both locks are held but
//! before any balance changes. Hooks widen the contention window (the driver's
//! hold delay), inject faults, or observe which lock was taken first.
//!
//! A hook that returns an error aborts the transfer. No balance has changed at
//! either call site, and every held lock is released before the error reaches
//! the caller.

use crate::types::{AccountId, TransferError, TransferRequest};
use std::fmt;
use std::thread;
use std::time::Duration;

/// Callbacks invoked inside a transfer's critical section
pub trait LockHook: Send + Sync {
    /// Called while holding only the first lock; `first` is its account id
    fn after_first_lock(
        &self,
        _request: &TransferRequest,
        _first: AccountId,
    ) -> Result<(), TransferError> {
        Ok(())
    }

    /// Called while holding both locks, before the debit and credit
    fn before_mutation(&self, _request: &TransferRequest) -> Result<(), TransferError> {
        Ok(())
    }
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl LockHook for NoopHook {}

/// Sleeps between the first and second acquisition
///
/// Holding the first lock for a while makes interleavings where two transfers
/// each hold one lock far more likely.
#[derive(Clone, Copy)]
pub struct DelayHook {
    delay: Duration,
}

impl DelayHook {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl fmt::Debug for DelayHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DelayHook({:?})", self.delay)
    }
}

impl LockHook for DelayHook {
    fn after_first_lock(
        &self,
        request: &TransferRequest,
        first: AccountId,
    ) -> Result<(), TransferError> {
        tracing::trace!(%request, first, delay_ms = self.delay.as_millis() as u64, "holding first lock");
        thread::sleep(self.delay);
        Ok(())
    }
}
