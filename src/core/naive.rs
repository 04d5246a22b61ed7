//! Argument-order transfer (deadlock-prone)
//!
//! `NaiveTransfer` locks `from` and then `to`, in whatever order the caller
//! passed them. Two concurrent transfers in opposite directions over the same
//! pair can each take their first lock and then wait forever for the other's:
//!
//! ```text
//! thread A: transfer(1 -> 2)      thread B: transfer(2 -> 1)
//!   lock 1                          lock 2
//!   lock 2  <- waits on B           lock 1  <- waits on A
//! ```
//!
//! This protocol exists to demonstrate that failure and to compare against
//! [`crate::core::TransferCoordinator`]. It is never used unless explicitly
//! selected. With a lock timeout configured the deadlock surfaces as
//! `LockTimeout` errors instead of a hang.

use crate::core::account::LockableAccount;
use crate::core::coordinator::{finish_transfer, move_funds};
use crate::core::hooks::{LockHook, NoopHook};
use crate::core::registry::AccountRegistry;
use crate::core::traits::TransferProtocol;
use crate::types::{
    AccountId, TransferError, TransferOutcome, TransferRequest, TransferState, TransferTrace,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Transfers that lock in call-site argument order
pub struct NaiveTransfer {
    registry: Arc<AccountRegistry>,
    lock_timeout: Option<Duration>,
    allow_overdraft: bool,
    hook: Arc<dyn LockHook>,
}

impl NaiveTransfer {
    pub fn new(registry: Arc<AccountRegistry>) -> Self {
        NaiveTransfer {
            registry,
            lock_timeout: None,
            allow_overdraft: false,
            hook: Arc::new(NoopHook),
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_overdraft(mut self, allow_overdraft: bool) -> Self {
        self.allow_overdraft = allow_overdraft;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn LockHook>) -> Self {
        self.hook = hook;
        self
    }

    /// Move `amount` from `from` to `to`, locking `from` first
    ///
    /// Self-transfers are always rejected: the lock is not re-entrant, so
    /// locking the same account twice would block the calling thread forever.
    pub fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> TransferOutcome {
        let accounts = self
            .registry
            .get(from)
            .and_then(|from_account| Ok((from_account, self.registry.get(to)?)));

        match accounts {
            Ok((from_account, to_account)) => {
                self.transfer_accounts(&from_account, &to_account, amount)
            }
            Err(err) => finish_transfer(
                self.name(),
                TransferRequest::new(from, to, amount),
                TransferTrace::new(),
                Err(err),
            ),
        }
    }

    pub fn transfer_accounts(
        &self,
        from: &LockableAccount,
        to: &LockableAccount,
        amount: Decimal,
    ) -> TransferOutcome {
        let request = TransferRequest::new(from.id(), to.id(), amount);
        let mut trace = TransferTrace::new();
        let result = self.run_critical_section(&request, from, to, &mut trace);
        finish_transfer(self.name(), request, trace, result)
    }

    fn run_critical_section(
        &self,
        request: &TransferRequest,
        from: &LockableAccount,
        to: &LockableAccount,
        trace: &mut TransferTrace,
    ) -> Result<[AccountId; 2], TransferError> {
        if request.amount <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(request.amount));
        }
        if from.id() == to.id() {
            return Err(TransferError::self_transfer(from.id()));
        }

        let mut from_guard = from.acquire_within(self.lock_timeout)?;
        trace.advance(TransferState::LockedFirst);
        self.hook.after_first_lock(request, from.id())?;

        let mut to_guard = to.acquire_within(self.lock_timeout)?;
        trace.advance(TransferState::LockedBoth);
        self.hook.before_mutation(request)?;

        move_funds(
            &mut from_guard,
            &mut to_guard,
            request.amount,
            self.allow_overdraft,
        )?;
        trace.advance(TransferState::Mutated);

        to_guard.release();
        from_guard.release();

        Ok([from.id(), to.id()])
    }
}

impl TransferProtocol for NaiveTransfer {
    fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> TransferOutcome {
        NaiveTransfer::transfer(self, from, to, amount)
    }

    fn name(&self) -> &'static str {
        "naive"
    }
}
