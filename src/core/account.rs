//! Lockable account
//!
//! A `LockableAccount` pairs an immutable identifier with a balance that lives
//! inside its own mutex. The balance is only reachable through an
//! [`AccountGuard`], so "the balance is only touched by the lock holder" holds
//! by construction rather than by convention.
//!
//! The mutex is `parking_lot::Mutex`:
//! - unlocks are eventually fair, so a waiting thread cannot starve forever
//! - it supports timed acquisition for the bounded-wait variant
//! - it does not poison, so a panicking worker releases the account cleanly

use crate::types::{AccountId, TransferError};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use std::fmt;
use std::time::Duration;

/// An account with an ordering key, a balance and one exclusive lock
pub struct LockableAccount {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl LockableAccount {
    /// Create an account with a fixed id and initial balance
    pub fn new(id: AccountId, initial_balance: Decimal) -> Self {
        LockableAccount {
            id,
            balance: Mutex::new(initial_balance),
        }
    }

    /// The account's ordering key
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Block until the account lock is held
    ///
    /// There is no timeout; if another thread never releases the lock this
    /// call never returns.
    pub fn acquire(&self) -> AccountGuard<'_> {
        AccountGuard {
            id: self.id,
            balance: self.balance.lock(),
        }
    }

    /// Wait at most `timeout` for the account lock
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the lock is still held by someone else when the
    /// wait expires.
    pub fn try_acquire_for(&self, timeout: Duration) -> Result<AccountGuard<'_>, TransferError> {
        self.balance
            .try_lock_for(timeout)
            .map(|balance| AccountGuard {
                id: self.id,
                balance,
            })
            .ok_or_else(|| {
                let waited_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                TransferError::lock_timeout(self.id, waited_ms)
            })
    }

    /// Acquire with an optional bound: `None` blocks, `Some` waits at most that long
    pub fn acquire_within(
        &self,
        timeout: Option<Duration>,
    ) -> Result<AccountGuard<'_>, TransferError> {
        match timeout {
            Some(timeout) => self.try_acquire_for(timeout),
            None => Ok(self.acquire()),
        }
    }

    /// Read the balance, briefly taking the lock
    pub fn balance(&self) -> Decimal {
        *self.balance.lock()
    }

    /// Whether some thread currently holds the lock
    ///
    /// Only meaningful as a diagnostic; the answer can change immediately.
    pub fn is_locked(&self) -> bool {
        self.balance.is_locked()
    }
}

impl fmt::Debug for LockableAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockableAccount")
            .field("id", &self.id)
            .field("locked", &self.is_locked())
            .finish()
    }
}

/// Exclusive access to one account's balance
///
/// Dropping the guard releases the lock, so every exit path of the scope that
/// acquired it (normal return, `?`, panic) releases it.
pub struct AccountGuard<'a> {
    id: AccountId,
    balance: MutexGuard<'a, Decimal>,
}

impl AccountGuard<'_> {
    /// Id of the locked account
    pub fn id(&self) -> AccountId {
        self.id
    }

    /// Current balance
    pub fn balance(&self) -> Decimal {
        *self.balance
    }

    /// Subtract `amount` from the balance
    ///
    /// No funds check: the balance may go negative. Overdraft policy belongs to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the result is not representable; the
    /// balance is left unchanged.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        *self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| TransferError::arithmetic_overflow("debit", self.id))?;
        Ok(())
    }

    /// Add `amount` to the balance
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the result is not representable; the
    /// balance is left unchanged.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), TransferError> {
        *self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::arithmetic_overflow("credit", self.id))?;
        Ok(())
    }

    /// Overwrite the balance; used to undo a debit whose matching credit failed
    pub(crate) fn restore(&mut self, balance: Decimal) {
        *self.balance = balance;
    }

    /// Release the lock
    pub fn release(self) {
        tracing::trace!(account = self.id, "lock released");
    }
}

impl fmt::Debug for AccountGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountGuard")
            .field("id", &self.id)
            .field("balance", &*self.balance)
            .finish()
    }
}
