//! Ordered transfer coordinator
//!
//! This module provides the `TransferCoordinator`, which moves funds between two
//! accounts while any number of other threads do the same over the same
//! account set.
//!
//! # Lock Ordering
//!
//! A transfer needs both account locks. They are always acquired lower id
//! first, whichever account is being debited:
//!
//! ```text
//! transfer(2 -> 1)        transfer(1 -> 2)
//!   lock 1                  lock 1      <- waits, holds nothing
//!   lock 2
//!   debit 2, credit 1
//!   unlock 2, unlock 1
//!                           lock 2
//!                           ...
//! ```
//!
//! With every thread following one total order, no thread can hold a higher
//! ranked lock while waiting on a lower ranked one, so the wait-for graph has
//! no cycle and no deadlock is possible. Transfers over disjoint pairs never
//! contend and are not serialized against each other.
//!
//! # Failure
//!
//! Guards are locals of the critical-section function. Whatever goes wrong in
//! there (a lock timeout, an aborted hook, an overdraft, an overflow) the
//! guards are dropped before the error reaches [`TransferCoordinator::transfer`].

use crate::core::account::{AccountGuard, LockableAccount};
use crate::core::hooks::{LockHook, NoopHook};
use crate::core::registry::AccountRegistry;
use crate::core::traits::TransferProtocol;
use crate::types::{
    AccountId, TransferError, TransferOutcome, TransferReceipt, TransferRequest, TransferState,
    TransferTrace,
};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a transfer from an account to itself is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelfTransferPolicy {
    /// Fail with `SelfTransfer` without taking any lock
    #[default]
    Reject,
    /// Take the account lock once, change nothing, succeed
    NoOp,
}

/// Coordinator settings
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Bound on each lock wait; `None` waits forever
    pub lock_timeout: Option<Duration>,

    /// Whether a debit may take a balance below zero
    pub allow_overdraft: bool,

    /// Handling of `from == to`
    pub self_transfer: SelfTransferPolicy,
}

/// Order two accounts by id: `(first, second)` with `first.id() <= second.id()`
pub fn lock_order<'a>(
    a: &'a LockableAccount,
    b: &'a LockableAccount,
) -> (&'a LockableAccount, &'a LockableAccount) {
    if a.id() <= b.id() {
        (a, b)
    } else {
        (b, a)
    }
}

/// Debit `from` and credit `to`, both already locked
///
/// Either both balances change or neither does.
pub(crate) fn move_funds(
    from: &mut AccountGuard<'_>,
    to: &mut AccountGuard<'_>,
    amount: Decimal,
    allow_overdraft: bool,
) -> Result<(), TransferError> {
    let before = from.balance();
    if !allow_overdraft && before < amount {
        return Err(TransferError::insufficient_funds(from.id(), before, amount));
    }

    from.debit(amount)?;
    if let Err(err) = to.credit(amount) {
        from.restore(before);
        return Err(err);
    }

    Ok(())
}

/// Close out a trace once every lock has been dropped
pub(crate) fn finish_transfer(
    protocol: &'static str,
    request: TransferRequest,
    mut trace: TransferTrace,
    result: Result<[AccountId; 2], TransferError>,
) -> TransferOutcome {
    if trace.current().holds_locks() {
        trace.advance(TransferState::Released);
    }

    match result {
        Ok(lock_order) => {
            trace.advance(TransferState::Done);
            tracing::debug!(protocol, %request, ?lock_order, "transfer done");
            Ok(TransferReceipt {
                request,
                lock_order,
                trace: trace.into_states(),
            })
        }
        Err(err) => {
            trace.advance(TransferState::Failed);
            tracing::warn!(protocol, %request, error = %err, "transfer failed");
            Err(err)
        }
    }
}

/// Deadlock-free transfers over a shared account registry
pub struct TransferCoordinator {
    registry: Arc<AccountRegistry>,
    config: CoordinatorConfig,
    hook: Arc<dyn LockHook>,
}

impl TransferCoordinator {
    /// Create a coordinator with default settings: unbounded lock waits,
    /// overdrafts rejected, self-transfers rejected
    pub fn new(registry: Arc<AccountRegistry>) -> Self {
        TransferCoordinator {
            registry,
            config: CoordinatorConfig::default(),
            hook: Arc::new(NoopHook),
        }
    }

    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn LockHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn registry(&self) -> &Arc<AccountRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Move `amount` from account `from` to account `to`
    ///
    /// # Errors
    ///
    /// - `AccountNotFound` if either id is unknown
    /// - `InvalidAmount` if `amount` is not positive
    /// - `SelfTransfer` if `from == to` under the `Reject` policy
    /// - `InsufficientFunds` if the debit would overdraw `from` and overdrafts are off
    /// - `LockTimeout` if a bounded lock wait expired
    /// - `Aborted` if a hook aborted the critical section
    ///
    /// No balance changes on any error.
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

    /// Move `amount` between two account handles
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

    /// Acquire, mutate, release; returns the ids in lock order
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
            return self.self_transfer(from, trace);
        }

        let (first, second) = lock_order(from, to);

        let mut first_guard = first.acquire_within(self.config.lock_timeout)?;
        trace.advance(TransferState::LockedFirst);
        self.hook.after_first_lock(request, first.id())?;

        let mut second_guard = second.acquire_within(self.config.lock_timeout)?;
        trace.advance(TransferState::LockedBoth);
        self.hook.before_mutation(request)?;

        let (from_guard, to_guard) = if first.id() == from.id() {
            (&mut first_guard, &mut second_guard)
        } else {
            (&mut second_guard, &mut first_guard)
        };
        move_funds(from_guard, to_guard, request.amount, self.config.allow_overdraft)?;
        trace.advance(TransferState::Mutated);

        second_guard.release();
        first_guard.release();

        Ok([first.id(), second.id()])
    }

    fn self_transfer(
        &self,
        account: &LockableAccount,
        trace: &mut TransferTrace,
    ) -> Result<[AccountId; 2], TransferError> {
        match self.config.self_transfer {
            SelfTransferPolicy::Reject => Err(TransferError::self_transfer(account.id())),
            SelfTransferPolicy::NoOp => {
                // the lock is not re-entrant: take it exactly once
                let guard = account.acquire_within(self.config.lock_timeout)?;
                trace.advance(TransferState::LockedFirst);
                guard.release();
                Ok([account.id(), account.id()])
            }
        }
    }

    /// Credit a single account; returns the new balance
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `InvalidAmount`, `LockTimeout` or `ArithmeticOverflow`.
    pub fn deposit(&self, id: AccountId, amount: Decimal) -> Result<Decimal, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(amount));
        }
        let account = self.registry.get(id)?;
        let mut guard = account.acquire_within(self.config.lock_timeout)?;
        guard.credit(amount)?;
        Ok(guard.balance())
    }

    /// Debit a single account under the overdraft policy; returns the new balance
    ///
    /// The funds check and the debit happen under one lock hold, so concurrent
    /// withdrawals can never jointly overdraw the account.
    ///
    /// # Errors
    ///
    /// `AccountNotFound`, `InvalidAmount`, `InsufficientFunds`, `LockTimeout`
    /// or `ArithmeticOverflow`.
    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<Decimal, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::invalid_amount(amount));
        }
        let account = self.registry.get(id)?;
        let mut guard = account.acquire_within(self.config.lock_timeout)?;
        if !self.config.allow_overdraft && guard.balance() < amount {
            return Err(TransferError::insufficient_funds(id, guard.balance(), amount));
        }
        guard.debit(amount)?;
        Ok(guard.balance())
    }
}

impl TransferProtocol for TransferCoordinator {
    fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> TransferOutcome {
        TransferCoordinator::transfer(self, from, to, amount)
    }

    fn name(&self) -> &'static str {
        "ordered"
    }
}

impl fmt::Debug for TransferCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferCoordinator")
            .field("accounts", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
