//! Transfer-related types
//!
//! Defines the transfer request, the per-transfer state machine and the receipt
//! returned by a completed transfer.

use super::account::AccountId;
use super::error::TransferError;
use rust_decimal::Decimal;
use std::fmt;

/// A request to move `amount` from one account to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Account to debit
    pub from: AccountId,

    /// Account to credit
    pub to: AccountId,

    /// Amount to move, must be strictly positive
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(from: AccountId, to: AccountId, amount: Decimal) -> Self {
        TransferRequest { from, to, amount }
    }

    /// Whether the request names the same account on both sides
    pub fn is_self_transfer(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.amount)
    }
}

/// Lifecycle of a single transfer
///
/// ```text
/// Pending -> LockedFirst -> LockedBoth -> Mutated -> Released -> Done
///    |            |             |                       |
///    |            +-------------+------> Released ------+-> Failed
///    +-> Failed
/// ```
///
/// A transfer that fails while holding locks always passes through `Released`
/// before reaching `Failed`. `Pending -> Failed` covers requests rejected before
/// any lock was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Validated but no lock held yet
    Pending,

    /// The lower-ranked lock is held
    LockedFirst,

    /// Both locks are held
    LockedBoth,

    /// Balances have been updated, locks still held
    Mutated,

    /// Every lock taken by this transfer has been released
    Released,

    /// Terminal: transfer applied
    Done,

    /// Terminal: transfer rejected, no balance changed
    Failed,
}

impl TransferState {
    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: TransferState) -> bool {
        use TransferState::*;

        matches!(
            (self, next),
            (Pending, LockedFirst)
                | (Pending, Failed)
                | (LockedFirst, LockedBoth)
                | (LockedFirst, Released)
                | (LockedBoth, Mutated)
                | (LockedBoth, Released)
                | (Mutated, Released)
                | (Released, Done)
                | (Released, Failed)
        )
    }

    /// Whether the state holds at least one lock
    pub fn holds_locks(self) -> bool {
        matches!(
            self,
            TransferState::LockedFirst | TransferState::LockedBoth | TransferState::Mutated
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Done | TransferState::Failed)
    }
}

/// Ordered record of the states a transfer went through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTrace {
    states: Vec<TransferState>,
}

impl TransferTrace {
    /// Start a trace in `Pending`
    pub fn new() -> Self {
        TransferTrace {
            states: vec![TransferState::Pending],
        }
    }

    /// The most recent state
    pub fn current(&self) -> TransferState {
        // never empty: constructed with Pending
        self.states[self.states.len() - 1]
    }

    /// Move to `next`
    ///
    /// Illegal transitions are a bug in the caller and trip a debug assertion.
    pub fn advance(&mut self, next: TransferState) {
        debug_assert!(
            self.current().can_transition_to(next),
            "illegal transfer transition {:?} -> {:?}",
            self.current(),
            next
        );
        tracing::trace!(from = ?self.current(), to = ?next, "transfer state");
        self.states.push(next);
    }

    pub fn states(&self) -> &[TransferState] {
        &self.states
    }

    pub fn into_states(self) -> Vec<TransferState> {
        self.states
    }
}

impl Default for TransferTrace {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of a completed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// The request that was applied
    pub request: TransferRequest,

    /// Account ids in the order their locks were taken
    ///
    /// For a self-transfer handled as a no-op both entries are the same id.
    pub lock_order: [AccountId; 2],

    /// Every state the transfer passed through, ending in `Done`
    pub trace: Vec<TransferState>,
}

/// Result of a transfer: `Ok` is `Done`, `Err` is `Failed(reason)`
pub type TransferOutcome = Result<TransferReceipt, TransferError>;

/// A request paired with its outcome, as collected by the worker strategies
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub request: TransferRequest,
    pub outcome: TransferOutcome,
}
