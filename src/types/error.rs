//! Error types for the transfer engine
//!
//! Every way a transfer can fail is a variant of [`TransferError`]. Errors are
//! plain values: by the time one reaches a caller, every lock the failed
//! transfer held has already been released.
//!
//! # Error Categories
//!
//! - **Invalid transfer**: self-transfer, unknown account, non-positive amount
//! - **Insufficient funds**: the debit would overdraw the source account
//! - **Lock acquisition failure**: a bounded wait expired
//! - **Internal**: arithmetic overflow, aborted critical section, duplicate account

use crate::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Broad classification of a [`TransferError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidTransfer,
    InsufficientFunds,
    LockAcquisitionFailure,
    Internal,
}

/// Main error type for the transfer engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransferError {
    /// Source and destination are the same account
    ///
    /// Only returned under the `Reject` self-transfer policy.
    #[error("Invalid transfer: account {account} cannot transfer to itself")]
    SelfTransfer {
        /// The account named on both sides
        account: AccountId,
    },

    /// The account id is not registered
    #[error("Invalid transfer: account {account} not found")]
    AccountNotFound {
        /// The unknown account id
        account: AccountId,
    },

    /// Transfer amount is zero or negative
    #[error("Invalid transfer: amount {amount} must be positive")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Debit would leave the account with a negative balance
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Account that would be overdrawn
        account: AccountId,
        /// Balance at the time of the check
        balance: Decimal,
        /// Requested debit
        requested: Decimal,
    },

    /// A bounded lock wait expired
    #[error("Timed out after {waited_ms}ms waiting for the lock on account {account}")]
    LockTimeout {
        /// Account whose lock could not be acquired
        account: AccountId,
        /// Configured wait in milliseconds
        waited_ms: u64,
    },

    /// Arithmetic overflow in a balance update
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account being updated
        account: AccountId,
    },

    /// The critical section was aborted before any balance changed
    #[error("Transfer {from} -> {to} aborted: {reason}")]
    Aborted {
        from: AccountId,
        to: AccountId,
        /// Why the transfer was aborted
        reason: String,
    },

    /// An account with this id is already open
    #[error("Account {account} already exists")]
    DuplicateAccount {
        /// The duplicated id
        account: AccountId,
    },
}

impl TransferError {
    /// Create a SelfTransfer error
    pub fn self_transfer(account: AccountId) -> Self {
        TransferError::SelfTransfer { account }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        TransferError::AccountNotFound { account }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        TransferError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        TransferError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account: AccountId, waited_ms: u64) -> Self {
        TransferError::LockTimeout { account, waited_ms }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        TransferError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create an Aborted error
    pub fn aborted(from: AccountId, to: AccountId, reason: &str) -> Self {
        TransferError::Aborted {
            from,
            to,
            reason: reason.to_string(),
        }
    }

    /// Create a DuplicateAccount error
    pub fn duplicate_account(account: AccountId) -> Self {
        TransferError::DuplicateAccount { account }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::SelfTransfer { .. }
            | TransferError::AccountNotFound { .. }
            | TransferError::InvalidAmount { .. } => ErrorKind::InvalidTransfer,
            TransferError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            TransferError::LockTimeout { .. } => ErrorKind::LockAcquisitionFailure,
            TransferError::ArithmeticOverflow { .. }
            | TransferError::Aborted { .. }
            | TransferError::DuplicateAccount { .. } => ErrorKind::Internal,
        }
    }
}
