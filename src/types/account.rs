//! Account-related types for the transfer engine
//!
//! The live, lockable account lives in [`crate::core::account`]. This module only
//! holds the identifier type and the plain snapshot used for output and auditing.

use rust_decimal::Decimal;

/// Account identifier
///
/// Identifiers are totally ordered and never change once an account is opened.
/// The ordered transfer protocol relies on this ordering to rank locks.
pub type AccountId = u32;

/// Point-in-time copy of an account's balance
///
/// A snapshot is detached from the account lock; it may be stale as soon as it
/// is returned if transfers are still running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// The account identifier
    pub id: AccountId,

    /// Balance at the time the snapshot was taken
    pub balance: Decimal,
}

impl AccountSnapshot {
    /// Create a new snapshot
    pub fn new(id: AccountId, balance: Decimal) -> Self {
        AccountSnapshot { id, balance }
    }
}
