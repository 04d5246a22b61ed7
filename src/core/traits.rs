//! Core traits
//!
//! [`TransferProtocol`] is the seam between the worker strategies and the two
//! locking protocols, so the same driver can run the ordered coordinator or the
//! naive argument-order variant.

use crate::types::{AccountId, TransferOutcome, TransferRequest};
use rust_decimal::Decimal;

/// A way of moving funds between two accounts
pub trait TransferProtocol: Send + Sync {
    /// Move `amount` from `from` to `to`
    fn transfer(&self, from: AccountId, to: AccountId, amount: Decimal) -> TransferOutcome;

    /// Apply a request
    fn execute(&self, request: &TransferRequest) -> TransferOutcome {
        self.transfer(request.from, request.to, request.amount)
    }

    /// Short name used in logs
    fn name(&self) -> &'static str;
}
