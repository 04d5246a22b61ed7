//! Types module
//!
//! Contains the plain data structures used throughout the engine:
//! - `account`: account identifier and snapshots
//! - `transfer`: transfer requests, the transfer state machine and receipts
//! - `error`: error types for the engine

pub mod account;
pub mod error;
pub mod transfer;

pub use account::{AccountId, AccountSnapshot};
pub use error::{ErrorKind, TransferError};
pub use transfer::{
    TransferOutcome, TransferReceipt, TransferRequest, TransferResult, TransferState,
    TransferTrace,
};
