//! Rust Transfer Engine Library
//! # Overview
//!
//! This library moves funds between shared accounts from many threads at once
//! without deadlocking. Every account carries its own lock and a transfer
//! always takes the lock of the lower account id first, so no two transfers
//! can wait on each other in a cycle.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (requests, transfer states, errors)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Locking and transfer logic:
//!   - [`core::account`] - Lockable account and its scoped guard
//!   - [`core::registry`] - Shared account lookup by id
//!   - [`core::coordinator`] - Ordered two-lock transfer coordinator
//!   - [`core::naive`] - Argument-order locking, kept for deadlock demonstrations
//!   - [`core::hooks`] - Delay and fault injection between lock steps
//!   - [`core::counter`] - Mutex-guarded counter
//! - [`strategy`] - Worker strategies that run a workload concurrently
//! - [`io`] - CSV input and output
//! - [`driver`] - The end-to-end pipeline used by the binary
//! - [`logging`] - Subscriber setup
//!
//! # Transfer Lifecycle
//!
//! A transfer moves through these states:
//!
//! - **Pending**: Validated, no locks held
//! - **LockedFirst**: Lower id locked
//! - **LockedBoth**: Both accounts locked
//! - **Mutated**: Funds moved
//! - **Released**: All locks dropped
//! - **Done** / **Failed**: Terminal
//!
//! Locks are scoped guards, so every exit path, including errors and panics,
//! releases them.

// Module declarations
pub mod cli;
pub mod core;
pub mod driver;
pub mod io;
pub mod logging;
pub mod strategy;
pub mod types;

pub use core::{
    AccountRegistry, CoordinatorConfig, LockableAccount, NaiveTransfer, SelfTransferPolicy,
    TransferCoordinator, TransferProtocol,
};
pub use driver::{Driver, DriverConfig, RunReport};
pub use io::write_balances_csv;
pub use types::{
    AccountId, AccountSnapshot, ErrorKind, TransferError, TransferOutcome, TransferReceipt,
    TransferRequest, TransferResult, TransferState,
};
