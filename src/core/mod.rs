//! Core locking components
//!
//! - `account` - Lockable account and its scoped guard
//! - `registry` - Shared account set
//! - `coordinator` - Ordered, deadlock-free transfers
//! - `naive` - Argument-order transfers, kept to demonstrate the deadlock
//! - `hooks` - Callbacks inside the critical section
//! - `counter` - Mutex-guarded counter for checking exclusion
//! - `traits` - Protocol abstraction used by the worker strategies

pub mod account;
pub mod coordinator;
pub mod counter;
pub mod hooks;
pub mod naive;
pub mod registry;
pub mod traits;

pub use account::{AccountGuard, LockableAccount};
pub use coordinator::{lock_order, CoordinatorConfig, SelfTransferPolicy, TransferCoordinator};
pub use counter::SharedCounter;
pub use hooks::{DelayHook, LockHook, NoopHook};
pub use naive::NaiveTransfer;
pub use registry::AccountRegistry;
pub use traits::TransferProtocol;
