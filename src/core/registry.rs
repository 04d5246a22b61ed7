//! Account registry
//!
//! This module provides the `AccountRegistry`, the shared set of accounts that
//! transfers run against. Accounts are opened once and never removed, so the
//! registry hands out `Arc<LockableAccount>` handles that stay valid for the
//! life of the process.
//!
//! # Thread Safety
//!
//! Storage is a `DashMap`, so accounts can be opened and looked up from many
//! threads. Lookups clone the `Arc` out and drop the map reference straight
//! away: no map shard lock is ever held while an account lock is being waited
//! on.

use crate::core::account::LockableAccount;
use crate::types::{AccountId, AccountSnapshot, TransferError};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Shared set of lockable accounts keyed by id
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: DashMap<AccountId, Arc<LockableAccount>>,
}

impl AccountRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Build a registry from `(id, initial balance)` pairs
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if an id appears twice.
    pub fn from_balances<I>(balances: I) -> Result<Self, TransferError>
    where
        I: IntoIterator<Item = (AccountId, Decimal)>,
    {
        let registry = Self::new();
        for (id, balance) in balances {
            registry.open(id, balance)?;
        }
        Ok(registry)
    }

    /// Open a new account
    ///
    /// # Errors
    ///
    /// Returns `DuplicateAccount` if the id is already registered; the existing
    /// account is untouched.
    pub fn open(
        &self,
        id: AccountId,
        initial_balance: Decimal,
    ) -> Result<Arc<LockableAccount>, TransferError> {
        let mut created = false;
        let account = Arc::clone(
            self.accounts
                .entry(id)
                .or_insert_with(|| {
                    created = true;
                    Arc::new(LockableAccount::new(id, initial_balance))
                })
                .value(),
        );

        if !created {
            return Err(TransferError::duplicate_account(id));
        }

        tracing::debug!(account = id, balance = %initial_balance, "account opened");
        Ok(account)
    }

    /// Look up an account
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for an unknown id.
    pub fn get(&self, id: AccountId) -> Result<Arc<LockableAccount>, TransferError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| TransferError::account_not_found(id))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts sorted by ascending id
    fn sorted_accounts(&self) -> Vec<Arc<LockableAccount>> {
        let mut accounts: Vec<Arc<LockableAccount>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by_key(|account| account.id());
        accounts
    }

    /// Balances of all accounts, sorted by id
    ///
    /// Each account is locked on its own in turn, so while transfers are
    /// running the result is not a consistent cut. Use [`Self::total_balance`]
    /// for a consistent sum.
    pub fn snapshot(&self) -> Vec<AccountSnapshot> {
        self.sorted_accounts()
            .iter()
            .map(|account| AccountSnapshot::new(account.id(), account.balance()))
            .collect()
    }

    /// Sum of all balances, taken with every account locked at once
    ///
    /// Locks are acquired in ascending id order, the same order transfers use,
    /// so the audit cannot deadlock against running transfers. It waits for
    /// in-flight transfers to finish and blocks new ones until it is done.
    ///
    /// # Errors
    ///
    /// `ArithmeticOverflow` naming the account whose balance pushed the sum
    /// past the `Decimal` range.
    pub fn total_balance(&self) -> Result<Decimal, TransferError> {
        let accounts = self.sorted_accounts();
        let guards: Vec<_> = accounts.iter().map(|account| account.acquire()).collect();

        guards.iter().try_fold(Decimal::ZERO, |total, guard| {
            total
                .checked_add(guard.balance())
                .ok_or_else(|| TransferError::arithmetic_overflow("total", guard.id()))
        })
    }
}
