//! CSV format handling for account and transfer files
//!
//! This module centralizes all CSV format concerns:
//! - `AccountCsvRecord` / `TransferCsvRecord` for deserialization
//! - Conversion from CSV records to domain types
//! - Balance output serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::types::{AccountId, AccountSnapshot, TransferRequest};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Row of the accounts file: `account,balance`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountCsvRecord {
    pub account: AccountId,
    pub balance: String,
}

/// Row of the transfers file: `from,to,amount`
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransferCsvRecord {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: String,
}

fn parse_decimal(value: &str, field: &str) -> Result<Decimal, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("Missing {}", field));
    }
    Decimal::from_str(trimmed).map_err(|_| format!("Invalid {} '{}'", field, value))
}

/// Convert an accounts row into an `(id, balance)` pair
///
/// Negative opening balances are accepted; only the text must parse.
pub fn convert_account_record(record: AccountCsvRecord) -> Result<(AccountId, Decimal), String> {
    let balance = parse_decimal(&record.balance, "balance")
        .map_err(|e| format!("{} for account {}", e, record.account))?;
    Ok((record.account, balance))
}

/// Convert a transfers row into a `TransferRequest`
///
/// Only parsing is checked here. Whether the amount is positive, the accounts
/// exist, or `from == to` is for the transfer protocol to decide, so those rows
/// still reach it and show up as failed transfers.
pub fn convert_transfer_record(record: TransferCsvRecord) -> Result<TransferRequest, String> {
    let amount = parse_decimal(&record.amount, "amount")
        .map_err(|e| format!("{} for transfer {} -> {}", e, record.from, record.to))?;
    Ok(TransferRequest::new(record.from, record.to, amount))
}

/// Write balances as CSV: `account,balance`, four decimal places, sorted by id
pub fn write_balances_csv(
    accounts: &[AccountSnapshot],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["account", "balance"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_accounts = accounts.to_vec();
    sorted_accounts.sort_by_key(|account| account.id);

    for account in sorted_accounts {
        writer
            .write_record(&[account.id.to_string(), format!("{:.4}", account.balance)])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
