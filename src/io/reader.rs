//! CSV file readers
//!
//! - [`TransferReader`] streams transfer requests from a file, one row at a
//!   time, yielding per-row errors so a bad row can be skipped.
//! - [`load_accounts`] reads the whole accounts file up front. A bad row there
//!   is fatal: the account set must be complete before any transfer runs.
//!
//! Both delegate field parsing to [`crate::io::csv_format`] and report errors
//! with 1-based line numbers (the header is line 1).

use crate::io::csv_format::{
    convert_account_record, convert_transfer_record, AccountCsvRecord, TransferCsvRecord,
};
use crate::types::{AccountId, TransferRequest};
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use std::fs::File;
use std::path::Path;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Streaming reader over a transfers file
#[derive(Debug)]
pub struct TransferReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl TransferReader {
    /// Open a transfers file with a `from,to,amount` header
    pub fn new(path: &Path) -> Result<Self, String> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }
}

impl Iterator for TransferReader {
    type Item = Result<TransferRequest, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<TransferCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(record) => {
                convert_transfer_record(record).map_err(|e| format!("Line {}: {}", self.line_num, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}

/// Read every `(id, opening balance)` pair from an accounts file
///
/// Duplicate ids are not checked here; the registry rejects them.
pub fn load_accounts(path: &Path) -> Result<Vec<(AccountId, Decimal)>, String> {
    let mut reader = open_csv(path)?;
    let mut accounts = Vec::new();

    for (index, row) in reader.deserialize::<AccountCsvRecord>().enumerate() {
        let line_num = index + 2;
        let record = row.map_err(|e| format!("Line {}: CSV parse error: {}", line_num, e))?;
        let account =
            convert_account_record(record).map_err(|e| format!("Line {}: {}", line_num, e))?;
        accounts.push(account);
    }

    Ok(accounts)
}
