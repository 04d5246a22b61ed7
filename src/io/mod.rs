//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `reader` - Transfer file iterator and accounts file loader

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_account_record, convert_transfer_record, write_balances_csv, AccountCsvRecord,
    TransferCsvRecord,
};
pub use reader::{load_accounts, TransferReader};
