//! Rust Transfer Engine CLI
//!
//! Runs a batch of transfers concurrently against a set of accounts.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- accounts.csv transfers.csv > balances.csv
//! cargo run -- --strategy threaded --workers 8 accounts.csv transfers.csv > balances.csv
//! cargo run -- --protocol naive --hold-delay-ms 5 accounts.csv transfers.csv > balances.csv
//! ```
//!
//! Final balances go to stdout as `account,balance`. Logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success (individual transfers may still have failed; see the log)
//! - 1: Error (file not found, bad accounts file, total balance changed, etc.)

use rust_transfer_engine::cli;
use rust_transfer_engine::driver::{Driver, DriverConfig};
use rust_transfer_engine::logging;
use std::process;

fn main() {
    let args = cli::parse_args();
    logging::init_logging(&args.log_level);

    let driver = Driver::new(DriverConfig::from(&args));

    let mut output = std::io::stdout();
    match driver.run(&args.accounts_file, &args.transfers_file, &mut output) {
        Ok(report) => {
            for (kind, count) in &report.summary.failures_by_kind {
                tracing::info!(?kind, count, "failed transfers");
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
