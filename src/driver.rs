//! End-to-end run: load accounts, run transfers concurrently, write balances
//!
//! The driver owns the pipeline the binary runs:
//! 1. Load the accounts file into an [`AccountRegistry`]
//! 2. Stream the transfers file, skipping malformed rows
//! 3. Build the selected protocol (ordered coordinator or naive)
//! 4. Run every request through the selected worker strategy
//! 5. Check that the total balance is unchanged
//! 6. Write final balances as CSV
//!
//! Individual transfer failures are logged and counted, never fatal. A
//! conservation violation is fatal.

use crate::cli::{CliArgs, ProtocolType, StrategyType, DEFAULT_NAIVE_LOCK_TIMEOUT_MS};
use crate::core::{
    AccountRegistry, CoordinatorConfig, DelayHook, LockHook, NaiveTransfer, NoopHook,
    TransferCoordinator, TransferProtocol,
};
use crate::io::{load_accounts, write_balances_csv, TransferReader};
use crate::strategy::{create_strategy, WorkerConfig, WorkloadSummary};
use crate::types::AccountSnapshot;
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Everything needed to run a workload
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub strategy: StrategyType,
    pub workers: WorkerConfig,
    pub protocol: ProtocolType,
    pub coordinator: CoordinatorConfig,
    /// Delay between first and second lock, if any
    pub hold_delay: Option<Duration>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Pooled,
            workers: WorkerConfig::default(),
            protocol: ProtocolType::Ordered,
            coordinator: CoordinatorConfig::default(),
            hold_delay: None,
        }
    }
}

impl From<&CliArgs> for DriverConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            strategy: args.strategy.clone(),
            workers: args.to_worker_config(),
            protocol: args.protocol,
            coordinator: args.to_coordinator_config(),
            hold_delay: args.hold_delay(),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: WorkloadSummary,
    pub total_before: Decimal,
    pub total_after: Decimal,
    pub balances: Vec<AccountSnapshot>,
    /// Rows of the transfers file that could not be parsed
    pub skipped_rows: usize,
}

/// Runs a transfer workload from files
#[derive(Debug, Clone, Default)]
pub struct Driver {
    config: DriverConfig,
}

impl Driver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Build the configured protocol over `registry`
    ///
    /// The naive protocol can deadlock, so it falls back to a bounded lock
    /// wait of [`DEFAULT_NAIVE_LOCK_TIMEOUT_MS`] when none is configured.
    pub fn build_protocol(&self, registry: Arc<AccountRegistry>) -> Arc<dyn TransferProtocol> {
        let hook: Arc<dyn LockHook> = match self.config.hold_delay {
            Some(delay) => Arc::new(DelayHook::new(delay)),
            None => Arc::new(NoopHook),
        };

        match self.config.protocol {
            ProtocolType::Ordered => Arc::new(
                TransferCoordinator::new(registry)
                    .with_config(self.config.coordinator.clone())
                    .with_hook(hook),
            ),
            ProtocolType::Naive => Arc::new(
                NaiveTransfer::new(registry)
                    .with_lock_timeout(Some(self.config.coordinator.lock_timeout.unwrap_or(
                        Duration::from_millis(DEFAULT_NAIVE_LOCK_TIMEOUT_MS),
                    )))
                    .with_overdraft(self.config.coordinator.allow_overdraft)
                    .with_hook(hook),
            ),
        }
    }

    /// Run the transfers in `transfers_path` against the accounts in
    /// `accounts_path` and write final balances to `output`
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be read, the accounts file has
    /// a bad row or a duplicate id, a worker fails, the total balance changed,
    /// or the output cannot be written.
    pub fn run(
        &self,
        accounts_path: &Path,
        transfers_path: &Path,
        output: &mut dyn Write,
    ) -> Result<RunReport, String> {
        let registry = Arc::new(
            AccountRegistry::from_balances(load_accounts(accounts_path)?)
                .map_err(|e| format!("Failed to load accounts: {}", e))?,
        );

        let mut skipped_rows = 0;
        let mut requests = Vec::new();
        for row in TransferReader::new(transfers_path)? {
            match row {
                Ok(request) => requests.push(request),
                Err(e) => {
                    tracing::warn!("Skipping transfer row: {}", e);
                    skipped_rows += 1;
                }
            }
        }

        let protocol = self.build_protocol(Arc::clone(&registry));
        let strategy = create_strategy(self.config.strategy.clone(), Some(self.config.workers.clone()));

        let total_before = registry
            .total_balance()
            .map_err(|e| format!("Failed to total opening balances: {}", e))?;
        let started = Instant::now();
        let results = strategy.run(Arc::clone(&protocol), requests)?;
        let elapsed = started.elapsed();
        let total_after = registry
            .total_balance()
            .map_err(|e| format!("Failed to total final balances: {}", e))?;

        let summary = WorkloadSummary::from_results(&results);
        tracing::info!(
            protocol = protocol.name(),
            strategy = ?self.config.strategy,
            accounts = registry.len(),
            submitted = summary.submitted,
            done = summary.done,
            failed = summary.failed,
            skipped_rows,
            elapsed_ms = elapsed.as_millis() as u64,
            "workload finished"
        );

        if total_before != total_after {
            tracing::error!(%total_before, %total_after, "total balance changed");
            return Err(format!(
                "Conservation violated: total before {}, total after {}",
                total_before, total_after
            ));
        }

        let balances = registry.snapshot();
        write_balances_csv(&balances, output)?;

        Ok(RunReport {
            summary,
            total_before,
            total_after,
            balances,
            skipped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorKind, TransferError};
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_run_writes_final_balances() {
        let accounts = create_temp_csv("account,balance\n1,1000\n2,1000\n");
        let transfers = create_temp_csv("from,to,amount\n1,2,500\n2,1,200\n");

        let mut output = Vec::new();
        let report = Driver::default()
            .run(accounts.path(), transfers.path(), &mut output)
            .unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "account,balance\n1,700.0000\n2,1300.0000\n"
        );
        assert_eq!(report.summary.done, 2);
        assert_eq!(report.total_before, Decimal::new(2000, 0));
        assert_eq!(report.total_after, Decimal::new(2000, 0));
    }

    #[test]
    fn test_run_counts_skipped_rows_and_failures() {
        let accounts = create_temp_csv("account,balance\n1,100\n2,0\n");
        let transfers = create_temp_csv("from,to,amount\n1,2,abc\n1,1,5\n2,1,50\n1,2,10\n");

        let mut output = Vec::new();
        let report = Driver::default()
            .run(accounts.path(), transfers.path(), &mut output)
            .unwrap();

        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.summary.submitted, 3);
        // account 2 holds at most 10 when 2 -> 1 of 50 runs, in any order
        assert_eq!(report.summary.done, 1);
        assert_eq!(report.summary.failures(ErrorKind::InvalidTransfer), 1);
        assert_eq!(report.summary.failures(ErrorKind::InsufficientFunds), 1);
        assert_eq!(report.total_before, Decimal::new(100, 0));
        assert_eq!(report.total_after, Decimal::new(100, 0));
        assert_eq!(
            report.balances,
            vec![
                AccountSnapshot::new(1, Decimal::new(90, 0)),
                AccountSnapshot::new(2, Decimal::new(10, 0)),
            ]
        );
    }

    #[test]
    fn test_run_rejects_duplicate_accounts() {
        let accounts = create_temp_csv("account,balance\n1,100\n1,200\n");
        let transfers = create_temp_csv("from,to,amount\n");

        let err = Driver::default()
            .run(accounts.path(), transfers.path(), &mut Vec::new())
            .unwrap_err();

        assert_eq!(err, "Failed to load accounts: Account 1 already exists");
    }

    #[test]
    fn test_run_rejects_balances_whose_total_overflows() {
        let accounts =
            create_temp_csv("account,balance\n1,79228162514264337593543950335\n2,1\n");
        let transfers = create_temp_csv("from,to,amount\n1,2,5\n");

        let mut output = Vec::new();
        let err = Driver::default()
            .run(accounts.path(), transfers.path(), &mut output)
            .unwrap_err();

        assert!(err.starts_with("Failed to total opening balances:"), "{}", err);
        assert!(output.is_empty());
    }

    #[test]
    fn test_naive_protocol_gets_a_bounded_lock_wait() {
        let registry = Arc::new(
            AccountRegistry::from_balances([(1, Decimal::new(10, 0)), (2, Decimal::ZERO)])
                .unwrap(),
        );
        let naive = Driver::new(DriverConfig {
            protocol: ProtocolType::Naive,
            ..DriverConfig::default()
        })
        .build_protocol(Arc::clone(&registry));

        let account = registry.get(2).unwrap();
        let held = account.acquire();
        let outcome = naive.transfer(1, 2, Decimal::ONE);
        held.release();

        assert_eq!(
            outcome.unwrap_err(),
            TransferError::lock_timeout(2, DEFAULT_NAIVE_LOCK_TIMEOUT_MS)
        );
        assert_eq!(registry.get(1).unwrap().balance(), Decimal::new(10, 0));
    }

    #[test]
    fn test_build_protocol_names() {
        let registry = Arc::new(AccountRegistry::new());

        let ordered = Driver::default().build_protocol(Arc::clone(&registry));
        let naive = Driver::new(DriverConfig {
            protocol: ProtocolType::Naive,
            ..DriverConfig::default()
        })
        .build_protocol(registry);

        assert_eq!(ordered.name(), "ordered");
        assert_eq!(naive.name(), "naive");
    }
}
