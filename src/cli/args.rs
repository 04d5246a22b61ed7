use crate::core::{CoordinatorConfig, SelfTransferPolicy};
use crate::strategy::WorkerConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Lock wait applied to the naive protocol when none is given
pub const DEFAULT_NAIVE_LOCK_TIMEOUT_MS: u64 = 1000;

/// Run concurrent transfers between shared accounts
#[derive(Parser, Debug)]
#[command(name = "transfer-engine")]
#[command(about = "Run concurrent transfers between shared, lockable accounts", long_about = None)]
pub struct CliArgs {
    /// Accounts CSV file path (`account,balance`)
    #[arg(value_name = "ACCOUNTS", help = "Path to the accounts CSV file")]
    pub accounts_file: PathBuf,

    /// Transfers CSV file path (`from,to,amount`)
    #[arg(value_name = "TRANSFERS", help = "Path to the transfers CSV file")]
    pub transfers_file: PathBuf,

    /// Worker strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "pooled",
        help = "Worker strategy: 'threaded' for one thread per worker or 'pooled' for a tokio blocking pool"
    )]
    pub strategy: StrategyType,

    /// Number of concurrent workers
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of concurrent workers (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Requests per pooled task
    #[arg(
        long = "chunk-size",
        value_name = "SIZE",
        help = "Transfers per pooled task (default: 64, pooled strategy only)"
    )]
    pub chunk_size: Option<usize>,

    /// Locking protocol
    #[arg(
        long = "protocol",
        value_name = "PROTOCOL",
        default_value = "ordered",
        help = "Locking protocol: 'ordered' (lower id first) or 'naive' (argument order, deadlock-prone)"
    )]
    pub protocol: ProtocolType,

    /// Bound on each lock wait in milliseconds
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MS",
        help = "Fail a transfer instead of waiting longer than this for a lock (naive default: 1000)"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Artificial delay between the first and second lock in milliseconds
    #[arg(
        long = "hold-delay-ms",
        value_name = "MS",
        help = "Hold the first lock this long before taking the second"
    )]
    pub hold_delay_ms: Option<u64>,

    /// Self-transfer handling
    #[arg(
        long = "self-transfer",
        value_name = "POLICY",
        default_value = "reject",
        help = "Self-transfer policy: 'reject' or 'noop'"
    )]
    pub self_transfer: SelfTransferMode,

    /// Allow balances to go negative
    #[arg(long = "allow-overdraft")]
    pub allow_overdraft: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Available worker strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Threaded,
    Pooled,
}

/// Available locking protocols
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtocolType {
    Ordered,
    Naive,
}

/// Self-transfer policy as named on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SelfTransferMode {
    Reject,
    Noop,
}

impl From<SelfTransferMode> for SelfTransferPolicy {
    fn from(mode: SelfTransferMode) -> Self {
        match mode {
            SelfTransferMode::Reject => SelfTransferPolicy::Reject,
            SelfTransferMode::Noop => SelfTransferPolicy::NoOp,
        }
    }
}

impl CliArgs {
    /// Create a WorkerConfig from CLI arguments
    ///
    /// Missing values fall back to the defaults; zero values are replaced by
    /// the defaults with a warning.
    pub fn to_worker_config(&self) -> WorkerConfig {
        if self.workers.is_some() || self.chunk_size.is_some() {
            let default = WorkerConfig::default();
            WorkerConfig::new(
                self.workers.unwrap_or(default.workers),
                self.chunk_size.unwrap_or(default.chunk_size),
            )
        } else {
            WorkerConfig::default()
        }
    }

    /// Effective lock timeout
    ///
    /// The naive protocol always gets a bound so a deadlock is reported
    /// instead of hanging the process.
    pub fn lock_timeout(&self) -> Option<Duration> {
        match (self.lock_timeout_ms, self.protocol) {
            (Some(ms), _) => Some(Duration::from_millis(ms)),
            (None, ProtocolType::Naive) => {
                Some(Duration::from_millis(DEFAULT_NAIVE_LOCK_TIMEOUT_MS))
            }
            (None, ProtocolType::Ordered) => None,
        }
    }

    pub fn hold_delay(&self) -> Option<Duration> {
        self.hold_delay_ms
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
    }

    /// Create a CoordinatorConfig from CLI arguments
    pub fn to_coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            lock_timeout: self.lock_timeout(),
            allow_overdraft: self.allow_overdraft,
            self_transfer: self.self_transfer.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FILES: [&str; 3] = ["program", "accounts.csv", "transfers.csv"];

    fn parse(extra: &[&str]) -> CliArgs {
        let args: Vec<&str> = FILES.iter().chain(extra.iter()).copied().collect();
        CliArgs::try_parse_from(args).unwrap()
    }

    #[rstest]
    #[case::default_strategy(&[], StrategyType::Pooled)]
    #[case::explicit_threaded(&["--strategy", "threaded"], StrategyType::Threaded)]
    #[case::explicit_pooled(&["--strategy", "pooled"], StrategyType::Pooled)]
    fn test_strategy_parsing(#[case] extra: &[&str], #[case] expected: StrategyType) {
        assert_eq!(parse(extra).strategy, expected);
    }

    #[rstest]
    #[case::default_protocol(&[], ProtocolType::Ordered)]
    #[case::naive(&["--protocol", "naive"], ProtocolType::Naive)]
    fn test_protocol_parsing(#[case] extra: &[&str], #[case] expected: ProtocolType) {
        assert_eq!(parse(extra).protocol, expected);
    }

    #[rstest]
    #[case::all_defaults(&[], num_cpus::get(), 64)]
    #[case::custom_workers(&["--workers", "8"], 8, 64)]
    #[case::custom_chunk(&["--chunk-size", "16"], num_cpus::get(), 16)]
    #[case::zero_workers(&["--workers", "0"], num_cpus::get(), 64)]
    #[case::zero_chunk(&["--chunk-size", "0"], num_cpus::get(), 64)]
    fn test_worker_config_conversion(
        #[case] extra: &[&str],
        #[case] expected_workers: usize,
        #[case] expected_chunk: usize,
    ) {
        let config = parse(extra).to_worker_config();
        assert_eq!(config.workers, expected_workers);
        assert_eq!(config.chunk_size, expected_chunk);
    }

    #[rstest]
    #[case::ordered_unbounded(&[], None)]
    #[case::ordered_bounded(&["--lock-timeout-ms", "250"], Some(250))]
    #[case::naive_default_bound(&["--protocol", "naive"], Some(DEFAULT_NAIVE_LOCK_TIMEOUT_MS))]
    #[case::naive_custom_bound(&["--protocol", "naive", "--lock-timeout-ms", "50"], Some(50))]
    fn test_lock_timeout(#[case] extra: &[&str], #[case] expected_ms: Option<u64>) {
        assert_eq!(
            parse(extra).lock_timeout(),
            expected_ms.map(Duration::from_millis)
        );
    }

    #[test]
    fn test_coordinator_config_conversion() {
        let config =
            parse(&["--self-transfer", "noop", "--allow-overdraft"]).to_coordinator_config();

        assert_eq!(config.self_transfer, SelfTransferPolicy::NoOp);
        assert!(config.allow_overdraft);
        assert_eq!(config.lock_timeout, None);
    }

    #[rstest]
    #[case::absent(&[], None)]
    #[case::zero(&["--hold-delay-ms", "0"], None)]
    #[case::set(&["--hold-delay-ms", "25"], Some(Duration::from_millis(25)))]
    fn test_hold_delay(#[case] extra: &[&str], #[case] expected: Option<Duration>) {
        assert_eq!(parse(extra).hold_delay(), expected);
    }

    #[rstest]
    #[case::missing_transfers(&["program", "accounts.csv"])]
    #[case::invalid_strategy(&["program", "a.csv", "t.csv", "--strategy", "invalid"])]
    #[case::invalid_protocol(&["program", "a.csv", "t.csv", "--protocol", "reverse"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
