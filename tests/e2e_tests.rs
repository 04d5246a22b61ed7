//! End-to-end integration tests
//!
//! These tests validate the complete transfer pipeline using predefined CSV
//! fixtures. Each test:
//! 1. Loads accounts.csv from a fixture directory
//! 2. Runs every row of transfers.csv concurrently
//! 3. Generates output CSV
//! 4. Compares actual output with expected.csv
//!
//! Fixtures are located in tests/fixtures/. Every fixture is written so its
//! final balances do not depend on the order in which workers run transfers.
//!
//! Each fixture runs with both worker strategies. The naive protocol only runs
//! fixtures whose transfers never cross (no pair locked in both directions),
//! since crossing transfers can deadlock it and fail on the lock timeout.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal::Decimal;
    use rust_transfer_engine::cli::{ProtocolType, StrategyType};
    use rust_transfer_engine::driver::{Driver, DriverConfig};
    use rust_transfer_engine::strategy::WorkerConfig;
    use rust_transfer_engine::types::ErrorKind;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    fn driver_for(strategy: StrategyType, protocol: ProtocolType) -> Driver {
        Driver::new(DriverConfig {
            strategy,
            protocol,
            workers: WorkerConfig::new(4, 2),
            ..DriverConfig::default()
        })
    }

    /// Run a fixture and compare its output with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file is missing, the run fails, or the output
    /// does not match.
    fn run_test_fixture(fixture_name: &str, strategy: StrategyType, protocol: ProtocolType) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let accounts_path = format!("{}/accounts.csv", fixture_dir);
        let transfers_path = format!("{}/transfers.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        for path in [&accounts_path, &transfers_path, &expected_path] {
            assert!(Path::new(path).exists(), "Fixture file not found: {}", path);
        }

        let driver = driver_for(strategy.clone(), protocol);
        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");

        let report = driver
            .run(
                Path::new(&accounts_path),
                Path::new(&transfers_path),
                &mut temp_output,
            )
            .unwrap_or_else(|e| panic!("Failed to run transfers: {}", e));

        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?}, protocol: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy, protocol, actual_output, expected_output
        );
        assert_eq!(report.total_before, report.total_after);
    }

    #[rstest]
    #[case("happy_path")]
    #[case("crossing_transfers")]
    #[case("invalid_transfers")]
    #[case("insufficient_funds")]
    #[case("precision_testing")]
    #[case("malformed_data")]
    #[case("unsorted_accounts")]
    #[case("no_transfers")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Threaded, StrategyType::Pooled)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, ProtocolType::Ordered);
    }

    #[rstest]
    #[case("invalid_transfers")]
    #[case("insufficient_funds")]
    #[case("unsorted_accounts")]
    #[case("no_transfers")]
    fn test_acyclic_fixtures_with_naive_protocol(
        #[case] fixture: &str,
        #[values(StrategyType::Threaded, StrategyType::Pooled)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, ProtocolType::Naive);
    }

    #[rstest]
    fn test_invalid_transfers_are_counted_by_kind(
        #[values(StrategyType::Threaded, StrategyType::Pooled)] strategy: StrategyType,
    ) {
        let report = driver_for(strategy, ProtocolType::Ordered)
            .run(
                Path::new("tests/fixtures/invalid_transfers/accounts.csv"),
                Path::new("tests/fixtures/invalid_transfers/transfers.csv"),
                &mut Vec::new(),
            )
            .unwrap();

        assert_eq!(report.summary.submitted, 6);
        assert_eq!(report.summary.done, 1);
        assert_eq!(report.summary.failures(ErrorKind::InvalidTransfer), 5);
        assert_eq!(report.total_after, Decimal::new(200, 0));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let report = driver_for(StrategyType::Pooled, ProtocolType::Ordered)
            .run(
                Path::new("tests/fixtures/malformed_data/accounts.csv"),
                Path::new("tests/fixtures/malformed_data/transfers.csv"),
                &mut Vec::new(),
            )
            .unwrap();

        assert_eq!(report.skipped_rows, 4);
        assert_eq!(report.summary.submitted, 1);
    }

    #[test]
    fn test_missing_accounts_file_is_fatal() {
        let result = driver_for(StrategyType::Threaded, ProtocolType::Ordered).run(
            Path::new("tests/fixtures/does_not_exist.csv"),
            Path::new("tests/fixtures/happy_path/transfers.csv"),
            &mut Vec::new(),
        );

        assert!(result.unwrap_err().contains("Failed to open file"));
    }

    #[test]
    fn test_bad_accounts_row_is_fatal() {
        let mut accounts = NamedTempFile::new().expect("Failed to create temp file");
        accounts
            .write_all(b"account,balance\n1,100\n2,lots\n")
            .expect("Failed to write to temp file");
        accounts.flush().expect("Failed to flush temp file");

        let result = driver_for(StrategyType::Threaded, ProtocolType::Ordered).run(
            accounts.path(),
            Path::new("tests/fixtures/happy_path/transfers.csv"),
            &mut Vec::new(),
        );

        assert_eq!(
            result.unwrap_err(),
            "Line 3: Invalid balance 'lots' for account 2"
        );
    }
}
