//! Worker strategies for running transfer workloads
//!
//! A strategy takes a list of transfer requests and a [`TransferProtocol`] and
//! runs the requests from several workers at once. Two implementations can be
//! selected at runtime:
//!
//! - [`ThreadedStrategy`]: one OS thread per worker, requests dealt round-robin
//! - [`PooledStrategy`]: a tokio runtime whose blocking pool runs request chunks
//!
//! Neither strategy orders requests across workers; the only synchronization
//! between transfers is the account locks themselves.

use crate::cli::StrategyType;
use crate::core::TransferProtocol;
use crate::types::{ErrorKind, TransferRequest, TransferResult};
use std::collections::HashMap;
use std::sync::Arc;

pub mod pooled;
pub mod threaded;

pub use pooled::PooledStrategy;
pub use threaded::ThreadedStrategy;

/// Worker settings shared by both strategies
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of workers running transfers at the same time
    pub workers: usize,
    /// Requests per pooled task (pooled strategy only)
    pub chunk_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            chunk_size: 64,
        }
    }
}

impl WorkerConfig {
    /// Create a WorkerConfig, replacing zero values with the defaults
    pub fn new(workers: usize, chunk_size: usize) -> Self {
        let default = Self::default();

        let workers = if workers == 0 {
            tracing::warn!(
                "Invalid workers ({}), using default ({})",
                workers,
                default.workers
            );
            default.workers
        } else {
            workers
        };

        let chunk_size = if chunk_size == 0 {
            tracing::warn!(
                "Invalid chunk_size ({}), using default ({})",
                chunk_size,
                default.chunk_size
            );
            default.chunk_size
        } else {
            chunk_size
        };

        Self {
            workers,
            chunk_size,
        }
    }
}

/// Runs a batch of transfer requests concurrently
pub trait WorkloadStrategy: Send + Sync {
    /// Execute every request and return one result per request
    ///
    /// Results are not in submission order. Individual transfer failures are
    /// part of the results; `Err` is reserved for the workers themselves
    /// failing (runtime creation, a panicked worker).
    fn run(
        &self,
        protocol: Arc<dyn TransferProtocol>,
        requests: Vec<TransferRequest>,
    ) -> Result<Vec<TransferResult>, String>;
}

/// Create a strategy for the given type
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<WorkerConfig>,
) -> Box<dyn WorkloadStrategy> {
    let config = config.unwrap_or_default();
    match strategy_type {
        StrategyType::Threaded => Box::new(ThreadedStrategy::new(config)),
        StrategyType::Pooled => Box::new(PooledStrategy::new(config)),
    }
}

/// Execute requests one after another on the calling thread
pub(crate) fn run_lane(
    protocol: &dyn TransferProtocol,
    requests: Vec<TransferRequest>,
) -> Vec<TransferResult> {
    requests
        .into_iter()
        .map(|request| {
            let outcome = protocol.execute(&request);
            TransferResult { request, outcome }
        })
        .collect()
}

/// Counts of a finished workload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkloadSummary {
    pub submitted: usize,
    pub done: usize,
    pub failed: usize,
    /// Failures per error category
    pub failures_by_kind: HashMap<ErrorKind, usize>,
}

impl WorkloadSummary {
    pub fn from_results(results: &[TransferResult]) -> Self {
        let mut summary = WorkloadSummary {
            submitted: results.len(),
            ..Self::default()
        };

        for result in results {
            match &result.outcome {
                Ok(_) => summary.done += 1,
                Err(err) => {
                    summary.failed += 1;
                    *summary.failures_by_kind.entry(err.kind()).or_default() += 1;
                }
            }
        }

        summary
    }

    /// Failures in one category
    pub fn failures(&self, kind: ErrorKind) -> usize {
        self.failures_by_kind.get(&kind).copied().unwrap_or(0)
    }
}
