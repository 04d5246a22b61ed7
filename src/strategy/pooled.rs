//! Pooled strategy on a tokio runtime
//!
//! Requests are cut into chunks of `chunk_size` and each chunk is submitted to
//! the runtime's blocking pool with `spawn_blocking`. Lock waits block the
//! calling thread, so they must not run on the async worker threads. The
//! blocking pool is capped at `workers` threads, which bounds how many
//! transfers run at once.
//!
//! # Architecture
//!
//! ```text
//! PooledStrategy
//!     ├── WorkerConfig (workers, chunk_size)
//!     ├── tokio multi-thread runtime
//!     │     └── blocking pool (max `workers` threads)
//!     │           └── run_lane(chunk) per task
//!     └── futures::future::join_all over the task handles
//! ```

use crate::core::TransferProtocol;
use crate::strategy::{run_lane, WorkerConfig, WorkloadStrategy};
use crate::types::{TransferRequest, TransferResult};
use futures::future::join_all;
use std::sync::Arc;

/// Runs request chunks on a tokio blocking pool
#[derive(Debug, Clone)]
pub struct PooledStrategy {
    config: WorkerConfig,
}

impl PooledStrategy {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }
}

impl WorkloadStrategy for PooledStrategy {
    fn run(
        &self,
        protocol: Arc<dyn TransferProtocol>,
        requests: Vec<TransferRequest>,
    ) -> Result<Vec<TransferResult>, String> {
        // tokio and `chunks` both panic on zero
        let workers = self.config.workers.max(1);
        let chunk_size = self.config.chunk_size.max(1);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .max_blocking_threads(workers)
            .thread_name("transfer-worker")
            .build()
            .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

        let submitted = requests.len();
        tracing::debug!(
            protocol = protocol.name(),
            workers,
            chunk_size,
            submitted,
            "starting pooled workload"
        );

        runtime.block_on(async {
            let tasks: Vec<_> = requests
                .chunks(chunk_size)
                .map(|chunk| {
                    let chunk = chunk.to_vec();
                    let protocol = Arc::clone(&protocol);
                    tokio::task::spawn_blocking(move || run_lane(protocol.as_ref(), chunk))
                })
                .collect();

            let mut results = Vec::with_capacity(submitted);
            for joined in join_all(tasks).await {
                match joined {
                    Ok(chunk_results) => results.extend(chunk_results),
                    Err(e) => {
                        tracing::error!(error = %e, "worker task failed");
                        return Err(format!("Worker task failed: {}", e));
                    }
                }
            }
            Ok(results)
        })
    }
}
