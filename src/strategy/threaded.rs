//! Thread-per-worker strategy
//!
//! Spawns one scoped OS thread per worker. Requests are dealt round-robin, so
//! worker `i` runs requests `i`, `i + n`, `i + 2n`, ... in that order.

use crate::core::TransferProtocol;
use crate::strategy::{run_lane, WorkerConfig, WorkloadStrategy};
use crate::types::{TransferRequest, TransferResult};
use std::sync::Arc;
use std::thread;

/// Runs each worker on its own OS thread
#[derive(Debug, Clone)]
pub struct ThreadedStrategy {
    config: WorkerConfig,
}

impl ThreadedStrategy {
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Split requests into at most `workers` lanes, round-robin
    fn deal(&self, requests: Vec<TransferRequest>) -> Vec<Vec<TransferRequest>> {
        let lanes = self.config.workers.clamp(1, requests.len().max(1));
        let mut dealt: Vec<Vec<TransferRequest>> = vec![Vec::new(); lanes];

        for (index, request) in requests.into_iter().enumerate() {
            dealt[index % lanes].push(request);
        }

        dealt
    }
}

impl WorkloadStrategy for ThreadedStrategy {
    fn run(
        &self,
        protocol: Arc<dyn TransferProtocol>,
        requests: Vec<TransferRequest>,
    ) -> Result<Vec<TransferResult>, String> {
        let submitted = requests.len();
        let lanes = self.deal(requests);
        let protocol: &dyn TransferProtocol = protocol.as_ref();

        tracing::debug!(
            protocol = protocol.name(),
            workers = lanes.len(),
            submitted,
            "starting threaded workload"
        );

        thread::scope(|scope| {
            let handles: Vec<_> = lanes
                .into_iter()
                .map(|lane| scope.spawn(move || run_lane(protocol, lane)))
                .collect();

            // join every handle before reporting, or the scope re-raises
            // the panics of the ones left unjoined
            let mut results = Vec::with_capacity(submitted);
            let mut panicked = 0;
            for handle in handles {
                match handle.join() {
                    Ok(lane_results) => results.extend(lane_results),
                    Err(_) => panicked += 1,
                }
            }

            if panicked > 0 {
                tracing::error!(panicked, "worker threads panicked");
                return Err(format!("{} worker thread(s) panicked", panicked));
            }
            Ok(results)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AccountRegistry, LockHook, TransferCoordinator};
    use crate::types::{AccountId, TransferError};
    use rust_decimal::Decimal;

    fn requests(count: u32) -> Vec<TransferRequest> {
        (0..count)
            .map(|i| TransferRequest::new(i, i + 1, Decimal::ONE))
            .collect()
    }

    #[test]
    fn test_deal_round_robin() {
        let strategy = ThreadedStrategy::new(WorkerConfig::new(3, 1));

        let lanes = strategy.deal(requests(7));

        assert_eq!(lanes.len(), 3);
        let froms: Vec<Vec<u32>> = lanes
            .iter()
            .map(|lane| lane.iter().map(|r| r.from).collect())
            .collect();
        assert_eq!(froms, vec![vec![0, 3, 6], vec![1, 4], vec![2, 5]]);
    }

    #[test]
    fn test_deal_never_creates_empty_lanes_for_small_workloads() {
        let strategy = ThreadedStrategy::new(WorkerConfig::new(8, 1));
        assert_eq!(strategy.deal(requests(2)).len(), 2);
        assert_eq!(strategy.deal(Vec::new()).len(), 1);
    }

    /// Panics inside the critical section, after the first lock
    struct PanicHook;

    impl LockHook for PanicHook {
        fn after_first_lock(
            &self,
            _request: &TransferRequest,
            _first: AccountId,
        ) -> Result<(), TransferError> {
            panic!("worker blew up");
        }
    }

    #[test]
    fn test_run_reports_every_panicked_worker_as_error() {
        let registry = Arc::new(
            AccountRegistry::from_balances((0..=20).map(|id| (id, Decimal::new(100, 0))))
                .unwrap(),
        );
        let coordinator = Arc::new(
            TransferCoordinator::new(Arc::clone(&registry)).with_hook(Arc::new(PanicHook)),
        );
        let strategy = ThreadedStrategy::new(WorkerConfig::new(4, 1));

        let result = strategy.run(coordinator, requests(8));

        assert_eq!(result.unwrap_err(), "4 worker thread(s) panicked");
        // guards dropped during unwinding
        assert!((0..=20).all(|id| !registry.get(id).unwrap().is_locked()));
        assert_eq!(registry.total_balance().unwrap(), Decimal::new(2100, 0));
    }

    #[test]
    fn test_run_returns_one_result_per_request() {
        let registry = AccountRegistry::from_balances(
            (0..=20).map(|id| (id, Decimal::new(100, 0))),
        )
        .unwrap();
        let coordinator = Arc::new(TransferCoordinator::new(Arc::new(registry)));
        let strategy = ThreadedStrategy::new(WorkerConfig::new(4, 1));

        let results = strategy.run(coordinator.clone(), requests(20)).unwrap();

        assert_eq!(results.len(), 20);
        assert!(results.iter().all(|r| r.outcome.is_ok()));
        assert_eq!(
            coordinator.registry().total_balance().unwrap(),
            Decimal::new(2100, 0)
        );
    }
}
