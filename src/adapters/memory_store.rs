//! In-process backtest summary store.

use crate::domain::error::StratscopeError;
use crate::domain::metrics::PerformanceSummary;
use crate::ports::backtest_store_port::BacktestStorePort;
use dashmap::DashMap;

/// Keeps the latest summary per (symbol, strategy) for the life of the process.
#[derive(Default)]
pub struct MemoryBacktestStore {
    results: DashMap<(String, String), PerformanceSummary>,
}

impl MemoryBacktestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BacktestStorePort for MemoryBacktestStore {
    fn save_result(
        &self,
        symbol: &str,
        strategy: &str,
        summary: &PerformanceSummary,
    ) -> Result<(), StratscopeError> {
        self.results
            .insert((symbol.to_string(), strategy.to_string()), summary.clone());
        Ok(())
    }

    fn latest_result(
        &self,
        symbol: &str,
        strategy: &str,
    ) -> Result<Option<PerformanceSummary>, StratscopeError> {
        Ok(self
            .results
            .get(&(symbol.to_string(), strategy.to_string()))
            .map(|entry| entry.value().clone()))
    }
}
