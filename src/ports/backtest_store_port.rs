//! Persistence of prior backtest summaries keyed by (symbol, strategy).

use crate::domain::error::StratscopeError;
use crate::domain::metrics::PerformanceSummary;

pub trait BacktestStorePort: Send + Sync {
    fn save_result(
        &self,
        symbol: &str,
        strategy: &str,
        summary: &PerformanceSummary,
    ) -> Result<(), StratscopeError>;

    /// Most recently saved summary for the pair.
    fn latest_result(
        &self,
        symbol: &str,
        strategy: &str,
    ) -> Result<Option<PerformanceSummary>, StratscopeError>;
}
