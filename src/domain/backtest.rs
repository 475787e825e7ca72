//! Backtest pipeline for one (symbol, strategy) pair: indicators, signals,
//! trades, performance.
//!
//! BacktestConfig carries the run parameters shared by every pair in a batch.

use crate::domain::indicator_helpers::compute_indicators;
use crate::domain::metrics::{
    PerformanceConfig, PerformanceResult, SharpeMode, calculate_performance,
};
use crate::domain::ohlcv::{PriceBar, is_strictly_ascending, normalize_series};
use crate::domain::signal::{SignalSeries, generate_signals_for};
use crate::domain::strategy::StrategyKind;
use crate::domain::trade::{ExtractionOptions, Trade, extract_trades};
use chrono::NaiveDate;
use rayon::prelude::*;

/// Fewest bars a series needs before it is backtested at all.
pub const DEFAULT_MIN_BARS: usize = 30;

#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub min_bars: usize,
    pub close_open_position: bool,
    pub sharpe_mode: SharpeMode,
}

impl BacktestConfig {
    pub fn performance_config(&self) -> PerformanceConfig {
        PerformanceConfig {
            initial_capital: self.initial_capital,
            sharpe_mode: self.sharpe_mode,
        }
    }

    pub fn extraction_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            close_open_position: self.close_open_position,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub symbol: String,
    pub strategy: String,
    pub bars_used: usize,
    pub signals: SignalSeries,
    pub trades: Vec<Trade>,
    /// `None` when the series was too short or no trade closed.
    pub performance: Option<PerformanceResult>,
}

impl BacktestRun {
    fn empty(symbol: &str, strategy: &str, bars_used: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
            bars_used,
            signals: SignalSeries::default(),
            trades: Vec::new(),
            performance: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BacktestRequest {
    pub symbol: String,
    pub strategy: String,
    pub bars: Vec<PriceBar>,
}

/// Runs the full pipeline over the bars inside the configured date range.
pub fn run_backtest(bars: &[PriceBar], strategy_name: &str, config: &BacktestConfig) -> BacktestRun {
    let symbol = bars.first().map(|b| b.symbol.as_str()).unwrap_or_default();

    let mut window: Vec<PriceBar> = bars
        .iter()
        .filter(|b| b.date >= config.start_date && b.date <= config.end_date)
        .cloned()
        .collect();
    if !is_strictly_ascending(&window) {
        log::warn!("{symbol}: price series out of order or duplicated; normalizing");
        window = normalize_series(window);
    }

    if window.len() < config.min_bars {
        log::warn!(
            "{symbol}/{strategy_name}: {} bars in range, need {}; skipping",
            window.len(),
            config.min_bars
        );
        return BacktestRun::empty(symbol, strategy_name, window.len());
    }

    let kind = StrategyKind::from_name(strategy_name);
    let indicators = compute_indicators(&window, kind.required_indicators());
    let signals = generate_signals_for(kind, &window, &indicators);
    if signals.is_empty() {
        log::debug!("{symbol}/{strategy_name}: no bars with defined indicators");
        return BacktestRun::empty(symbol, strategy_name, window.len());
    }

    let trades = extract_trades(&signals, config.extraction_options());
    let performance = calculate_performance(&trades, &config.performance_config());
    log::debug!(
        "{symbol}/{strategy_name}: {} bars, {} signals, {} trades",
        window.len(),
        signals.len(),
        trades.len()
    );

    BacktestRun {
        symbol: symbol.to_string(),
        strategy: strategy_name.to_string(),
        bars_used: window.len(),
        signals,
        trades,
        performance,
    }
}

/// Runs independent pairs, in parallel when asked. Output order matches
/// `requests`.
pub fn run_batch(
    requests: &[BacktestRequest],
    config: &BacktestConfig,
    parallel: bool,
) -> Vec<BacktestRun> {
    log::info!(
        "running {} backtests ({})",
        requests.len(),
        if parallel { "parallel" } else { "sequential" }
    );
    let run_one = |req: &BacktestRequest| {
        let mut run = run_backtest(&req.bars, &req.strategy, config);
        if run.symbol.is_empty() {
            run.symbol = req.symbol.clone();
        }
        run
    };
    if parallel {
        requests.par_iter().map(run_one).collect()
    } else {
        requests.iter().map(run_one).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BacktestConfig {
        BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            initial_capital: 10_000.0,
            min_bars: DEFAULT_MIN_BARS,
            close_open_position: false,
            sharpe_mode: SharpeMode::FixedHoldingPeriod,
        }
    }

    fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                symbol: "TEST".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }

    fn zigzag(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| 100.0 + 10.0 * ((i as f64) * std::f64::consts::PI / 15.0).sin())
            .collect()
    }

    #[test]
    fn short_series_yields_no_result() {
        let run = run_backtest(&make_bars(&[100.0; 10]), "Momentum", &sample_config());
        assert_eq!(run.bars_used, 10);
        assert!(run.trades.is_empty());
        assert!(run.performance.is_none());
        assert_eq!(run.symbol, "TEST");
    }

    #[test]
    fn empty_series() {
        let run = run_backtest(&[], "Momentum", &sample_config());
        assert_eq!(run.bars_used, 0);
        assert!(run.performance.is_none());
    }

    #[test]
    fn cyclical_prices_produce_trades() {
        let run = run_backtest(&make_bars(&zigzag(120)), "Momentum", &sample_config());
        assert!(!run.trades.is_empty());
        let perf = run.performance.unwrap();
        assert_eq!(perf.total_trades, run.trades.len());
        assert!(perf.max_drawdown_pct <= 0.0);
    }

    #[test]
    fn sma200_never_warms_up_on_short_series() {
        let run = run_backtest(&make_bars(&zigzag(120)), "Trend Following", &sample_config());
        assert!(run.signals.is_empty());
        assert!(run.performance.is_none());
    }

    #[test]
    fn date_range_filters_bars() {
        let config = BacktestConfig {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 11).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
            ..sample_config()
        };
        let run = run_backtest(&make_bars(&zigzag(120)), "Momentum", &config);
        assert_eq!(run.bars_used, 30);
    }

    #[test]
    fn unordered_input_is_normalized() {
        let mut bars = make_bars(&zigzag(60));
        bars.reverse();
        let run = run_backtest(&bars, "MACD Crossover", &sample_config());
        assert_eq!(run.bars_used, 60);
        assert!(run.signals.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn batch_preserves_order_in_parallel() {
        let requests: Vec<BacktestRequest> = ["Momentum", "Breakout", "MACD Crossover"]
            .iter()
            .map(|s| BacktestRequest {
                symbol: "TEST".into(),
                strategy: s.to_string(),
                bars: make_bars(&zigzag(90)),
            })
            .collect();
        let sequential = run_batch(&requests, &sample_config(), false);
        let parallel = run_batch(&requests, &sample_config(), true);
        assert_eq!(sequential.len(), 3);
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.strategy, b.strategy);
            assert_eq!(a.trades, b.trades);
        }
        assert_eq!(parallel[1].strategy, "Breakout");
    }

    #[test]
    fn batch_keeps_symbol_for_empty_series() {
        let requests = vec![BacktestRequest {
            symbol: "EMPTY".into(),
            strategy: "Momentum".into(),
            bars: vec![],
        }];
        let runs = run_batch(&requests, &sample_config(), false);
        assert_eq!(runs[0].symbol, "EMPTY");
    }
}
