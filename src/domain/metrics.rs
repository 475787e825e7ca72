//! Performance metrics over a closed trade list.
//!
//! The statistics are deliberately simple: Sharpe is computed on per-trade
//! returns and annualized with a fixed holding-period assumption, and the
//! equity curve compounds the initial capital trade by trade.

use super::trade::Trade;
use chrono::NaiveDate;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Holding period (bars) assumed by the fixed Sharpe annualization.
pub const ASSUMED_HOLDING_PERIOD: f64 = 20.0;

/// Reported when there is no gross loss but at least one win. Keeps ranking
/// inputs finite; a true ratio would be infinite.
pub const PROFIT_FACTOR_FALLBACK: f64 = 2.0;

/// Stands in for the return stdev when it is undefined (fewer than two
/// trades) or zero, so Sharpe stays finite.
pub const STDEV_FLOOR: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharpeMode {
    /// `sqrt(252 / 20)` regardless of how long trades were actually held.
    #[default]
    FixedHoldingPeriod,
    /// `sqrt(252 / max(avg holding days, 1))`.
    AverageHoldingPeriod,
}

impl SharpeMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Some(SharpeMode::FixedHoldingPeriod),
            "holding_period" => Some(SharpeMode::AverageHoldingPeriod),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SharpeMode::FixedHoldingPeriod => "fixed",
            SharpeMode::AverageHoldingPeriod => "holding_period",
        }
    }

    fn annualization(&self, avg_holding_days: f64) -> f64 {
        match self {
            SharpeMode::FixedHoldingPeriod => (TRADING_DAYS_PER_YEAR / ASSUMED_HOLDING_PERIOD).sqrt(),
            SharpeMode::AverageHoldingPeriod => {
                (TRADING_DAYS_PER_YEAR / avg_holding_days.max(1.0)).sqrt()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceConfig {
    pub initial_capital: f64,
    pub sharpe_mode: SharpeMode,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            sharpe_mode: SharpeMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceResult {
    pub sharpe: f64,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    /// Non-positive; the magnitude is the largest peak-to-trough decline.
    pub max_drawdown_pct: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub total_return_pct: f64,
    pub avg_trade_pct: f64,
    pub best_trade_pct: f64,
    pub worst_trade_pct: f64,
    pub avg_holding_days: f64,
    pub final_equity: f64,
}

/// The scalar part of a result, as persisted and fed back into scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub sharpe: f64,
    pub win_rate_pct: f64,
    pub profit_factor: f64,
    pub max_drawdown_pct: f64,
    pub total_trades: usize,
    pub total_return_pct: f64,
}

impl PerformanceResult {
    pub fn summary(&self) -> PerformanceSummary {
        PerformanceSummary {
            sharpe: self.sharpe,
            win_rate_pct: self.win_rate_pct,
            profit_factor: self.profit_factor,
            max_drawdown_pct: self.max_drawdown_pct,
            total_trades: self.total_trades,
            total_return_pct: self.total_return_pct,
        }
    }
}

/// Returns `None` for an empty trade list: no trades means "not evaluated",
/// not zeroed metrics.
pub fn calculate_performance(
    trades: &[Trade],
    config: &PerformanceConfig,
) -> Option<PerformanceResult> {
    if trades.is_empty() {
        return None;
    }

    let total_trades = trades.len();
    let n = total_trades as f64;

    let winning_trades = trades.iter().filter(|t| t.pnl_percent > 0.0).count();
    let losing_trades = trades.iter().filter(|t| t.pnl_percent < 0.0).count();
    let win_rate_pct = 100.0 * winning_trades as f64 / n;

    let gross_profit: f64 = trades
        .iter()
        .map(|t| t.pnl_percent)
        .filter(|p| *p > 0.0)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .map(|t| t.pnl_percent)
        .filter(|p| *p < 0.0)
        .sum();
    let profit_factor = profit_factor(gross_profit, gross_loss, winning_trades);

    let returns: Vec<f64> = trades.iter().map(Trade::return_fraction).collect();
    let mean_return = returns.iter().sum::<f64>() / n;
    let std_return = return_stdev(&returns, mean_return);
    let avg_holding_days =
        trades.iter().map(|t| t.holding_period_days as f64).sum::<f64>() / n;
    let sharpe = (mean_return / std_return) * config.sharpe_mode.annualization(avg_holding_days);

    let equity_curve = build_equity_curve(trades, config.initial_capital);
    let max_drawdown_pct = max_drawdown(&equity_curve, config.initial_capital);
    let final_equity = equity_curve
        .last()
        .map(|p| p.equity)
        .unwrap_or(config.initial_capital);
    let total_return_pct = if config.initial_capital > 0.0 {
        (final_equity / config.initial_capital - 1.0) * 100.0
    } else {
        0.0
    };

    let pnls = trades.iter().map(|t| t.pnl_percent);
    let best_trade_pct = pnls.clone().fold(f64::NEG_INFINITY, f64::max);
    let worst_trade_pct = pnls.clone().fold(f64::INFINITY, f64::min);
    let avg_trade_pct = pnls.sum::<f64>() / n;

    Some(PerformanceResult {
        sharpe,
        win_rate_pct,
        profit_factor,
        max_drawdown_pct,
        trades: trades.to_vec(),
        equity_curve,
        total_trades,
        winning_trades,
        losing_trades,
        total_return_pct,
        avg_trade_pct,
        best_trade_pct,
        worst_trade_pct,
        avg_holding_days,
        final_equity,
    })
}

fn profit_factor(gross_profit: f64, gross_loss: f64, winning_trades: usize) -> f64 {
    if gross_loss < 0.0 {
        gross_profit / gross_loss.abs()
    } else if winning_trades > 0 {
        PROFIT_FACTOR_FALLBACK
    } else {
        0.0
    }
}

fn return_stdev(returns: &[f64], mean: f64) -> f64 {
    if returns.len() < 2 {
        return STDEV_FLOOR;
    }
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (returns.len() - 1) as f64;
    let stdev = variance.sqrt();
    if stdev > 0.0 { stdev } else { STDEV_FLOOR }
}

/// Two samples per trade: equity at entry, then equity compounded by the
/// trade's return at exit.
pub fn build_equity_curve(trades: &[Trade], initial_capital: f64) -> Vec<EquityPoint> {
    let mut equity = initial_capital;
    let mut curve = Vec::with_capacity(trades.len() * 2);
    for trade in trades {
        curve.push(EquityPoint {
            date: trade.entry_date,
            equity,
        });
        equity *= 1.0 + trade.return_fraction();
        curve.push(EquityPoint {
            date: trade.exit_date,
            equity,
        });
    }
    curve
}

/// Largest peak-to-trough decline in percent, returned as a non-positive
/// number. The running peak starts at the initial capital.
pub fn max_drawdown(curve: &[EquityPoint], initial_capital: f64) -> f64 {
    let mut peak = initial_capital;
    let mut max_dd = 0.0_f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    if max_dd > 0.0 { -max_dd } else { 0.0 }
}
