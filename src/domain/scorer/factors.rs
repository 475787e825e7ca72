//! Sub-score rules. Each maps a raw metric linearly into [0, 1] and returns
//! `NEUTRAL_SCORE` when its inputs are insufficient.

use crate::domain::indicator::stddev::sample_stddev;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::news::{NewsItem, mean_sentiment};
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::StrategyKind;

pub const NEUTRAL_SCORE: f64 = 0.5;

/// Item count at which the news-volume score saturates.
pub const NEWS_VOLUME_SATURATION: f64 = 10.0;

pub const VOLATILITY_WINDOW: usize = 20;
pub const LOW_VOLATILITY: f64 = 0.15;
pub const HIGH_VOLATILITY: f64 = 0.30;

const VOLUME_LOOKBACK: usize = 20;
const RELATIVE_LOOKBACK: usize = 20;

/// Rescales, clamps into [0, 1] and maps NaN to neutral.
pub fn clip01(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL_SCORE
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn trailing_return(bars: &[PriceBar], lookback: usize) -> Option<f64> {
    let n = bars.len();
    if n <= lookback {
        return None;
    }
    let base = bars[n - 1 - lookback].close;
    if base <= 0.0 {
        return None;
    }
    Some(bars[n - 1].close / base - 1.0)
}

pub fn news_sentiment_score(news: &[NewsItem]) -> f64 {
    mean_sentiment(news)
        .map(|s| clip01((s + 1.0) / 2.0))
        .unwrap_or(NEUTRAL_SCORE)
}

pub fn news_volume_score(news: &[NewsItem]) -> f64 {
    clip01(news.len() as f64 / NEWS_VOLUME_SATURATION)
}

/// Weighted 5/10/20-bar return; -5% maps to 0 and +5% to 1.
pub fn price_momentum_score(bars: &[PriceBar]) -> f64 {
    let returns = (
        trailing_return(bars, 5),
        trailing_return(bars, 10),
        trailing_return(bars, 20),
    );
    match returns {
        (Some(r5), Some(r10), Some(r20)) => {
            let weighted = 0.5 * r5 + 0.3 * r10 + 0.2 * r20;
            clip01((weighted + 0.05) / 0.1)
        }
        _ => NEUTRAL_SCORE,
    }
}

/// Last bar's volume against the mean of the 20 before it; a ratio of 0.5
/// maps to 0 and 3.0 to 1.
pub fn volume_anomaly_score(bars: &[PriceBar]) -> f64 {
    let n = bars.len();
    if n <= VOLUME_LOOKBACK {
        return NEUTRAL_SCORE;
    }
    let prior = &bars[n - 1 - VOLUME_LOOKBACK..n - 1];
    let mean = prior.iter().map(|b| b.volume as f64).sum::<f64>() / VOLUME_LOOKBACK as f64;
    if mean <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let ratio = bars[n - 1].volume as f64 / mean;
    clip01((ratio - 0.5) / 2.5)
}

/// 20-bar return relative to a benchmark; -5% maps to 0 and +5% to 1.
pub fn sector_relative_score(bars: &[PriceBar], benchmark: Option<&[PriceBar]>) -> f64 {
    let Some(benchmark) = benchmark else {
        return NEUTRAL_SCORE;
    };
    match (
        trailing_return(bars, RELATIVE_LOOKBACK),
        trailing_return(benchmark, RELATIVE_LOOKBACK),
    ) {
        (Some(own), Some(bench)) => clip01((own - bench + 0.05) / 0.1),
        _ => NEUTRAL_SCORE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolatilityRegime {
    Low,
    Medium,
    High,
}

impl VolatilityRegime {
    pub fn classify(annualized_volatility: f64) -> Self {
        if annualized_volatility < LOW_VOLATILITY {
            VolatilityRegime::Low
        } else if annualized_volatility > HIGH_VOLATILITY {
            VolatilityRegime::High
        } else {
            VolatilityRegime::Medium
        }
    }
}

/// Sample stdev of the last 20 daily returns, annualized with sqrt(252).
pub fn annualized_volatility(bars: &[PriceBar]) -> Option<f64> {
    let n = bars.len();
    if n <= VOLATILITY_WINDOW {
        return None;
    }
    let returns: Vec<f64> = bars[n - 1 - VOLATILITY_WINDOW..]
        .windows(2)
        .filter(|w| w[0].close > 0.0)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    sample_stddev(&returns).map(|sd| sd * 252.0_f64.sqrt())
}

/// How well a strategy suits each volatility regime. Strategies without an
/// entry score neutral in every regime.
pub fn regime_compatibility(strategy: &str, regime: VolatilityRegime) -> f64 {
    let (low, medium, high) = match StrategyKind::lookup(strategy) {
        Some(StrategyKind::Momentum) => (0.4, 0.7, 0.8),
        Some(StrategyKind::TrendFollowing) => (0.5, 0.8, 0.6),
        Some(StrategyKind::Breakout) => (0.2, 0.6, 0.9),
        Some(StrategyKind::MeanReversion) => (0.8, 0.7, 0.3),
        Some(StrategyKind::MacdCrossover) => (0.4, 0.7, 0.7),
        Some(StrategyKind::RsiOscillator) => (0.7, 0.7, 0.4),
        Some(StrategyKind::SmaCrossover) | None => (0.5, 0.5, 0.5),
    };
    match regime {
        VolatilityRegime::Low => low,
        VolatilityRegime::Medium => medium,
        VolatilityRegime::High => high,
    }
}

pub fn volatility_regime_score(strategy: &str, bars: &[PriceBar]) -> f64 {
    annualized_volatility(bars)
        .map(|vol| regime_compatibility(strategy, VolatilityRegime::classify(vol)))
        .unwrap_or(NEUTRAL_SCORE)
}

/// Quality of the most recent prior backtest: Sharpe saturates at 2, profit
/// factor at 3.
pub fn prev_backtest_score(prior: Option<&PerformanceSummary>) -> f64 {
    let Some(p) = prior else {
        return NEUTRAL_SCORE;
    };
    if p.total_trades == 0 {
        return NEUTRAL_SCORE;
    }
    let sharpe = clip01(p.sharpe / 2.0);
    let win_rate = clip01(p.win_rate_pct / 100.0);
    let profit = clip01(p.profit_factor / 3.0);
    clip01(0.4 * sharpe + 0.3 * win_rate + 0.3 * profit)
}
