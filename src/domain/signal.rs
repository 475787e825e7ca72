//! Signal generation: maps a strategy and its indicator columns to a
//! per-bar discrete position signal.
//!
//! Rules are plain functions registered per `StrategyKind` in `RULES`.
//! Bars where any required indicator is still undefined are dropped, so the
//! output series is aligned 1:1 with the filtered price series.

use crate::domain::indicator::{IndicatorId, IndicatorSet};
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::{RSI_OVERBOUGHT, RSI_OVERSOLD, StrategyKind};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Short,
    Neutral,
    Long,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Short => -1,
            Signal::Neutral => 0,
            Signal::Long => 1,
        }
    }

    pub fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Signal::Short),
            0 => Some(Signal::Neutral),
            1 => Some(Signal::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> Vec<i8> {
        self.points.iter().map(|p| p.signal.value()).collect()
    }

    /// Builds a series directly from (date, close, signal) rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (NaiveDate, f64, Signal)>) -> Self {
        Self {
            points: rows
                .into_iter()
                .map(|(date, close, signal)| SignalPoint {
                    date,
                    close,
                    signal,
                })
                .collect(),
        }
    }
}

/// Inputs visible to a rule for one bar. Only built for bars whose required
/// indicators are all defined.
pub struct BarInputs<'a> {
    pub close: f64,
    indicators: &'a IndicatorSet,
    index: usize,
}

impl BarInputs<'_> {
    pub fn get(&self, id: IndicatorId) -> f64 {
        self.indicators.get(id, self.index).unwrap_or(f64::NAN)
    }
}

pub type SignalRule = fn(&BarInputs<'_>) -> Signal;

pub const RULES: &[(StrategyKind, SignalRule)] = &[
    (StrategyKind::Momentum, momentum),
    (StrategyKind::TrendFollowing, trend_following),
    (StrategyKind::Breakout, breakout),
    (StrategyKind::MeanReversion, mean_reversion),
    (StrategyKind::MacdCrossover, macd_crossover),
    (StrategyKind::RsiOscillator, rsi_oscillator),
    (StrategyKind::SmaCrossover, sma_crossover),
];

pub fn rule_for(kind: StrategyKind) -> SignalRule {
    RULES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, rule)| *rule)
        .unwrap_or(sma_crossover)
}

/// Resolves `strategy_name` against the catalog and generates its signals.
pub fn generate_signals(
    strategy_name: &str,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
) -> SignalSeries {
    generate_signals_for(StrategyKind::from_name(strategy_name), bars, indicators)
}

pub fn generate_signals_for(
    kind: StrategyKind,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
) -> SignalSeries {
    if indicators.len() != bars.len() {
        log::warn!(
            "indicator set covers {} bars but price series has {}; no signals generated",
            indicators.len(),
            bars.len()
        );
        return SignalSeries::default();
    }

    let required = kind.required_indicators();
    let rule = rule_for(kind);

    let points = bars
        .iter()
        .enumerate()
        .filter(|(i, _)| indicators.all_defined(required, *i))
        .map(|(index, bar)| {
            let inputs = BarInputs {
                close: bar.close,
                indicators,
                index,
            };
            SignalPoint {
                date: bar.date,
                close: bar.close,
                signal: rule(&inputs),
            }
        })
        .collect();

    SignalSeries { points }
}

fn long_short(long: bool, short: bool) -> Signal {
    if short {
        Signal::Short
    } else if long {
        Signal::Long
    } else {
        Signal::Neutral
    }
}

fn momentum(bar: &BarInputs<'_>) -> Signal {
    let sma20 = bar.get(IndicatorId::Sma(20));
    long_short(bar.close > sma20, bar.close < sma20)
}

fn trend_following(bar: &BarInputs<'_>) -> Signal {
    let sma20 = bar.get(IndicatorId::Sma(20));
    let sma50 = bar.get(IndicatorId::Sma(50));
    let sma200 = bar.get(IndicatorId::Sma(200));
    long_short(
        sma20 > sma50 && bar.close > sma200,
        sma20 < sma50 || bar.close < sma200,
    )
}

fn breakout(bar: &BarInputs<'_>) -> Signal {
    let upper = bar.get(IndicatorId::BbUpper);
    let lower = bar.get(IndicatorId::BbLower);
    long_short(bar.close > upper, bar.close < lower)
}

fn mean_reversion(bar: &BarInputs<'_>) -> Signal {
    let upper = bar.get(IndicatorId::BbUpper);
    let lower = bar.get(IndicatorId::BbLower);
    long_short(bar.close < lower, bar.close > upper)
}

fn macd_crossover(bar: &BarInputs<'_>) -> Signal {
    let macd = bar.get(IndicatorId::Macd);
    let signal = bar.get(IndicatorId::MacdSignal);
    long_short(macd > signal, macd < signal)
}

fn rsi_oscillator(bar: &BarInputs<'_>) -> Signal {
    let rsi = bar.get(IndicatorId::Rsi(14));
    long_short(rsi < RSI_OVERSOLD, rsi > RSI_OVERBOUGHT)
}

fn sma_crossover(bar: &BarInputs<'_>) -> Signal {
    let sma20 = bar.get(IndicatorId::Sma(20));
    let sma50 = bar.get(IndicatorId::Sma(50));
    long_short(sma20 > sma50, sma20 < sma50)
}
