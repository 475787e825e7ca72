//! Indicator bank: computes a requested set of indicator columns for one
//! price series.

use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    calculate_stddev, IndicatorId, IndicatorSet, BOLLINGER_PERIOD, BOLLINGER_STDDEV_MULT,
    MACD_FAST, MACD_SIGNAL, MACD_SLOW,
};
use crate::domain::ohlcv::PriceBar;
use std::collections::BTreeSet;

/// Pure function of `bars`; repeated calls give bit-identical columns.
/// Multi-line indicators (MACD, Bollinger) are computed once even when
/// several of their lines are requested.
pub fn compute_indicators(bars: &[PriceBar], requested: &[IndicatorId]) -> IndicatorSet {
    let mut set = IndicatorSet::new(bars.len());
    let wanted: BTreeSet<IndicatorId> = requested.iter().copied().collect();

    let wants_macd = wanted.iter().any(|id| {
        matches!(
            id,
            IndicatorId::Macd | IndicatorId::MacdSignal | IndicatorId::MacdHistogram
        )
    });
    let wants_bands = wanted.iter().any(|id| {
        matches!(
            id,
            IndicatorId::BbUpper | IndicatorId::BbMiddle | IndicatorId::BbLower
        )
    });

    for id in &wanted {
        match *id {
            IndicatorId::Sma(window) => {
                set.insert(calculate_sma(bars, window));
            }
            IndicatorId::Ema(span) => {
                set.insert(calculate_ema(bars, span));
            }
            IndicatorId::Rsi(period) => {
                set.insert(calculate_rsi(bars, period));
            }
            IndicatorId::StdDev(window) => {
                set.insert(calculate_stddev(bars, window));
            }
            _ => {}
        }
    }

    if wants_macd {
        let lines = calculate_macd(bars, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        for series in [lines.macd, lines.signal, lines.histogram] {
            if wanted.contains(&series.indicator) {
                set.insert(series);
            }
        }
    }

    if wants_bands {
        let bands = calculate_bollinger(bars, BOLLINGER_PERIOD, BOLLINGER_STDDEV_MULT);
        for series in [bands.upper, bands.middle, bands.lower] {
            if wanted.contains(&series.indicator) {
                set.insert(series);
            }
        }
    }

    log::debug!(
        "computed {} indicator columns over {} bars",
        wanted.len(),
        bars.len()
    );
    set
}

/// Longest warm-up (in bars) before every requested column is defined.
pub fn warmup_bars(requested: &[IndicatorId]) -> usize {
    requested
        .iter()
        .map(|id| match *id {
            IndicatorId::Sma(window) | IndicatorId::StdDev(window) => window.saturating_sub(1),
            IndicatorId::Rsi(period) => period,
            IndicatorId::BbUpper | IndicatorId::BbMiddle | IndicatorId::BbLower => {
                BOLLINGER_PERIOD - 1
            }
            IndicatorId::Ema(_)
            | IndicatorId::Macd
            | IndicatorId::MacdSignal
            | IndicatorId::MacdHistogram => 0,
        })
        .max()
        .unwrap_or(0)
}
