//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorId, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_sma(bars: &[PriceBar], window: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    IndicatorSeries {
        indicator: IndicatorId::Sma(window),
        values: rolling_mean(&closes, window),
    }
}

/// Trailing rolling mean; entries before the window fills are `None`.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    let mut window_sum: f64 = values[..window].iter().sum();
    out[window - 1] = Some(window_sum / window as f64);
    for i in window..values.len() {
        window_sum += values[i] - values[i - window];
        out[i] = Some(window_sum / window as f64);
    }
    out
}
