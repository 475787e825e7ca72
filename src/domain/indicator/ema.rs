//! Exponential Moving Average.
//!
//! k = 2/(span+1), seeded with the first close, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). No bias adjustment, so every bar is
//! defined from index 0.

use crate::domain::indicator::{IndicatorId, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_ema(bars: &[PriceBar], span: usize) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = if span == 0 {
        vec![None; bars.len()]
    } else {
        ema_values(&closes, span).into_iter().map(Some).collect()
    };

    IndicatorSeries {
        indicator: IndicatorId::Ema(span),
        values,
    }
}

pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = first;
    out.push(ema);
    for &value in &values[1..] {
        ema = value * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}
