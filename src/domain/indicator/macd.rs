//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9. Every EMA is seeded with
//! its first input, so all three lines are defined from the first bar.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorId, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdLines {
    pub macd: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(bars: &[PriceBar], fast: usize, slow: usize, signal: usize) -> MacdLines {
    if bars.is_empty() || fast == 0 || slow == 0 || signal == 0 {
        return MacdLines {
            macd: IndicatorSeries::undefined(IndicatorId::Macd, bars.len()),
            signal: IndicatorSeries::undefined(IndicatorId::MacdSignal, bars.len()),
            histogram: IndicatorSeries::undefined(IndicatorId::MacdHistogram, bars.len()),
        };
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal);
    let histogram: Vec<f64> = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(m, s)| m - s)
        .collect();

    MacdLines {
        macd: defined(IndicatorId::Macd, macd_line),
        signal: defined(IndicatorId::MacdSignal, signal_line),
        histogram: defined(IndicatorId::MacdHistogram, histogram),
    }
}

fn defined(indicator: IndicatorId, values: Vec<f64>) -> IndicatorSeries {
    IndicatorSeries {
        indicator,
        values: values.into_iter().map(Some).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{MACD_FAST, MACD_SIGNAL, MACD_SLOW};
    use chrono::NaiveDate;

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

    #[test]
    fn macd_first_bar_is_zero() {
        let lines = calculate_macd(&make_bars(&[10.0, 11.0, 12.0]), 12, 26, 9);
        assert_eq!(lines.macd.values[0], Some(0.0));
        assert_eq!(lines.signal.values[0], Some(0.0));
        assert_eq!(lines.histogram.values[0], Some(0.0));
    }

    #[test]
    fn macd_positive_in_uptrend() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let lines = calculate_macd(&make_bars(&prices), MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let last = lines.macd.values[59].unwrap();
        assert!(last > 0.0);
        // Signal lags MACD in a steady trend.
        assert!(lines.histogram.values[59].unwrap() > 0.0);
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + ((i * 3) % 7) as f64).collect();
        let lines = calculate_macd(&make_bars(&prices), MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        for i in 0..40 {
            let m = lines.macd.values[i].unwrap();
            let s = lines.signal.values[i].unwrap();
            let h = lines.histogram.values[i].unwrap();
            assert!((h - (m - s)).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_invalid_params_are_undefined() {
        let lines = calculate_macd(&make_bars(&[10.0, 11.0]), 0, 26, 9);
        assert!(lines.macd.values.iter().all(Option::is_none));
        assert_eq!(lines.signal.values.len(), 2);
    }
}
