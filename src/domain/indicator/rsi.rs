//! RSI (Relative Strength Index).
//!
//! Average gain/loss are plain rolling means over the last n close-to-close
//! deltas (no Wilder smoothing).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, including a perfectly flat window.
//!
//! Warmup: first n bars are undefined (n deltas are needed).

use crate::domain::indicator::{IndicatorId, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values = vec![None; bars.len()];
    if period == 0 || bars.len() <= period {
        return IndicatorSeries {
            indicator: IndicatorId::Rsi(period),
            values,
        };
    }

    // gains[j] / losses[j] hold the delta between bar j and bar j+1.
    let mut gains = Vec::with_capacity(bars.len() - 1);
    let mut losses = Vec::with_capacity(bars.len() - 1);
    for w in bars.windows(2) {
        let change = w[1].close - w[0].close;
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    for (i, value) in values.iter_mut().enumerate().skip(period) {
        // Window covers the `period` deltas ending at bar i.
        let window = (i - period)..i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;
        *value = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    IndicatorSeries {
        indicator: IndicatorId::Rsi(period),
        values,
    }
}

/// Saturates to 100 when there were no losses in the window.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14);
        assert!(series.values.is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (0..16).map(|i| 100.0 + (i % 5) as f64 * 2.0).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);

        for i in 0..14 {
            assert!(series.values[i].is_none(), "bar {} should be undefined", i);
        }
        assert!(series.values[14].is_some());
        assert!(series.values[15].is_some());
    }

    #[test]
    fn rsi_needs_period_plus_one_bars() {
        let prices: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert!(series.values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_flat_series_saturates_to_100() {
        let series = calculate_rsi(&make_bars(&[50.0; 30]), 14);
        for value in series.values.iter().skip(14) {
            assert_eq!(*value, Some(100.0));
        }
    }

    #[test]
    fn rsi_all_gains() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert_eq!(series.values[19], Some(100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert!(series.values[19].unwrap().abs() < 1e-9);
    }

    #[test]
    fn rsi_rolling_mean_known_value() {
        // Deltas over the window: +1 x 2, -1 x 1 with period 3.
        let series = calculate_rsi(&make_bars(&[10.0, 11.0, 12.0, 11.0]), 3);
        let avg_gain = 2.0 / 3.0;
        let avg_loss = 1.0 / 3.0;
        let expected = 100.0 - 100.0 / (1.0 + avg_gain / avg_loss);
        assert!((series.values[3].unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn rsi_window_rolls_off_old_deltas() {
        // The single loss leaves the 2-delta window after two more gains.
        let series = calculate_rsi(&make_bars(&[10.0, 9.0, 10.0, 11.0]), 2);
        assert!(series.values[2].unwrap() < 100.0);
        assert_eq!(series.values[3], Some(100.0));
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=40)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        for value in series.values.iter().flatten() {
            assert!((0.0..=100.0).contains(value), "RSI {} out of range", value);
        }
    }
}
