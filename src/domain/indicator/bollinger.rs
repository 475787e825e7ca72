//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the rolling sample standard deviation (divides by N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::stddev::rolling_sample_stddev;
use crate::domain::indicator::{IndicatorId, IndicatorSeries};
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn calculate_bollinger(bars: &[PriceBar], period: usize, mult: f64) -> BollingerBands {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let middle = rolling_mean(&closes, period);
    let stddev = rolling_sample_stddev(&closes, period);

    let band = |sign: f64| -> Vec<Option<f64>> {
        middle
            .iter()
            .zip(&stddev)
            .map(|(m, s)| Some((*m)? + sign * mult * (*s)?))
            .collect()
    };

    BollingerBands {
        upper: IndicatorSeries {
            indicator: IndicatorId::BbUpper,
            values: band(1.0),
        },
        lower: IndicatorSeries {
            indicator: IndicatorId::BbLower,
            values: band(-1.0),
        },
        middle: IndicatorSeries {
            indicator: IndicatorId::BbMiddle,
            values: middle,
        },
    }
}
