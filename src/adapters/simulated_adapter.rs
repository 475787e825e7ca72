//! Deterministic synthetic price source.
//!
//! Produces a geometric random walk, one bar per weekday, seeded from the
//! symbol so repeated runs see the same series.

use crate::domain::error::StratscopeError;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::PriceDataPort;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DAILY_DRIFT: f64 = 0.0003;
const DAILY_VOLATILITY: f64 = 0.018;

pub struct SimulatedAdapter {
    symbols: Vec<String>,
}

impl SimulatedAdapter {
    pub fn new(symbols: Vec<String>) -> Self {
        Self { symbols }
    }

    pub fn generate(symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> Vec<PriceBar> {
        let seed = symbol_seed(symbol);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut close = 20.0 + (seed % 180) as f64;
        let mut bars = Vec::new();

        for date in start_date.iter_days().take_while(|d| *d <= end_date) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let open = close;
            let shock = standard_normal(&mut rng);
            close = (open * (DAILY_DRIFT + DAILY_VOLATILITY * shock).exp()).max(0.01);
            let wick_up = rng.gen_range(0.0..0.01);
            let wick_down = rng.gen_range(0.0..0.01);
            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open,
                high: open.max(close) * (1.0 + wick_up),
                low: open.min(close) * (1.0 - wick_down),
                close,
                volume: rng.gen_range(200_000..5_000_000),
            });
        }
        bars
    }
}

/// FNV-1a over the symbol bytes.
fn symbol_seed(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Box-Muller transform.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

impl PriceDataPort for SimulatedAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratscopeError> {
        Ok(Self::generate(symbol, start_date, end_date))
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratscopeError> {
        Ok(self.symbols.clone())
    }

    fn get_data_range(
        &self,
        _symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratscopeError> {
        Ok(None)
    }
}
