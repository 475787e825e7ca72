//! Technical indicator implementations.
//!
//! This module provides the types shared between indicator computation and
//! signal generation:
//! - `IndicatorId`: closed identifier for every indicator column
//! - `IndicatorSeries`: one computed column aligned to a price series
//! - `IndicatorSet`: all computed columns for a price series, same length
//!
//! Undefined (warm-up) entries are `None`.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

use std::collections::HashMap;
use std::fmt;

pub use bollinger::calculate_bollinger;
pub use ema::{calculate_ema, ema_values};
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STDDEV_MULT: f64 = 2.0;
pub const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorId {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    StdDev(usize),
    Macd,
    MacdSignal,
    MacdHistogram,
    BbUpper,
    BbMiddle,
    BbLower,
}

impl IndicatorId {
    /// Parses a legacy column name such as `SMA20`, `RSI14` or `BB_Upper`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        match name {
            "MACD" => return Some(IndicatorId::Macd),
            "MACD_Signal" => return Some(IndicatorId::MacdSignal),
            "MACD_Hist" => return Some(IndicatorId::MacdHistogram),
            "BB_Upper" => return Some(IndicatorId::BbUpper),
            "BB_Middle" => return Some(IndicatorId::BbMiddle),
            "BB_Lower" => return Some(IndicatorId::BbLower),
            _ => {}
        }

        let (prefix, digits) = name.split_at(name.find(|c: char| c.is_ascii_digit())?);
        let window: usize = digits.parse().ok()?;
        if window == 0 {
            return None;
        }
        match prefix {
            "SMA" => Some(IndicatorId::Sma(window)),
            "EMA" => Some(IndicatorId::Ema(window)),
            "RSI" => Some(IndicatorId::Rsi(window)),
            "STD" => Some(IndicatorId::StdDev(window)),
            _ => None,
        }
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorId::Sma(window) => write!(f, "SMA{}", window),
            IndicatorId::Ema(span) => write!(f, "EMA{}", span),
            IndicatorId::Rsi(period) => write!(f, "RSI{}", period),
            IndicatorId::StdDev(window) => write!(f, "STD{}", window),
            IndicatorId::Macd => write!(f, "MACD"),
            IndicatorId::MacdSignal => write!(f, "MACD_Signal"),
            IndicatorId::MacdHistogram => write!(f, "MACD_Hist"),
            IndicatorId::BbUpper => write!(f, "BB_Upper"),
            IndicatorId::BbMiddle => write!(f, "BB_Middle"),
            IndicatorId::BbLower => write!(f, "BB_Lower"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator: IndicatorId,
    pub values: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn undefined(indicator: IndicatorId, len: usize) -> Self {
        Self {
            indicator,
            values: vec![None; len],
        }
    }

    /// Index of the first defined value, if any.
    pub fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

/// Indicator columns aligned to one price series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorSet {
    len: usize,
    series: HashMap<IndicatorId, Vec<Option<f64>>>,
}

impl IndicatorSet {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            series: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Adds a column. Columns whose length differs from the set are rejected.
    pub fn insert(&mut self, series: IndicatorSeries) -> bool {
        if series.values.len() != self.len {
            return false;
        }
        self.series.insert(series.indicator, series.values);
        true
    }

    pub fn contains(&self, id: IndicatorId) -> bool {
        self.series.contains_key(&id)
    }

    pub fn series(&self, id: IndicatorId) -> Option<&[Option<f64>]> {
        self.series.get(&id).map(|v| v.as_slice())
    }

    /// Value of `id` at bar `index`; `None` when missing or still warming up.
    pub fn get(&self, id: IndicatorId, index: usize) -> Option<f64> {
        self.series.get(&id)?.get(index).copied().flatten()
    }

    /// True when every listed indicator is defined at `index`.
    pub fn all_defined(&self, ids: &[IndicatorId], index: usize) -> bool {
        ids.iter().all(|id| self.get(*id, index).is_some())
    }

    pub fn ids(&self) -> impl Iterator<Item = &IndicatorId> {
        self.series.keys()
    }
}
