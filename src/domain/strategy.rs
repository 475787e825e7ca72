//! Named strategy catalog.
//!
//! Strategy names are matched case-sensitively; anything not in the catalog
//! resolves to the SMA20/SMA50 crossover rule rather than failing.

use crate::domain::indicator::IndicatorId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Momentum,
    TrendFollowing,
    Breakout,
    MeanReversion,
    MacdCrossover,
    RsiOscillator,
    SmaCrossover,
}

/// Catalog names in display order. Several names may share a kind.
pub const CATALOG: &[(&str, StrategyKind)] = &[
    ("Momentum", StrategyKind::Momentum),
    ("Trend Following", StrategyKind::TrendFollowing),
    ("Breakout", StrategyKind::Breakout),
    ("Mean Reversion", StrategyKind::MeanReversion),
    ("MACD Crossover", StrategyKind::MacdCrossover),
    ("RSI Divergence", StrategyKind::RsiOscillator),
    ("RSI Oscillator", StrategyKind::RsiOscillator),
    ("SMA Crossover", StrategyKind::SmaCrossover),
];

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

impl StrategyKind {
    /// Unknown names fall back to `SmaCrossover`.
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or(StrategyKind::SmaCrossover)
    }

    pub fn lookup(name: &str) -> Option<Self> {
        CATALOG
            .iter()
            .find(|(catalog_name, _)| *catalog_name == name)
            .map(|(_, kind)| *kind)
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "Momentum",
            StrategyKind::TrendFollowing => "Trend Following",
            StrategyKind::Breakout => "Breakout",
            StrategyKind::MeanReversion => "Mean Reversion",
            StrategyKind::MacdCrossover => "MACD Crossover",
            StrategyKind::RsiOscillator => "RSI Oscillator",
            StrategyKind::SmaCrossover => "SMA Crossover",
        }
    }

    pub fn required_indicators(&self) -> &'static [IndicatorId] {
        match self {
            StrategyKind::Momentum => &[IndicatorId::Sma(20)],
            StrategyKind::TrendFollowing => &[
                IndicatorId::Sma(20),
                IndicatorId::Sma(50),
                IndicatorId::Sma(200),
            ],
            StrategyKind::Breakout | StrategyKind::MeanReversion => {
                &[IndicatorId::BbUpper, IndicatorId::BbLower]
            }
            StrategyKind::MacdCrossover => &[IndicatorId::Macd, IndicatorId::MacdSignal],
            StrategyKind::RsiOscillator => &[IndicatorId::Rsi(14)],
            StrategyKind::SmaCrossover => &[IndicatorId::Sma(20), IndicatorId::Sma(50)],
        }
    }

    pub fn all() -> [StrategyKind; 7] {
        [
            StrategyKind::Momentum,
            StrategyKind::TrendFollowing,
            StrategyKind::Breakout,
            StrategyKind::MeanReversion,
            StrategyKind::MacdCrossover,
            StrategyKind::RsiOscillator,
            StrategyKind::SmaCrossover,
        ]
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
