//! Score factors and the weight table that combines them.

use std::collections::BTreeMap;
use std::fmt;

/// Tolerance when checking that weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreFactor {
    NewsSentiment,
    NewsVolume,
    PriceMomentum,
    VolumeAnomaly,
    SectorRelative,
    VolatilityRegime,
    PrevBacktest,
}

impl ScoreFactor {
    pub const ALL: [ScoreFactor; 7] = [
        ScoreFactor::NewsSentiment,
        ScoreFactor::NewsVolume,
        ScoreFactor::PriceMomentum,
        ScoreFactor::VolumeAnomaly,
        ScoreFactor::SectorRelative,
        ScoreFactor::VolatilityRegime,
        ScoreFactor::PrevBacktest,
    ];

    /// Config key and display name.
    pub fn key(&self) -> &'static str {
        match self {
            ScoreFactor::NewsSentiment => "news_sentiment",
            ScoreFactor::NewsVolume => "news_volume",
            ScoreFactor::PriceMomentum => "price_momentum",
            ScoreFactor::VolumeAnomaly => "volume_anomaly",
            ScoreFactor::SectorRelative => "sector_relative",
            ScoreFactor::VolatilityRegime => "volatility_regime",
            ScoreFactor::PrevBacktest => "prev_backtest",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// News-derived factors go stale faster than price-derived ones.
    pub fn is_news_based(&self) -> bool {
        matches!(self, ScoreFactor::NewsSentiment | ScoreFactor::NewsVolume)
    }

    fn default_weight(&self) -> f64 {
        match self {
            ScoreFactor::NewsSentiment => 0.25,
            ScoreFactor::NewsVolume => 0.10,
            ScoreFactor::PriceMomentum => 0.15,
            ScoreFactor::VolumeAnomaly => 0.15,
            ScoreFactor::SectorRelative => 0.10,
            ScoreFactor::VolatilityRegime => 0.15,
            ScoreFactor::PrevBacktest => 0.10,
        }
    }
}

impl fmt::Display for ScoreFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WeightsError {
    #[error("weight for {factor} must be a finite non-negative number, got {weight}")]
    Invalid { factor: ScoreFactor, weight: f64 },

    #[error("weights must sum to 1.0, got {sum}")]
    BadSum { sum: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    weights: BTreeMap<ScoreFactor, f64>,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            weights: ScoreFactor::ALL
                .into_iter()
                .map(|f| (f, f.default_weight()))
                .collect(),
        }
    }
}

impl ScoreWeights {
    /// Starts from the default table and applies `overrides`. The result
    /// must still sum to one.
    pub fn with_overrides(
        overrides: impl IntoIterator<Item = (ScoreFactor, f64)>,
    ) -> Result<Self, WeightsError> {
        let mut table = Self::default();
        for (factor, weight) in overrides {
            if !weight.is_finite() || weight < 0.0 {
                return Err(WeightsError::Invalid { factor, weight });
            }
            table.weights.insert(factor, weight);
        }
        let sum = table.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum { sum });
        }
        Ok(table)
    }

    pub fn get(&self, factor: ScoreFactor) -> f64 {
        self.weights.get(&factor).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreFactor, f64)> + '_ {
        self.weights.iter().map(|(f, w)| (*f, *w))
    }
}
