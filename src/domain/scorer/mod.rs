//! Symbol/strategy pair scoring.
//!
//! Seven normalized sub-scores are combined with a weight table into one
//! score in [0, 1] used to decide which pairs get a full backtest. Sub-scores
//! are cached per (factor, symbol, strategy); the combined score is always
//! recomputed from them.

pub mod factors;
pub mod weights;

pub use factors::{NEUTRAL_SCORE, VolatilityRegime};
pub use weights::{ScoreFactor, ScoreWeights, WeightsError};

use crate::domain::cache::{Clock, TtlCache};
use crate::domain::metrics::PerformanceSummary;
use crate::domain::news::NewsItem;
use crate::domain::ohlcv::PriceBar;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Everything one pair's sub-scores are computed from.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs<'a> {
    pub bars: &'a [PriceBar],
    pub benchmark: Option<&'a [PriceBar]>,
    pub news: &'a [NewsItem],
    pub prior: Option<&'a PerformanceSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreComponents {
    values: BTreeMap<ScoreFactor, f64>,
}

impl ScoreComponents {
    pub fn from_fn(mut score: impl FnMut(ScoreFactor) -> f64) -> Self {
        Self {
            values: ScoreFactor::ALL
                .into_iter()
                .map(|f| (f, factors::clip01(score(f))))
                .collect(),
        }
    }

    pub fn get(&self, factor: ScoreFactor) -> f64 {
        self.values.get(&factor).copied().unwrap_or(NEUTRAL_SCORE)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScoreFactor, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    /// Weighted sum, clamped into [0, 1].
    pub fn weighted(&self, weights: &ScoreWeights) -> f64 {
        let total: f64 = weights
            .iter()
            .map(|(factor, weight)| weight * self.get(factor))
            .sum();
        factors::clip01(total)
    }
}

/// Computes one factor from scratch.
pub fn compute_factor(factor: ScoreFactor, strategy: &str, inputs: &ScoreInputs<'_>) -> f64 {
    match factor {
        ScoreFactor::NewsSentiment => factors::news_sentiment_score(inputs.news),
        ScoreFactor::NewsVolume => factors::news_volume_score(inputs.news),
        ScoreFactor::PriceMomentum => factors::price_momentum_score(inputs.bars),
        ScoreFactor::VolumeAnomaly => factors::volume_anomaly_score(inputs.bars),
        ScoreFactor::SectorRelative => {
            factors::sector_relative_score(inputs.bars, inputs.benchmark)
        }
        ScoreFactor::VolatilityRegime => factors::volatility_regime_score(strategy, inputs.bars),
        ScoreFactor::PrevBacktest => factors::prev_backtest_score(inputs.prior),
    }
}

/// Uncached components for one pair.
pub fn score_components(strategy: &str, inputs: &ScoreInputs<'_>) -> ScoreComponents {
    ScoreComponents::from_fn(|factor| compute_factor(factor, strategy, inputs))
}

/// Uncached score for one pair under the default weights.
pub fn score_pair(strategy: &str, inputs: &ScoreInputs<'_>) -> f64 {
    score_components(strategy, inputs).weighted(&ScoreWeights::default())
}

#[derive(Debug, Clone)]
pub struct ScoringRequest {
    pub symbol: String,
    pub strategy: String,
    pub bars: Vec<PriceBar>,
    pub news: Vec<NewsItem>,
    pub prior: Option<PerformanceSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPair {
    pub symbol: String,
    pub strategy: String,
    pub score: f64,
    pub components: ScoreComponents,
}

#[derive(Debug, Clone)]
pub struct ScorerSettings {
    pub weights: ScoreWeights,
    pub subscore_ttl: Duration,
    pub news_subscore_ttl: Duration,
}

impl Default for ScorerSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            subscore_ttl: Duration::from_secs(4 * 3600),
            news_subscore_ttl: Duration::from_secs(3600),
        }
    }
}

type SubscoreKey = (ScoreFactor, String, String);

pub struct SymbolScorer {
    weights: ScoreWeights,
    subscores: TtlCache<SubscoreKey, f64>,
    news_subscores: TtlCache<SubscoreKey, f64>,
}

impl SymbolScorer {
    pub fn new(settings: ScorerSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            weights: settings.weights,
            subscores: TtlCache::new(settings.subscore_ttl, clock.clone()),
            news_subscores: TtlCache::new(settings.news_subscore_ttl, clock),
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    fn cache_for(&self, factor: ScoreFactor) -> &TtlCache<SubscoreKey, f64> {
        if factor.is_news_based() {
            &self.news_subscores
        } else {
            &self.subscores
        }
    }

    /// Components for one pair, served from the sub-score caches where fresh.
    pub fn score_components(
        &self,
        symbol: &str,
        strategy: &str,
        inputs: &ScoreInputs<'_>,
    ) -> ScoreComponents {
        ScoreComponents::from_fn(|factor| {
            let key = (factor, symbol.to_string(), strategy.to_string());
            self.cache_for(factor)
                .get_or_insert_with(key, || compute_factor(factor, strategy, inputs))
        })
    }

    pub fn score_pair(&self, symbol: &str, strategy: &str, inputs: &ScoreInputs<'_>) -> f64 {
        self.score_components(symbol, strategy, inputs)
            .weighted(&self.weights)
    }

    /// Scores every request and sorts by descending score. Ties keep the
    /// request order.
    pub fn rank_pairs(
        &self,
        requests: &[ScoringRequest],
        benchmark: Option<&[PriceBar]>,
        parallel: bool,
    ) -> Vec<RankedPair> {
        let rank_one = |req: &ScoringRequest| {
            let inputs = ScoreInputs {
                bars: &req.bars,
                benchmark,
                news: &req.news,
                prior: req.prior.as_ref(),
            };
            let components = self.score_components(&req.symbol, &req.strategy, &inputs);
            let score = components.weighted(&self.weights);
            log::debug!("{}/{}: score {score:.3}", req.symbol, req.strategy);
            RankedPair {
                symbol: req.symbol.clone(),
                strategy: req.strategy.clone(),
                score,
                components,
            }
        };

        let mut ranked: Vec<RankedPair> = if parallel {
            requests.par_iter().map(rank_one).collect()
        } else {
            requests.iter().map(rank_one).collect()
        };
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        log::info!("ranked {} pairs", ranked.len());
        ranked
    }

    pub fn purge_expired(&self) -> usize {
        self.subscores.purge_expired() + self.news_subscores.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::ManualClock;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
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

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()))
    }

    fn empty_inputs(bars: &[PriceBar]) -> ScoreInputs<'_> {
        ScoreInputs {
            bars,
            benchmark: None,
            news: &[],
            prior: None,
        }
    }

    #[test]
    fn neutral_inputs_score_below_half() {
        // No news: sentiment neutral but volume zero.
        let score = score_pair("Momentum", &empty_inputs(&[]));
        assert!((score - (1.0 - 0.10) * 0.5).abs() < 1e-12);
    }

    #[test]
    fn all_ones_scores_one() {
        let ones = ScoreComponents::from_fn(|_| 1.0);
        assert!((ones.weighted(&ScoreWeights::default()) - 1.0).abs() < 1e-12);
        let zeros = ScoreComponents::from_fn(|_| 0.0);
        assert_eq!(zeros.weighted(&ScoreWeights::default()), 0.0);
    }

    #[test]
    fn components_are_clipped() {
        let c = ScoreComponents::from_fn(|f| match f {
            ScoreFactor::NewsVolume => 4.0,
            ScoreFactor::PriceMomentum => -2.0,
            _ => 0.5,
        });
        assert_eq!(c.get(ScoreFactor::NewsVolume), 1.0);
        assert_eq!(c.get(ScoreFactor::PriceMomentum), 0.0);
    }

    #[test]
    fn subscores_are_cached_until_ttl() {
        let clock = clock();
        let scorer = SymbolScorer::new(ScorerSettings::default(), clock.clone());
        let rising: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let falling: Vec<f64> = (0..30).map(|i| 130.0 - i as f64).collect();
        let (up, down) = (bars(&rising), bars(&falling));

        let first = scorer.score_components("X", "Momentum", &empty_inputs(&up));
        let cached = scorer.score_components("X", "Momentum", &empty_inputs(&down));
        assert_eq!(first, cached);

        clock.advance(Duration::from_secs(4 * 3600));
        let fresh = scorer.score_components("X", "Momentum", &empty_inputs(&down));
        assert!(fresh.get(ScoreFactor::PriceMomentum) < first.get(ScoreFactor::PriceMomentum));
    }

    #[test]
    fn news_subscores_expire_sooner() {
        let clock = clock();
        let scorer = SymbolScorer::new(ScorerSettings::default(), clock.clone());
        let day = NaiveDate::from_ymd_opt(2024, 5, 30).unwrap();
        let happy = vec![NewsItem::new("X", day, "beat", 1.0)];
        let gloomy = vec![NewsItem::new("X", day, "miss", -1.0)];

        let with_news = |news: &[NewsItem]| {
            scorer.score_components(
                "X",
                "Breakout",
                &ScoreInputs {
                    bars: &[],
                    benchmark: None,
                    news,
                    prior: None,
                },
            )
        };
        assert_eq!(with_news(&happy).get(ScoreFactor::NewsSentiment), 1.0);
        clock.advance(Duration::from_secs(3600));
        assert_eq!(with_news(&gloomy).get(ScoreFactor::NewsSentiment), 0.0);
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let scorer = SymbolScorer::new(ScorerSettings::default(), clock());
        let rising: Vec<f64> = (0..30).map(|i| 100.0 * 1.01_f64.powi(i)).collect();
        let flat = vec![100.0; 30];
        let request = |symbol: &str, closes: &[f64]| ScoringRequest {
            symbol: symbol.into(),
            strategy: "Momentum".into(),
            bars: bars(closes),
            news: vec![],
            prior: None,
        };
        let requests = vec![
            request("FLAT1", &flat),
            request("UP", &rising),
            request("FLAT2", &flat),
        ];
        for parallel in [false, true] {
            let ranked = scorer.rank_pairs(&requests, None, parallel);
            let order: Vec<&str> = ranked.iter().map(|r| r.symbol.as_str()).collect();
            assert_eq!(order, vec!["UP", "FLAT1", "FLAT2"]);
            assert!(ranked.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        }
    }
}
