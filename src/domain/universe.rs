//! Symbol and strategy universe.
//!
//! Parses symbol and strategy lists from configuration and loads the price
//! series for each symbol, skipping symbols that cannot be backtested.

use crate::domain::data_manager::{DataManager, DataSource, PriceFetch};
use crate::domain::error::StratscopeError;
use crate::domain::strategy::StrategyKind;
use chrono::NaiveDate;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),

    #[error("duplicate strategy: {0}")]
    DuplicateStrategy(String),
}

/// Comma-separated symbols, trimmed and uppercased.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(UniverseError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

/// Comma-separated strategy names, trimmed but otherwise kept verbatim since
/// catalog matching is case-sensitive. Names outside the catalog are kept;
/// they run under the default crossover rule.
pub fn parse_strategies(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let name = token.trim();
        if name.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !seen.insert(name.to_string()) {
            return Err(UniverseError::DuplicateStrategy(name.to_string()));
        }
        if StrategyKind::lookup(name).is_none() {
            log::warn!("strategy '{name}' is not in the catalog; using SMA Crossover rules");
        }
        names.push(name.to_string());
    }

    Ok(names)
}

#[derive(Debug, Clone)]
pub struct LoadedSymbol {
    pub symbol: String,
    pub fetch: PriceFetch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    InsufficientBars { bars: usize },
}

#[derive(Debug, Clone)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

pub struct LoadedUniverse {
    pub symbols: Vec<LoadedSymbol>,
    pub skipped: Vec<SkippedSymbol>,
}

impl LoadedUniverse {
    pub fn simulated_count(&self) -> usize {
        self.symbols
            .iter()
            .filter(|s| s.fetch.source == DataSource::Simulated)
            .count()
    }
}

/// Loads every symbol, skipping those with no data or fewer than `min_bars`
/// bars. Fails only when no symbol survives.
pub fn load_universe(
    manager: &DataManager,
    symbols: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
    min_bars: usize,
) -> Result<LoadedUniverse, StratscopeError> {
    let mut loaded = Vec::new();
    let mut skipped = Vec::new();

    for symbol in symbols {
        let fetch = match manager.fetch_prices(symbol, start_date, end_date) {
            Ok(fetch) => fetch,
            Err(e) => {
                log::warn!("skipping {symbol} ({e})");
                skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::NoData,
                });
                continue;
            }
        };

        if fetch.bars.len() < min_bars {
            log::warn!(
                "skipping {symbol} (only {} bars, minimum {min_bars} required)",
                fetch.bars.len()
            );
            skipped.push(SkippedSymbol {
                symbol: symbol.clone(),
                reason: SkipReason::InsufficientBars {
                    bars: fetch.bars.len(),
                },
            });
            continue;
        }

        log::info!("{symbol}: {} bars [{}]", fetch.bars.len(), fetch.source);
        loaded.push(LoadedSymbol {
            symbol: symbol.clone(),
            fetch,
        });
    }

    if loaded.is_empty() {
        return Err(StratscopeError::InsufficientData {
            symbol: "all".to_string(),
            bars: 0,
            minimum: min_bars,
        });
    }

    if !skipped.is_empty() {
        log::info!(
            "using {} of {} symbols",
            loaded.len(),
            loaded.len() + skipped.len()
        );
    }

    Ok(LoadedUniverse {
        symbols: loaded,
        skipped,
    })
}
