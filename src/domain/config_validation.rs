//! Configuration validation.
//!
//! Validates all config fields before a run so failures surface as
//! `ConfigMissing` / `ConfigInvalid` instead of mid-run surprises.

use crate::domain::error::StratscopeError;
use crate::domain::metrics::SharpeMode;
use crate::domain::scorer::{ScoreFactor, ScoreWeights};
use crate::domain::universe::{parse_strategies, parse_symbols};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: &[&str] = &["csv", "sqlite", "simulated"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    validate_initial_capital(config)?;
    validate_dates(config)?;
    validate_symbols(config)?;
    validate_strategies(config)?;
    validate_min_bars(config)?;
    validate_sharpe_mode(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    let source = data_source(config);
    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(invalid(
            "data",
            "source",
            format!("unknown source '{source}', expected one of {}", DATA_SOURCES.join(", ")),
        ));
    }
    match source.as_str() {
        "csv" => require_non_empty(config, "data", "csv_dir")?,
        "sqlite" => {
            require_non_empty(config, "sqlite", "path")?;
            if config.get_int("sqlite", "pool_size", 4) < 1 {
                return Err(invalid("sqlite", "pool_size", "pool_size must be at least 1"));
            }
        }
        _ => {}
    }
    if config.get_int("data", "fetch_timeout_secs", 10) < 1 {
        return Err(invalid(
            "data",
            "fetch_timeout_secs",
            "fetch_timeout_secs must be at least 1",
        ));
    }
    for key in ["price_cache_ttl_secs", "news_cache_ttl_secs"] {
        if config.get_int("data", key, 3600) < 0 {
            return Err(invalid("data", key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

pub fn validate_scoring_config(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    score_weights(config)?;
    for (key, default) in [("subscore_ttl_secs", 14_400), ("news_subscore_ttl_secs", 3_600)] {
        if config.get_int("scoring", key, default) < 0 {
            return Err(invalid("scoring", key, format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

/// Validates every section a run reads.
pub fn validate_all(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    validate_backtest_config(config)?;
    validate_data_config(config)?;
    validate_scoring_config(config)?;
    Ok(())
}

/// `[data] source`, lowercased, defaulting to `csv`.
pub fn data_source(config: &dyn ConfigPort) -> String {
    config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "csv".to_string())
}

/// Default weight table with any `[scoring]` overrides applied.
pub fn score_weights(config: &dyn ConfigPort) -> Result<ScoreWeights, StratscopeError> {
    let mut overrides = Vec::new();
    for factor in ScoreFactor::ALL {
        if let Some(raw) = config.get_string("scoring", factor.key()) {
            let weight: f64 = raw.trim().parse().map_err(|_| {
                invalid("scoring", factor.key(), format!("'{raw}' is not a number"))
            })?;
            overrides.push((factor, weight));
        }
    }
    ScoreWeights::with_overrides(overrides)
        .map_err(|e| invalid("scoring", "weights", e.to_string()))
}

pub fn sharpe_mode(config: &dyn ConfigPort) -> Result<SharpeMode, StratscopeError> {
    match config.get_string("backtest", "sharpe_mode") {
        None => Ok(SharpeMode::default()),
        Some(raw) => SharpeMode::parse(&raw).ok_or_else(|| {
            invalid(
                "backtest",
                "sharpe_mode",
                format!("unknown mode '{raw}', expected fixed or holding_period"),
            )
        }),
    }
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, StratscopeError> {
    match value {
        None => Err(StratscopeError::ConfigMissing {
            section: "backtest".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "backtest",
                field,
                format!("invalid {field} format, expected YYYY-MM-DD"),
            )
        }),
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> StratscopeError {
    StratscopeError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn require_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), StratscopeError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratscopeError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    let value = config.get_double("backtest", "initial_capital", 10_000.0);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    let start_str = config.get_string("backtest", "start_date");
    let end_str = config.get_string("backtest", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

/// Raw symbol list from `symbols`, falling back to `symbol`.
pub fn symbol_list(config: &dyn ConfigPort) -> Option<String> {
    list_field(config, "symbols", "symbol")
}

/// Raw strategy list from `strategies`, falling back to `strategy`.
pub fn strategy_list(config: &dyn ConfigPort) -> Option<String> {
    list_field(config, "strategies", "strategy")
}

fn list_field(config: &dyn ConfigPort, plural: &str, singular: &str) -> Option<String> {
    config
        .get_string("backtest", plural)
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            config
                .get_string("backtest", singular)
                .filter(|s| !s.trim().is_empty())
        })
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    let raw = symbol_list(config).ok_or_else(|| StratscopeError::ConfigMissing {
        section: "backtest".to_string(),
        key: "symbol".to_string(),
    })?;
    parse_symbols(&raw).map_err(|e| invalid("backtest", "symbols", e.to_string()))?;
    Ok(())
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    let raw = strategy_list(config).ok_or_else(|| StratscopeError::ConfigMissing {
        section: "backtest".to_string(),
        key: "strategy".to_string(),
    })?;
    parse_strategies(&raw).map_err(|e| invalid("backtest", "strategies", e.to_string()))?;
    Ok(())
}

fn validate_min_bars(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    if config.get_int("backtest", "min_bars", 30) < 1 {
        return Err(invalid("backtest", "min_bars", "min_bars must be at least 1"));
    }
    Ok(())
}

fn validate_sharpe_mode(config: &dyn ConfigPort) -> Result<(), StratscopeError> {
    sharpe_mode(config).map(|_| ())
}
