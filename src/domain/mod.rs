//! Core domain types and the backtest metrics pipeline.

pub mod ohlcv;
pub mod indicator;
pub mod indicator_helpers;
pub mod strategy;
pub mod signal;
pub mod trade;
pub mod metrics;
pub mod backtest;
pub mod cache;
pub mod news;
pub mod data_manager;
pub mod scorer;
pub mod universe;
pub mod config_validation;
pub mod error;
