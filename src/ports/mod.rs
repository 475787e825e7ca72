//! Port traits implemented by adapters.

pub mod backtest_store_port;
pub mod config_port;
pub mod data_port;
pub mod news_port;
pub mod report_port;
