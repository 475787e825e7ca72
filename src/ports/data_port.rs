//! Price history port.

use crate::domain::error::StratscopeError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait PriceDataPort: Send + Sync {
    /// Bars for `symbol` with `start_date <= date <= end_date`, ascending.
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratscopeError>;

    fn list_symbols(&self) -> Result<Vec<String>, StratscopeError>;

    /// First date, last date and bar count, or `None` when nothing is stored.
    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratscopeError>;
}
