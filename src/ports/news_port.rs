//! News provider port.

use crate::domain::error::StratscopeError;
use crate::domain::news::NewsItem;
use chrono::NaiveDate;

pub trait NewsPort: Send + Sync {
    fn fetch_news(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NewsItem>, StratscopeError>;
}
