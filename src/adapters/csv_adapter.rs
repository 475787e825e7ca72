//! CSV file data adapter.
//!
//! Prices live in `{SYMBOL}.csv` (`date,open,high,low,close,volume`) and news
//! in `{SYMBOL}_news.csv` (`date,headline,sentiment`).

use crate::domain::error::StratscopeError;
use crate::domain::news::NewsItem;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::PriceDataPort;
use crate::ports::news_port::NewsPort;
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const NEWS_SUFFIX: &str = "_news.csv";

pub struct CsvAdapter {
    base_path: PathBuf,
    news_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            news_path: base_path.clone(),
            base_path,
        }
    }

    pub fn with_news_dir(mut self, news_path: PathBuf) -> Self {
        self.news_path = news_path;
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{symbol}.csv"))
    }

    fn news_file(&self, symbol: &str) -> PathBuf {
        self.news_path.join(format!("{symbol}{NEWS_SUFFIX}"))
    }

    /// Reads the file, mapping a missing file to `None`.
    fn read_optional(path: &Path) -> Result<Option<String>, StratscopeError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StratscopeError::Database {
                reason: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, StratscopeError> {
        let path = self.csv_path(symbol);
        let content = Self::read_optional(&path)?.ok_or_else(|| StratscopeError::NoData {
            symbol: symbol.to_string(),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| StratscopeError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;

            let date = parse_date(&record, 0)?;
            bars.push(PriceBar {
                symbol: symbol.to_string(),
                date,
                open: field(&record, 1, "open")?,
                high: field(&record, 2, "high")?,
                low: field(&record, 3, "low")?,
                close: field(&record, 4, "close")?,
                volume: parse_volume(&record)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn raw<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, StratscopeError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| StratscopeError::Database {
            reason: format!("missing {name} column"),
        })
}

fn field<T>(record: &csv::StringRecord, idx: usize, name: &str) -> Result<T, StratscopeError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw(record, idx, name)?
        .parse()
        .map_err(|e| StratscopeError::Database {
            reason: format!("invalid {name} value: {e}"),
        })
}

fn parse_date(record: &csv::StringRecord, idx: usize) -> Result<NaiveDate, StratscopeError> {
    let value = raw(record, idx, "date")?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| StratscopeError::Database {
        reason: format!("invalid date format: {e}"),
    })
}

/// Accepts integer or float volumes; some exports write `1.5e6`.
fn parse_volume(record: &csv::StringRecord) -> Result<i64, StratscopeError> {
    let value = raw(record, 5, "volume")?;
    if let Ok(v) = value.parse::<i64>() {
        return Ok(v);
    }
    field::<f64>(record, 5, "volume").map(|v| v.round() as i64)
}

impl PriceDataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratscopeError> {
        let mut bars = self.read_bars(symbol)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratscopeError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| StratscopeError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StratscopeError::Database {
                reason: format!("directory entry error: {e}"),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if name_str.ends_with(NEWS_SUFFIX) {
                continue;
            }
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratscopeError> {
        let bars = match self.read_bars(symbol) {
            Ok(bars) => bars,
            Err(StratscopeError::NoData { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}

impl NewsPort for CsvAdapter {
    /// A symbol without a news file simply has no news.
    fn fetch_news(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<NewsItem>, StratscopeError> {
        let path = self.news_file(symbol);
        let Some(content) = Self::read_optional(&path)? else {
            return Ok(Vec::new());
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut items = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| StratscopeError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            let published = parse_date(&record, 0)?;
            if published < start_date || published > end_date {
                continue;
            }
            let headline = raw(&record, 1, "headline")?;
            let sentiment: f64 = field(&record, 2, "sentiment")?;
            items.push(NewsItem::new(symbol, published, headline, sentiment));
        }
        items.sort_by_key(|n| n.published);
        Ok(items)
    }
}
