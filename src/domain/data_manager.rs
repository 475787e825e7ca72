//! Data access with caching, bounded fetch time and simulated fallback.
//!
//! Each fetch runs on a worker thread and is abandoned once the timeout
//! elapses. Provider failures fall back to the simulated source when one is
//! attached; otherwise they propagate to the caller.

use crate::domain::cache::{Clock, TtlCache};
use crate::domain::error::StratscopeError;
use crate::domain::news::NewsItem;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::PriceDataPort;
use crate::ports::news_port::NewsPort;
use chrono::NaiveDate;
use crossbeam_channel::{RecvTimeoutError, bounded};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Provider,
    Simulated,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Provider => f.write_str("provider"),
            DataSource::Simulated => f.write_str("simulated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceFetch {
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

#[derive(Debug, Clone)]
pub struct DataSettings {
    pub fetch_timeout: Duration,
    pub price_cache_ttl: Duration,
    pub news_cache_ttl: Duration,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
            price_cache_ttl: Duration::from_secs(3600),
            news_cache_ttl: Duration::from_secs(3600),
        }
    }
}

type FetchKey = (String, NaiveDate, NaiveDate);

pub struct DataManager {
    prices: Arc<dyn PriceDataPort>,
    news: Option<Arc<dyn NewsPort>>,
    fallback: Option<Arc<dyn PriceDataPort>>,
    fetch_timeout: Duration,
    price_cache: TtlCache<FetchKey, PriceFetch>,
    news_cache: TtlCache<FetchKey, Vec<NewsItem>>,
}

impl DataManager {
    pub fn new(prices: Arc<dyn PriceDataPort>, settings: DataSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            prices,
            news: None,
            fallback: None,
            fetch_timeout: settings.fetch_timeout,
            price_cache: TtlCache::new(settings.price_cache_ttl, clock.clone()),
            news_cache: TtlCache::new(settings.news_cache_ttl, clock),
        }
    }

    pub fn with_news(mut self, news: Arc<dyn NewsPort>) -> Self {
        self.news = Some(news);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn PriceDataPort>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Provider bars for the range, or simulated bars if the provider fails
    /// (or returns nothing) and a fallback is attached. Only provider results
    /// are cached.
    pub fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceFetch, StratscopeError> {
        let key = (symbol.to_string(), start_date, end_date);
        if let Some(hit) = self.price_cache.get(&key) {
            log::debug!("{symbol}: price cache hit");
            return Ok(hit);
        }

        let port = Arc::clone(&self.prices);
        let owned = symbol.to_string();
        let fetched = self
            .with_timeout(symbol, move || port.fetch_bars(&owned, start_date, end_date))
            .and_then(|bars| {
                if bars.is_empty() {
                    Err(StratscopeError::NoData {
                        symbol: symbol.to_string(),
                    })
                } else {
                    Ok(bars)
                }
            });

        match fetched {
            Ok(bars) => {
                let fetch = PriceFetch {
                    bars,
                    source: DataSource::Provider,
                };
                self.price_cache.insert(key, fetch.clone());
                Ok(fetch)
            }
            Err(err) => match &self.fallback {
                Some(fallback) => {
                    log::warn!("{symbol}: {err}; using simulated prices");
                    let bars = fallback.fetch_bars(symbol, start_date, end_date)?;
                    Ok(PriceFetch {
                        bars,
                        source: DataSource::Simulated,
                    })
                }
                None => Err(err),
            },
        }
    }

    /// Never fails: a missing provider or a failed fetch yields no items.
    pub fn fetch_news(&self, symbol: &str, start_date: NaiveDate, end_date: NaiveDate) -> Vec<NewsItem> {
        let Some(news) = &self.news else {
            return Vec::new();
        };
        let key = (symbol.to_string(), start_date, end_date);
        if let Some(hit) = self.news_cache.get(&key) {
            return hit;
        }

        let port = Arc::clone(news);
        let owned = symbol.to_string();
        match self.with_timeout(symbol, move || port.fetch_news(&owned, start_date, end_date)) {
            Ok(items) => {
                self.news_cache.insert(key, items.clone());
                items
            }
            Err(err) => {
                log::warn!("{symbol}: news unavailable: {err}");
                Vec::new()
            }
        }
    }

    pub fn list_symbols(&self) -> Result<Vec<String>, StratscopeError> {
        self.prices.list_symbols()
    }

    pub fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratscopeError> {
        self.prices.get_data_range(symbol)
    }

    fn with_timeout<T, F>(&self, symbol: &str, fetch: F) -> Result<T, StratscopeError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, StratscopeError> + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        thread::Builder::new()
            .name(format!("fetch-{symbol}"))
            .spawn(move || {
                // The receiver is gone if the caller already timed out.
                let _ = tx.send(fetch());
            })?;

        match rx.recv_timeout(self.fetch_timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{symbol}: fetch exceeded {}s",
                    self.fetch_timeout.as_secs_f64()
                );
                Err(StratscopeError::UpstreamTimeout {
                    symbol: symbol.to_string(),
                    seconds: self.fetch_timeout.as_secs(),
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(StratscopeError::UpstreamFetch {
                symbol: symbol.to_string(),
                reason: "fetch worker exited without a result".into(),
            }),
        }
    }
}
