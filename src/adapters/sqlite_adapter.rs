//! SQLite adapter: price history and the backtest summary store.

use crate::domain::error::StratscopeError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::ohlcv::PriceBar;
use crate::ports::backtest_store_port::BacktestStorePort;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use chrono::{NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_err(e: r2d2::Error) -> StratscopeError {
    StratscopeError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> StratscopeError {
    StratscopeError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_sql_date(value: &str) -> Result<NaiveDate, StratscopeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| StratscopeError::Database {
        reason: format!("bad stored date '{value}': {e}"),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StratscopeError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StratscopeError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, StratscopeError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StratscopeError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), StratscopeError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume INTEGER NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);
                CREATE TABLE IF NOT EXISTS backtest_results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    symbol TEXT NOT NULL,
                    strategy TEXT NOT NULL,
                    recorded_at TEXT NOT NULL,
                    sharpe REAL NOT NULL,
                    win_rate_pct REAL NOT NULL,
                    profit_factor REAL NOT NULL,
                    max_drawdown_pct REAL NOT NULL,
                    total_trades INTEGER NOT NULL,
                    total_return_pct REAL NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_results_pair
                    ON backtest_results(symbol, strategy);",
            )
            .map_err(query_err)
    }

    pub fn insert_bars(&self, bars: &[PriceBar]) -> Result<(), StratscopeError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    bar.symbol,
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }
}

impl PriceDataPort for SqliteAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, StratscopeError> {
        let conn = self.conn()?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn
            .prepare(
                "SELECT symbol, date, open, high, low, close, volume
                 FROM ohlcv
                 WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceBar {
                    symbol: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn list_symbols(&self) -> Result<Vec<String>, StratscopeError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(query_err)?;
        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, StratscopeError> {
        let result: (Option<String>, Option<String>, i64) = self
            .conn()?
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_sql_date(&min_str)?,
                parse_sql_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}

impl BacktestStorePort for SqliteAdapter {
    fn save_result(
        &self,
        symbol: &str,
        strategy: &str,
        summary: &PerformanceSummary,
    ) -> Result<(), StratscopeError> {
        self.conn()?
            .execute(
                "INSERT INTO backtest_results (symbol, strategy, recorded_at, sharpe,
                    win_rate_pct, profit_factor, max_drawdown_pct, total_trades, total_return_pct)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    symbol,
                    strategy,
                    Utc::now().to_rfc3339(),
                    summary.sharpe,
                    summary.win_rate_pct,
                    summary.profit_factor,
                    summary.max_drawdown_pct,
                    summary.total_trades as i64,
                    summary.total_return_pct
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    fn latest_result(
        &self,
        symbol: &str,
        strategy: &str,
    ) -> Result<Option<PerformanceSummary>, StratscopeError> {
        self.conn()?
            .query_row(
                "SELECT sharpe, win_rate_pct, profit_factor, max_drawdown_pct,
                        total_trades, total_return_pct
                 FROM backtest_results
                 WHERE symbol = ?1 AND strategy = ?2
                 ORDER BY id DESC LIMIT 1",
                params![symbol, strategy],
                |row| {
                    let total_trades: i64 = row.get(4)?;
                    Ok(PerformanceSummary {
                        sharpe: row.get(0)?,
                        win_rate_pct: row.get(1)?,
                        profit_factor: row.get(2)?,
                        max_drawdown_pct: row.get(3)?,
                        total_trades: total_trades.max(0) as usize,
                        total_return_pct: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(query_err)
    }
}
