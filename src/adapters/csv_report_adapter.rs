//! CSV export of backtest runs.
//!
//! Each run produces `{symbol}_{strategy}_trades.csv` and, when the run has
//! performance, `{symbol}_{strategy}_equity.csv`.

use crate::domain::backtest::BacktestRun;
use crate::domain::error::StratscopeError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvReportAdapter;

fn csv_err(e: csv::Error) -> StratscopeError {
    StratscopeError::Io(std::io::Error::other(e.to_string()))
}

/// Strategy names contain spaces; keep file names shell-friendly.
fn file_stem(symbol: &str, strategy: &str) -> String {
    let clean: String = strategy
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{symbol}_{clean}")
}

impl CsvReportAdapter {
    fn write_trades(run: &BacktestRun, path: &Path) -> Result<(), StratscopeError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        wtr.write_record([
            "entry_date",
            "exit_date",
            "entry_price",
            "exit_price",
            "pnl_percent",
            "holding_period_days",
            "marked_to_market",
        ])
        .map_err(csv_err)?;

        for trade in &run.trades {
            wtr.write_record([
                trade.entry_date.format("%Y-%m-%d").to_string(),
                trade.exit_date.format("%Y-%m-%d").to_string(),
                format!("{:.4}", trade.entry_price),
                format!("{:.4}", trade.exit_price),
                format!("{:.4}", trade.pnl_percent),
                trade.holding_period_days.to_string(),
                trade.marked_to_market.to_string(),
            ])
            .map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_equity(run: &BacktestRun, path: &Path) -> Result<bool, StratscopeError> {
        let Some(performance) = &run.performance else {
            return Ok(false);
        };

        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        wtr.write_record(["date", "equity"]).map_err(csv_err)?;
        for point in &performance.equity_curve {
            wtr.write_record([
                point.date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", point.equity),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(true)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_run(
        &self,
        run: &BacktestRun,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratscopeError> {
        fs::create_dir_all(output_dir)?;
        let stem = file_stem(&run.symbol, &run.strategy);

        let trades_path = output_dir.join(format!("{stem}_trades.csv"));
        Self::write_trades(run, &trades_path)?;
        let mut written = vec![trades_path];

        let equity_path = output_dir.join(format!("{stem}_equity.csv"));
        if Self::write_equity(run, &equity_path)? {
            written.push(equity_path);
        }

        log::debug!("wrote {} report file(s) for {}", written.len(), stem);
        Ok(written)
    }
}
