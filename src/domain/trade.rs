//! Trade extraction: a single-position FLAT/LONG state machine over a
//! signal series.

use crate::domain::signal::{Signal, SignalSeries};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl_percent: f64,
    pub holding_period_days: i64,
    /// Closed at the final bar's close instead of by a -1 signal.
    pub marked_to_market: bool,
}

impl Trade {
    pub fn new(
        entry_date: NaiveDate,
        entry_price: f64,
        exit_date: NaiveDate,
        exit_price: f64,
    ) -> Self {
        Self {
            entry_date,
            exit_date,
            entry_price,
            exit_price,
            pnl_percent: (exit_price / entry_price - 1.0) * 100.0,
            holding_period_days: (exit_date - entry_date).num_days(),
            marked_to_market: false,
        }
    }

    pub fn return_fraction(&self) -> f64 {
        self.pnl_percent / 100.0
    }

    pub fn is_win(&self) -> bool {
        self.pnl_percent > 0.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Close a position still open at the last bar at that bar's close.
    pub close_open_position: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PositionState {
    Flat,
    Long { entry_date: NaiveDate, entry_price: f64 },
}

/// Walks the series from index 1. A +1 opens when flat, a -1 closes when
/// long; everything else is ignored. A position still open at the end is
/// dropped unless `options.close_open_position` is set.
pub fn extract_trades(signals: &SignalSeries, options: ExtractionOptions) -> Vec<Trade> {
    let points = &signals.points;
    let mut trades = Vec::new();
    let mut state = PositionState::Flat;

    for point in points.iter().skip(1) {
        match (point.signal, state) {
            (Signal::Long, PositionState::Flat) => {
                state = PositionState::Long {
                    entry_date: point.date,
                    entry_price: point.close,
                };
            }
            (
                Signal::Short,
                PositionState::Long {
                    entry_date,
                    entry_price,
                },
            ) => {
                trades.push(Trade::new(entry_date, entry_price, point.date, point.close));
                state = PositionState::Flat;
            }
            _ => {}
        }
    }

    if let PositionState::Long {
        entry_date,
        entry_price,
    } = state
    {
        match points.last() {
            Some(last) if options.close_open_position && last.date > entry_date => {
                let mut trade = Trade::new(entry_date, entry_price, last.date, last.close);
                trade.marked_to_market = true;
                trades.push(trade);
            }
            _ => log::debug!("dropping position opened {entry_date} still open at series end"),
        }
    }

    trades
}
