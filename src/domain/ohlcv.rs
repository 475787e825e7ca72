//! Daily OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Checks the series invariant: unique dates in strictly ascending order.
pub fn is_strictly_ascending(bars: &[PriceBar]) -> bool {
    bars.windows(2).all(|w| w[0].date < w[1].date)
}

/// Sorts by date and drops later duplicates of the same date.
pub fn normalize_series(mut bars: Vec<PriceBar>) -> Vec<PriceBar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(date: &str, close: f64) -> PriceBar {
        PriceBar {
            symbol: "AAPL".into(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 50_000,
        }
    }

    #[test]
    fn ascending_series_passes() {
        let bars = vec![bar("2024-01-02", 1.0), bar("2024-01-03", 2.0)];
        assert!(is_strictly_ascending(&bars));
    }

    #[test]
    fn duplicate_dates_fail() {
        let bars = vec![bar("2024-01-02", 1.0), bar("2024-01-02", 2.0)];
        assert!(!is_strictly_ascending(&bars));
    }

    #[test]
    fn normalize_sorts_and_dedups() {
        let bars = vec![
            bar("2024-01-04", 3.0),
            bar("2024-01-02", 1.0),
            bar("2024-01-04", 9.0),
            bar("2024-01-03", 2.0),
        ];
        let normalized = normalize_series(bars);
        assert_eq!(normalized.len(), 3);
        assert!(is_strictly_ascending(&normalized));
        assert_eq!(closes(&normalized)[0], 1.0);
    }

    #[test]
    fn empty_series_is_ascending() {
        assert!(is_strictly_ascending(&[]));
    }
}
