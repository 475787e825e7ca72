//! News items as supplied by a news provider.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub symbol: String,
    pub published: NaiveDate,
    pub headline: String,
    /// Provider-assigned sentiment in [-1, 1].
    pub sentiment: f64,
}

impl NewsItem {
    /// Clamps sentiment into [-1, 1]; NaN becomes neutral.
    pub fn new(symbol: &str, published: NaiveDate, headline: &str, sentiment: f64) -> Self {
        let sentiment = if sentiment.is_nan() {
            0.0
        } else {
            sentiment.clamp(-1.0, 1.0)
        };
        Self {
            symbol: symbol.to_string(),
            published,
            headline: headline.to_string(),
            sentiment,
        }
    }
}

pub fn mean_sentiment(items: &[NewsItem]) -> Option<f64> {
    if items.is_empty() {
        return None;
    }
    Some(items.iter().map(|n| n.sentiment).sum::<f64>() / items.len() as f64)
}
