use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Exchange symbol of one tradable asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticker(pub String);

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One raw input observation: closing price of one asset on one day.
///
/// This is the shape the loader produces before feature engineering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub ticker: Ticker,
    pub date: NaiveDate,
    pub close: f64,
}

/// One asset on one day, enriched with indicator values.
///
/// Immutable once produced; `indicators` is ordered by the owning frame's
/// indicator list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRow {
    pub price: f64,
    pub indicators: Vec<f64>,
}

/// All assets on one trading day, ordered by the frame's fixed asset index.
///
/// `turbulence` is a day-level market stress score shared by every asset;
/// `None` when the feature pipeline did not compute one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDay {
    pub date: NaiveDate,
    pub turbulence: Option<f64>,
    pub rows: Vec<MarketRow>,
}

impl MarketDay {
    pub fn num_assets(&self) -> usize {
        self.rows.len()
    }

    /// Per-asset closing prices in asset-index order.
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|r| r.price)
    }
}
