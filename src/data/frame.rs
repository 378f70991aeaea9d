use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    data::{
        domain::{MarketDay, Ticker},
        indicator::TechnicalIndicator,
    },
    error::{DataError, IoError, TradegymResult},
};

/// The in-memory market data panel backing an environment.
///
/// One contiguous block of rows per trading day, every block exactly
/// `num_assets` rows, rows positionally aligned with `tickers`. The frame is
/// immutable after construction; environments hold it behind an `Arc` and
/// index it by day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFrame {
    tickers: Vec<Ticker>,
    indicator_list: Vec<TechnicalIndicator>,
    days: Vec<MarketDay>,
}

impl MarketFrame {
    pub fn builder() -> MarketFrameBuilder {
        MarketFrameBuilder::default()
    }

    /// The market snapshot for `day`, valid for `day in [0, last_day]`.
    ///
    /// An out-of-range index is a caller bug: the episode controller gates
    /// every advance on its terminal check before asking for data.
    pub fn get_day(&self, day: usize) -> TradegymResult<&MarketDay> {
        self.days.get(day).ok_or_else(|| {
            DataError::DayOutOfRange {
                requested: day,
                last: self.last_day(),
            }
            .into()
        })
    }

    /// Index of the final trading day.
    pub fn last_day(&self) -> usize {
        self.days.len().saturating_sub(1)
    }

    pub fn num_days(&self) -> usize {
        self.days.len()
    }

    pub fn num_assets(&self) -> usize {
        self.tickers.len()
    }

    pub fn num_indicators(&self) -> usize {
        self.indicator_list.len()
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn indicator_list(&self) -> &[TechnicalIndicator] {
        &self.indicator_list
    }

    /// Deterministic content hash, used as the cache file stem.
    pub fn hash(&self) -> TradegymResult<String> {
        let bytes = postcard::to_stdvec(self).map_err(IoError::Postcard)?;
        Ok(blake3::hash(&bytes).to_string())
    }

    /// Writes the frame to `<dir>/<hash>.postcard` and returns the path.
    ///
    /// Lets repeated runs skip the feature-engineering pass entirely.
    pub fn cache(&self, dir: &Path) -> TradegymResult<PathBuf> {
        let path = dir.join(format!("{}.postcard", self.hash()?));
        let bytes = postcard::to_stdvec(self).map_err(IoError::Postcard)?;
        fs::write(&path, bytes).map_err(IoError::Io)?;
        Ok(path)
    }

    /// Reads a frame previously written by [`MarketFrame::cache`].
    pub fn load(path: &Path) -> TradegymResult<Self> {
        let bytes = fs::read(path).map_err(IoError::Io)?;
        let frame: Self = postcard::from_bytes(&bytes).map_err(IoError::Postcard)?;
        if frame.days.is_empty() {
            return Err(DataError::EmptyDataset.into());
        }
        Ok(frame)
    }
}

/// Validating constructor for [`MarketFrame`].
#[derive(Debug, Default)]
pub struct MarketFrameBuilder {
    tickers: Vec<Ticker>,
    indicator_list: Vec<TechnicalIndicator>,
    days: Vec<MarketDay>,
}

impl MarketFrameBuilder {
    pub fn with_tickers(self, tickers: Vec<Ticker>) -> Self {
        Self { tickers, ..self }
    }

    pub fn with_indicator_list(self, indicator_list: Vec<TechnicalIndicator>) -> Self {
        Self {
            indicator_list,
            ..self
        }
    }

    pub fn push_day(mut self, day: MarketDay) -> Self {
        self.days.push(day);
        self
    }

    pub fn with_days(self, days: Vec<MarketDay>) -> Self {
        Self { days, ..self }
    }

    pub fn build(self) -> TradegymResult<MarketFrame> {
        if self.days.is_empty() {
            return Err(DataError::EmptyDataset.into());
        }

        for (idx, day) in self.days.iter().enumerate() {
            if day.rows.len() != self.tickers.len() {
                return Err(DataError::RaggedDayBlock {
                    day: idx,
                    expected: self.tickers.len(),
                    actual: day.rows.len(),
                }
                .into());
            }
            for (asset, row) in day.rows.iter().enumerate() {
                if row.indicators.len() != self.indicator_list.len() {
                    return Err(DataError::RaggedIndicatorRow {
                        asset,
                        expected: self.indicator_list.len(),
                        actual: row.indicators.len(),
                    }
                    .into());
                }
            }
        }

        for pair in self.days.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(DataError::UnorderedDates {
                    prev: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                }
                .into());
            }
        }

        Ok(MarketFrame {
            tickers: self.tickers,
            indicator_list: self.indicator_list,
            days: self.days,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::domain::MarketRow;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn row(price: f64, indicators: &[f64]) -> MarketRow {
        MarketRow {
            price,
            indicators: indicators.to_vec(),
        }
    }

    fn two_asset_frame() -> MarketFrame {
        MarketFrame::builder()
            .with_tickers(vec!["AAA".into(), "BBB".into()])
            .with_indicator_list(vec![TechnicalIndicator::sma(2)])
            .push_day(MarketDay {
                date: date(1),
                turbulence: None,
                rows: vec![row(10.0, &[9.5]), row(20.0, &[19.5])],
            })
            .push_day(MarketDay {
                date: date(2),
                turbulence: Some(0.4),
                rows: vec![row(11.0, &[10.5]), row(19.0, &[19.4])],
            })
            .build()
            .unwrap()
    }

    #[test]
    fn builder_accepts_uniform_blocks() {
        let frame = two_asset_frame();
        assert_eq!(frame.num_days(), 2);
        assert_eq!(frame.num_assets(), 2);
        assert_eq!(frame.num_indicators(), 1);
        assert_eq!(frame.last_day(), 1);
    }

    #[test]
    fn builder_rejects_empty_dataset() {
        let err = MarketFrame::builder()
            .with_tickers(vec!["AAA".into()])
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("no trading days"));
    }

    #[test]
    fn builder_rejects_ragged_day_block() {
        let err = MarketFrame::builder()
            .with_tickers(vec!["AAA".into(), "BBB".into()])
            .push_day(MarketDay {
                date: date(1),
                turbulence: None,
                rows: vec![row(10.0, &[])],
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Ragged day block"));
    }

    #[test]
    fn builder_rejects_ragged_indicator_row() {
        let err = MarketFrame::builder()
            .with_tickers(vec!["AAA".into()])
            .with_indicator_list(vec![TechnicalIndicator::sma(2), TechnicalIndicator::rsi(14)])
            .push_day(MarketDay {
                date: date(1),
                turbulence: None,
                rows: vec![row(10.0, &[1.0])],
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Ragged indicator row"));
    }

    #[test]
    fn builder_rejects_unordered_dates() {
        let err = MarketFrame::builder()
            .with_tickers(vec!["AAA".into()])
            .push_day(MarketDay {
                date: date(2),
                turbulence: None,
                rows: vec![row(10.0, &[])],
            })
            .push_day(MarketDay {
                date: date(1),
                turbulence: None,
                rows: vec![row(11.0, &[])],
            })
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not strictly increasing"));
    }

    #[test]
    fn get_day_gates_on_range() {
        let frame = two_asset_frame();
        assert!(frame.get_day(1).is_ok());
        assert!(frame.get_day(2).is_err());
    }

    #[test]
    fn cache_round_trip_preserves_frame() {
        let frame = two_asset_frame();
        let dir = tempfile::tempdir().unwrap();

        let path = frame.cache(dir.path()).unwrap();
        assert!(path.file_name().unwrap().to_string_lossy().ends_with(".postcard"));

        let loaded = MarketFrame::load(&path).unwrap();
        assert_eq!(loaded, frame);
    }

    #[test]
    fn hash_is_content_addressed() {
        let a = two_asset_frame();
        let b = two_asset_frame();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());
    }
}
