use std::collections::{BTreeMap, BTreeSet};

use tracing::info;

use crate::{
    data::{
        domain::{Candle, MarketDay, MarketRow, Ticker},
        frame::MarketFrame,
        indicator::TechnicalIndicator,
    },
    error::{DataError, TradegymResult},
    math::indicator::TurbulenceIndex,
};

/// Turns a raw long-format candle panel into the enriched [`MarketFrame`]
/// the environment consumes.
///
/// Assets are ordered by ticker, days by date; both orders are fixed for the
/// lifetime of the frame. Indicator slots before warm-up are filled with
/// `0.0` so every day block has identical shape.
#[derive(Debug, Clone)]
pub struct FeatureEngineer {
    indicators: Vec<TechnicalIndicator>,
    turbulence_window: Option<u16>,
}

impl FeatureEngineer {
    pub fn new(indicators: Vec<TechnicalIndicator>) -> Self {
        Self {
            indicators,
            turbulence_window: None,
        }
    }

    /// Enables the day-level turbulence score with the given rolling window.
    pub fn with_turbulence(self, window: u16) -> Self {
        Self {
            turbulence_window: Some(window),
            ..self
        }
    }

    pub fn enrich(&self, candles: &[Candle]) -> TradegymResult<MarketFrame> {
        if candles.is_empty() {
            return Err(DataError::EmptyDataset.into());
        }

        let dates: BTreeSet<_> = candles.iter().map(|c| c.date).collect();
        let mut closes_by_ticker: BTreeMap<Ticker, BTreeMap<_, f64>> = BTreeMap::new();
        for candle in candles {
            closes_by_ticker
                .entry(candle.ticker.clone())
                .or_default()
                .insert(candle.date, candle.close);
        }

        // Every asset must quote on every day; a gapped panel would desync
        // the positional day blocks.
        for (ticker, closes) in &closes_by_ticker {
            if closes.len() != dates.len() {
                return Err(DataError::IncompletePanel {
                    ticker: ticker.to_string(),
                    expected: dates.len(),
                    actual: closes.len(),
                }
                .into());
            }
        }

        let tickers: Vec<Ticker> = closes_by_ticker.keys().cloned().collect();

        // closes[asset][day], in the fixed orders established above.
        let closes: Vec<Vec<f64>> = closes_by_ticker
            .values()
            .map(|by_date| by_date.values().copied().collect())
            .collect();

        let indicator_values = self.compute_indicators(&closes);
        let turbulence = self.compute_turbulence(&closes, dates.len());

        let mut builder = MarketFrame::builder()
            .with_tickers(tickers.clone())
            .with_indicator_list(self.indicators.clone());

        for (day_idx, date) in dates.iter().enumerate() {
            let rows = (0..tickers.len())
                .map(|asset| MarketRow {
                    price: closes[asset][day_idx],
                    indicators: indicator_values[asset][day_idx].clone(),
                })
                .collect();
            builder = builder.push_day(MarketDay {
                date: *date,
                turbulence: turbulence.as_ref().map(|t| t[day_idx]),
                rows,
            });
        }

        let frame = builder.build()?;
        info!(
            assets = frame.num_assets(),
            days = frame.num_days(),
            indicators = frame.num_indicators(),
            "Feature engineering complete"
        );
        Ok(frame)
    }

    /// `result[asset][day]` = indicator values in list order, 0.0 until warm.
    fn compute_indicators(&self, closes: &[Vec<f64>]) -> Vec<Vec<Vec<f64>>> {
        closes
            .iter()
            .map(|series| {
                let mut streams: Vec<_> = self.indicators.iter().map(|i| i.streaming()).collect();
                series
                    .iter()
                    .map(|&close| {
                        streams
                            .iter_mut()
                            .map(|s| s.update(close).unwrap_or(0.0))
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Day-level turbulence series, 0.0 until the rolling window is warm.
    fn compute_turbulence(&self, closes: &[Vec<f64>], num_days: usize) -> Option<Vec<f64>> {
        let window = self.turbulence_window?;
        let mut index = TurbulenceIndex::new(window, closes.len());

        let series = (0..num_days)
            .map(|day| {
                let todays: Vec<f64> = closes.iter().map(|asset| asset[day]).collect();
                index.update(&todays).unwrap_or(0.0)
            })
            .collect();
        Some(series)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn candle(ticker: &str, day: u32, close: f64) -> Candle {
        Candle {
            ticker: ticker.into(),
            date: date(day),
            close,
        }
    }

    fn panel() -> Vec<Candle> {
        let mut candles = Vec::new();
        for day in 1..=5 {
            candles.push(candle("MSFT", day, 100.0 + day as f64));
            candles.push(candle("AAPL", day, 50.0 + day as f64));
        }
        candles
    }

    #[test]
    fn enrich_orders_assets_by_ticker() {
        let frame = FeatureEngineer::new(vec![]).enrich(&panel()).unwrap();
        let names: Vec<String> = frame.tickers().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);

        // AAPL (asset 0) closed at 51 on the first day.
        let day0 = frame.get_day(0).unwrap();
        assert_eq!(day0.rows[0].price, 51.0);
        assert_eq!(day0.rows[1].price, 101.0);
    }

    #[test]
    fn enrich_fills_unwarm_indicators_with_zero() {
        let frame = FeatureEngineer::new(vec![TechnicalIndicator::sma(3)])
            .enrich(&panel())
            .unwrap();

        let day0 = frame.get_day(0).unwrap();
        assert_eq!(day0.rows[0].indicators, vec![0.0]);

        // Day 2 (third observation) is the first warm SMA(3) value.
        let day2 = frame.get_day(2).unwrap();
        assert_eq!(day2.rows[0].indicators, vec![52.0]);
        assert_eq!(day2.rows[1].indicators, vec![102.0]);
    }

    #[test]
    fn enrich_rejects_gapped_panel() {
        let mut candles = panel();
        candles.retain(|c| !(c.ticker.0 == "AAPL" && c.date == date(3)));

        let err = FeatureEngineer::new(vec![]).enrich(&candles).unwrap_err();
        assert!(err.to_string().contains("AAPL"));
    }

    #[test]
    fn enrich_rejects_empty_input() {
        assert!(FeatureEngineer::new(vec![]).enrich(&[]).is_err());
    }

    #[test]
    fn turbulence_is_attached_when_configured() {
        let frame = FeatureEngineer::new(vec![])
            .with_turbulence(2)
            .enrich(&panel())
            .unwrap();

        assert!(frame.get_day(0).unwrap().turbulence.is_some());
        // Warm by day 3 at the latest (window 2 plus one return lag).
        assert!(frame.get_day(4).unwrap().turbulence.is_some());
    }

    #[test]
    fn turbulence_is_absent_by_default() {
        let frame = FeatureEngineer::new(vec![]).enrich(&panel()).unwrap();
        assert_eq!(frame.get_day(0).unwrap().turbulence, None);
    }
}
