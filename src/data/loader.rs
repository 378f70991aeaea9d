use std::path::Path;

use chrono::NaiveDate;
use itertools::izip;
use polars::{
    error::PolarsError,
    frame::DataFrame,
    prelude::{LazyCsvReader, LazyFileListReader, PlPath},
};
use tracing::info;

use crate::{
    data::domain::{Candle, Ticker},
    error::{DataError, TradegymError, TradegymResult},
};

/// Column names of the long-format input panel: one row per (day, asset).
const DATE_COL: &str = "date";
const TIC_COL: &str = "tic";
const CLOSE_COL: &str = "close";

/// Reads a raw market data CSV into candles.
///
/// Expected schema: `date` (ISO-8601), `tic`, `close`. Additional columns
/// are ignored; the feature pipeline recomputes everything it needs from
/// closes.
pub fn read_candles_csv(path: &Path) -> TradegymResult<Vec<Candle>> {
    let df = LazyCsvReader::new(PlPath::new(&path.to_string_lossy()))
        .with_has_header(true)
        .finish()
        .map_err(polars_to_tradegym_error)?
        .collect()
        .map_err(polars_to_tradegym_error)?;

    let candles = candles_from_df(&df)?;
    info!(rows = candles.len(), path = %path.display(), "Loaded market data");
    Ok(candles)
}

/// Extracts candles from an already-materialized data frame.
pub fn candles_from_df(df: &DataFrame) -> TradegymResult<Vec<Candle>> {
    let dates = df
        .column(DATE_COL)
        .map_err(|_| DataError::MissingColumn(DATE_COL.to_string()))?
        .str()
        .map_err(polars_to_tradegym_error)?;
    let tics = df
        .column(TIC_COL)
        .map_err(|_| DataError::MissingColumn(TIC_COL.to_string()))?
        .str()
        .map_err(polars_to_tradegym_error)?;
    let closes = df
        .column(CLOSE_COL)
        .map_err(|_| DataError::MissingColumn(CLOSE_COL.to_string()))?
        .f64()
        .map_err(polars_to_tradegym_error)?;

    izip!(dates.into_iter(), tics.into_iter(), closes.into_iter())
        .map(|(date, tic, close)| {
            let (date, tic, close) = match (date, tic, close) {
                (Some(d), Some(t), Some(c)) => (d, t, c),
                _ => {
                    return Err(DataError::DataFrame(
                        "null value in market data row".to_string(),
                    )
                    .into());
                }
            };
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| DataError::DateParse(format!("'{date}': {e}")))?;
            Ok(Candle {
                ticker: Ticker(tic.to_string()),
                date,
                close,
            })
        })
        .collect()
}

fn polars_to_tradegym_error(e: PolarsError) -> TradegymError {
    DataError::DataFrame(e.to_string()).into()
}
