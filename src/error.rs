use std::num::{ParseFloatError, ParseIntError};

use indicatif::style::TemplateError;
use thiserror::Error;

pub type TradegymResult<T> = Result<T, TradegymError>;

#[derive(Debug, Error)]
pub enum TradegymError {
    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    System(#[from] SystemError),
}

/// Errors occurring within agent logic.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Agent logic error: {0}")]
    Logic(String),

    #[error("Invalid input to agent: {0}")]
    InvalidInput(String),
}

/// Errors detected while validating an environment configuration.
///
/// All of these are raised at construction time, never during `step`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Length mismatch for `{field}`: expected {expected} entries, got {actual}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Indicator list must not be empty")]
    EmptyIndicatorList,

    #[error("Indicator layout mismatch between config and market data: {0}")]
    IndicatorMismatch(String),

    #[error("Invalid parameter `{field}`: {msg}")]
    InvalidParameter { field: &'static str, msg: String },

    #[error("Failed to encode configuration")]
    Encoding(#[from] postcard::Error),
}

/// Errors related to market data loading, shape, and availability.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Dataset contains no trading days")]
    EmptyDataset,

    #[error("Ragged day block at day {day}: expected {expected} rows, got {actual}")]
    RaggedDayBlock {
        day: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Ragged indicator row for asset {asset}: expected {expected} values, got {actual}")]
    RaggedIndicatorRow {
        asset: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Trading day {requested} out of range (last day is {last})")]
    DayOutOfRange { requested: usize, last: usize },

    #[error("Missing column '{0}' in input data")]
    MissingColumn(String),

    #[error("Asset '{ticker}' has {actual} rows but the panel spans {expected} days")]
    IncompletePanel {
        ticker: String,
        expected: usize,
        actual: usize,
    },

    #[error("Trading days not strictly increasing: {prev} followed by {next}")]
    UnorderedDates { prev: String, next: String },

    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Failed timestamp conversion: {0}")]
    DateParse(String),

    #[error("Failed to parse integer: {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("Failed to parse float: {0}")]
    ParseFloat(#[from] ParseFloatError),
}

/// Errors related to the gym environment contract.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("Invalid environment state: {0}")]
    InvalidState(String),

    #[error("Action dimension mismatch: environment trades {expected} assets, action has {actual}")]
    ActionDimension { expected: usize, actual: usize },

    #[error("Asset index {index} out of range for {assets} assets")]
    AssetIndex { index: usize, assets: usize },

    #[error("Progress bar error")]
    ProgressBar(#[from] TemplateError),
}

/// Errors related to file I/O and serialization.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Binary serialization failed")]
    Postcard(#[from] postcard::Error),

    #[error("JSON serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),
}

/// Errors related to internal invariants. Hitting one of these is a bug,
/// not a recoverable condition.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(String),

    #[error("Missing internal field: {0}")]
    MissingField(String),
}
