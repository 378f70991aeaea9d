use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::indicator::{StreamingEma, StreamingIndicator, StreamingRsi, StreamingSma};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SmaWindow(pub u16);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmaWindow(pub u16);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RsiWindow(pub u16);

/// A technical indicator slot in the observation vector.
///
/// The order of a `Vec<TechnicalIndicator>` is load-bearing: it defines the
/// layout of the indicator block in every observation the environment emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TechnicalIndicator {
    Sma(SmaWindow),
    Ema(EmaWindow),
    Rsi(RsiWindow),
}

impl TechnicalIndicator {
    pub fn sma(window: u16) -> Self {
        Self::Sma(SmaWindow(window))
    }

    pub fn ema(window: u16) -> Self {
        Self::Ema(EmaWindow(window))
    }

    pub fn rsi(window: u16) -> Self {
        Self::Rsi(RsiWindow(window))
    }

    /// Instantiates the streaming computation backing this indicator.
    pub(crate) fn streaming(&self) -> Box<dyn StreamingIndicator> {
        match self {
            Self::Sma(w) => Box::new(StreamingSma::new(w.0)),
            Self::Ema(w) => Box::new(StreamingEma::new(w.0)),
            Self::Rsi(w) => Box::new(StreamingRsi::new(w.0)),
        }
    }
}

impl fmt::Display for TechnicalIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sma(w) => write!(f, "sma_{}", w.0),
            Self::Ema(w) => write!(f, "ema_{}", w.0),
            Self::Rsi(w) => write!(f, "rsi_{}", w.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_encodes_kind_and_window() {
        assert_eq!(TechnicalIndicator::sma(30).to_string(), "sma_30");
        assert_eq!(TechnicalIndicator::ema(12).to_string(), "ema_12");
        assert_eq!(TechnicalIndicator::rsi(14).to_string(), "rsi_14");
    }

    #[test]
    fn streaming_instances_warm_up_independently() {
        let list = [TechnicalIndicator::sma(2), TechnicalIndicator::ema(2)];
        let mut instances: Vec<_> = list.iter().map(|i| i.streaming()).collect();

        let first: Vec<_> = instances.iter_mut().map(|i| i.update(10.0)).collect();
        let second: Vec<_> = instances.iter_mut().map(|i| i.update(12.0)).collect();

        assert_eq!(first, vec![None, None]);
        assert!(second.iter().all(Option::is_some));
    }
}
