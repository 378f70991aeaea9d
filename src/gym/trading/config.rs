use serde::{Deserialize, Serialize};

use crate::{
    data::{frame::MarketFrame, indicator::TechnicalIndicator},
    error::{ConfigError, TradegymResult},
    gym::trading::{portfolio::PortfolioSnapshot, reward::RewardWeights},
};

/// How an episode seeds its portfolio on `reset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum StartMode {
    /// Start from `initial_amount` cash and the configured holdings.
    #[default]
    Fresh,

    /// Continue from the terminal portfolio of a previous run. Cash and
    /// holdings carry over; the market restarts at day 0 of the new frame.
    Resume(PortfolioSnapshot),
}

/// Immutable per-episode configuration of a trading environment.
///
/// Validated once at construction; every per-asset sequence must have
/// exactly `stock_dim` entries. All builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvConfig {
    stock_dim: usize,

    /// Shares traded by one full-intensity action (`±1.0`).
    hmax: f64,

    /// Seed cash for fresh episodes.
    initial_amount: f64,

    /// Seed holdings for fresh episodes, one entry per asset.
    initial_holdings: Vec<f64>,

    /// Fractional fee charged on buys, one entry per asset.
    buy_cost_pct: Vec<f64>,

    /// Fractional fee charged on sells, one entry per asset.
    sell_cost_pct: Vec<f64>,

    /// Scales rewards into a range friendly to policy-gradient learners.
    reward_scaling: f64,

    /// Defines the indicator block layout of every observation.
    indicator_list: Vec<TechnicalIndicator>,

    /// Enables the trading circuit breaker: assets freeze for a step when
    /// the day's turbulence score exceeds this threshold.
    turbulence_threshold: Option<f64>,

    reward_weights: RewardWeights,

    start: StartMode,
}

impl EnvConfig {
    pub fn new(
        stock_dim: usize,
        initial_amount: f64,
        indicator_list: Vec<TechnicalIndicator>,
    ) -> Self {
        Self {
            stock_dim,
            hmax: 100.0,
            initial_amount,
            initial_holdings: vec![0.0; stock_dim],
            buy_cost_pct: vec![0.001; stock_dim],
            sell_cost_pct: vec![0.001; stock_dim],
            reward_scaling: 1e-4,
            indicator_list,
            turbulence_threshold: None,
            reward_weights: RewardWeights::default(),
            start: StartMode::Fresh,
        }
    }
}

// ================================================================================================
// Builder Methods
// ================================================================================================

impl EnvConfig {
    pub fn with_hmax(self, hmax: f64) -> Self {
        Self { hmax, ..self }
    }

    pub fn with_initial_holdings(self, initial_holdings: Vec<f64>) -> Self {
        Self {
            initial_holdings,
            ..self
        }
    }

    pub fn with_buy_cost_pct(self, buy_cost_pct: Vec<f64>) -> Self {
        Self {
            buy_cost_pct,
            ..self
        }
    }

    pub fn with_sell_cost_pct(self, sell_cost_pct: Vec<f64>) -> Self {
        Self {
            sell_cost_pct,
            ..self
        }
    }

    /// Applies the same fractional fee to every asset on both sides.
    pub fn with_flat_cost_pct(self, pct: f64) -> Self {
        let dim = self.stock_dim;
        Self {
            buy_cost_pct: vec![pct; dim],
            sell_cost_pct: vec![pct; dim],
            ..self
        }
    }

    pub fn with_reward_scaling(self, reward_scaling: f64) -> Self {
        Self {
            reward_scaling,
            ..self
        }
    }

    pub fn with_reward_weights(self, reward_weights: RewardWeights) -> Self {
        Self {
            reward_weights,
            ..self
        }
    }

    pub fn with_turbulence_threshold(self, threshold: f64) -> Self {
        Self {
            turbulence_threshold: Some(threshold),
            ..self
        }
    }

    /// Switches the episode seed to continuation mode.
    pub fn resuming_from(self, snapshot: PortfolioSnapshot) -> Self {
        Self {
            start: StartMode::Resume(snapshot),
            ..self
        }
    }
}

// ================================================================================================
// Accessors
// ================================================================================================

impl EnvConfig {
    pub fn stock_dim(&self) -> usize {
        self.stock_dim
    }

    pub fn hmax(&self) -> f64 {
        self.hmax
    }

    pub fn initial_amount(&self) -> f64 {
        self.initial_amount
    }

    pub fn initial_holdings(&self) -> &[f64] {
        &self.initial_holdings
    }

    pub fn buy_cost_pct(&self) -> &[f64] {
        &self.buy_cost_pct
    }

    pub fn sell_cost_pct(&self) -> &[f64] {
        &self.sell_cost_pct
    }

    pub fn reward_scaling(&self) -> f64 {
        self.reward_scaling
    }

    pub fn indicator_list(&self) -> &[TechnicalIndicator] {
        &self.indicator_list
    }

    pub fn turbulence_threshold(&self) -> Option<f64> {
        self.turbulence_threshold
    }

    pub fn reward_weights(&self) -> RewardWeights {
        self.reward_weights
    }

    pub fn start(&self) -> &StartMode {
        &self.start
    }

    /// Flattened observation width: cash + prices + holdings + indicators.
    pub fn observation_width(&self) -> usize {
        1 + 2 * self.stock_dim + self.stock_dim * self.indicator_list.len()
    }
}

// ================================================================================================
// Validation & Hashing
// ================================================================================================

impl EnvConfig {
    /// Checks internal consistency. Called by the environment constructor so
    /// misconfiguration surfaces before the first step, never during one.
    pub fn validate(&self) -> TradegymResult<()> {
        if self.indicator_list.is_empty() {
            return Err(ConfigError::EmptyIndicatorList.into());
        }

        self.check_len("initial_holdings", self.initial_holdings.len())?;
        self.check_len("buy_cost_pct", self.buy_cost_pct.len())?;
        self.check_len("sell_cost_pct", self.sell_cost_pct.len())?;
        if let StartMode::Resume(snapshot) = &self.start {
            self.check_len("previous holdings", snapshot.holdings.len())?;
        }

        if !(self.hmax > 0.0) {
            return Err(invalid("hmax", "must be positive"));
        }
        if self.initial_amount < 0.0 {
            return Err(invalid("initial_amount", "must be non-negative"));
        }
        if !(self.reward_scaling > 0.0) {
            return Err(invalid("reward_scaling", "must be positive"));
        }
        if self.buy_cost_pct.iter().chain(&self.sell_cost_pct).any(|&p| !(0.0..1.0).contains(&p)) {
            return Err(invalid("cost_pct", "fees must lie in [0, 1)"));
        }

        Ok(())
    }

    /// Checks that this configuration matches the frame it will trade on.
    pub fn validate_against(&self, frame: &MarketFrame) -> TradegymResult<()> {
        self.validate()?;

        if frame.num_assets() != self.stock_dim {
            return Err(ConfigError::LengthMismatch {
                field: "stock_dim",
                expected: frame.num_assets(),
                actual: self.stock_dim,
            }
            .into());
        }
        if frame.indicator_list() != self.indicator_list {
            return Err(ConfigError::IndicatorMismatch(format!(
                "config expects {:?}, frame carries {:?}",
                self.indicator_list,
                frame.indicator_list()
            ))
            .into());
        }
        Ok(())
    }

    /// Deterministic configuration hash, used to key caches and runs.
    pub fn hash(&self) -> TradegymResult<String> {
        let bytes = postcard::to_stdvec(self).map_err(ConfigError::Encoding)?;
        Ok(blake3::hash(&bytes).to_string())
    }

    fn check_len(&self, field: &'static str, actual: usize) -> TradegymResult<()> {
        if actual != self.stock_dim {
            return Err(ConfigError::LengthMismatch {
                field,
                expected: self.stock_dim,
                actual,
            }
            .into());
        }
        Ok(())
    }
}

fn invalid(field: &'static str, msg: &str) -> crate::TradegymError {
    ConfigError::InvalidParameter {
        field,
        msg: msg.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> EnvConfig {
        EnvConfig::new(2, 10_000.0, vec![TechnicalIndicator::sma(2)])
    }

    #[test]
    fn default_shape_is_consistent() {
        let cfg = base();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.observation_width(), 1 + 4 + 2);
    }

    #[test]
    fn rejects_empty_indicator_list() {
        let cfg = EnvConfig::new(2, 10_000.0, vec![]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_cost_vector_length_mismatch() {
        let cfg = base().with_buy_cost_pct(vec![0.001]);
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("buy_cost_pct"));
    }

    #[test]
    fn rejects_holdings_length_mismatch() {
        let cfg = base().with_initial_holdings(vec![0.0; 3]);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_fees() {
        let cfg = base().with_flat_cost_pct(1.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_resume_snapshot_with_wrong_dimension() {
        let cfg = base().resuming_from(PortfolioSnapshot {
            cash: 1_000.0,
            holdings: vec![1.0],
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn hash_is_stable_and_sensitive() {
        let a = base();
        let b = base();
        assert_eq!(a.hash().unwrap(), b.hash().unwrap());

        let c = base().with_hmax(50.0);
        assert_ne!(a.hash().unwrap(), c.hash().unwrap());
    }
}
