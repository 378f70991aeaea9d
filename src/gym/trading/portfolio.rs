use serde::{Deserialize, Serialize};

use crate::{
    data::domain::MarketDay,
    gym::trading::config::{EnvConfig, StartMode},
};

/// Cash and holdings lifted out of a finished episode, used to seed a
/// continuation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub cash: f64,
    pub holdings: Vec<f64>,
}

/// The environment's mutable trading state: cash, per-asset holdings, and
/// the market features of the current day.
///
/// Owned exclusively by one environment instance and mutated only by the
/// execution engine and the day-advance roll. The flattened observation
/// layout is `[cash, prices(d), holdings(d), indicators(k·d)]` with the
/// indicator block indicator-major: all assets' values for the first
/// indicator, then the second, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    cash: f64,
    prices: Vec<f64>,
    holdings: Vec<f64>,
    indicators: Vec<f64>,
    /// Circuit-breaker flags; a halted asset ignores both buys and sells
    /// for the current step.
    halted: Vec<bool>,
}

impl Portfolio {
    /// Builds the day-0 portfolio for a new episode.
    ///
    /// Fresh mode seeds cash and holdings from the configuration;
    /// continuation mode carries both over from the previous run's snapshot.
    pub fn initiate(cfg: &EnvConfig, day0: &MarketDay) -> Self {
        let (cash, holdings) = match cfg.start() {
            StartMode::Fresh => (cfg.initial_amount(), cfg.initial_holdings().to_vec()),
            StartMode::Resume(snapshot) => (snapshot.cash, snapshot.holdings.clone()),
        };

        let mut portfolio = Self {
            cash,
            prices: Vec::with_capacity(cfg.stock_dim()),
            holdings,
            indicators: Vec::with_capacity(cfg.stock_dim() * cfg.indicator_list().len()),
            halted: vec![false; cfg.stock_dim()],
        };
        portfolio.refresh_market(day0);
        portfolio
    }

    /// Rolls the state onto the next trading day: post-trade cash and
    /// holdings stand, prices and indicators come from the new day.
    pub fn roll_forward(&mut self, day: &MarketDay) {
        self.refresh_market(day);
    }

    /// Current net worth: `cash + Σ price·holding`. Always recomputed from
    /// the vector so valuation can never drift from the trading state.
    pub fn total_valuation(&self) -> f64 {
        self.cash
            + self
                .prices
                .iter()
                .zip(&self.holdings)
                .map(|(p, h)| p * h)
                .sum::<f64>()
    }

    /// The flattened observation vector.
    pub fn flatten(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(1 + self.prices.len() + self.holdings.len() + self.indicators.len());
        out.push(self.cash);
        out.extend_from_slice(&self.prices);
        out.extend_from_slice(&self.holdings);
        out.extend_from_slice(&self.indicators);
        out
    }

    pub fn snapshot(&self) -> PortfolioSnapshot {
        PortfolioSnapshot {
            cash: self.cash,
            holdings: self.holdings.clone(),
        }
    }

    fn refresh_market(&mut self, day: &MarketDay) {
        self.prices.clear();
        self.prices.extend(day.prices());

        let num_indicators = day.rows.first().map_or(0, |r| r.indicators.len());
        self.indicators.clear();
        for indicator in 0..num_indicators {
            self.indicators
                .extend(day.rows.iter().map(|r| r.indicators[indicator]));
        }
    }
}

// ================================================================================================
// Trading-state access (used by the execution engine)
// ================================================================================================

impl Portfolio {
    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn price(&self, asset: usize) -> f64 {
        self.prices[asset]
    }

    pub fn holding(&self, asset: usize) -> f64 {
        self.holdings[asset]
    }

    pub fn holdings(&self) -> &[f64] {
        &self.holdings
    }

    pub fn is_halted(&self, asset: usize) -> bool {
        self.halted[asset]
    }

    pub(crate) fn set_halted(&mut self, asset: usize, halted: bool) {
        self.halted[asset] = halted;
    }

    /// Applies the day-level circuit breaker: when the day's turbulence
    /// score exceeds the threshold, every asset freezes for the step.
    pub(crate) fn apply_turbulence_gate(&mut self, turbulence: Option<f64>, threshold: f64) {
        let tripped = turbulence.is_some_and(|t| t > threshold);
        self.halted.iter_mut().for_each(|h| *h = tripped);
    }

    pub(crate) fn add_cash(&mut self, delta: f64) {
        self.cash += delta;
    }

    pub(crate) fn add_holding(&mut self, asset: usize, delta: f64) {
        self.holdings[asset] += delta;
    }
}
