pub mod crossover;
pub mod random;

use std::{str::FromStr, sync::Arc};

use ndarray::Array;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
    error::{DataError, TradegymResult},
    gym::trading::{action::ActionVector, observation::Observation},
};

/// Identifies an agent in leaderboards and logs.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Display,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentIdentifier {
    /// A custom user-defined agent.
    #[strum(to_string = "{0}")]
    Named(Arc<String>),

    #[default]
    Random,
}

impl AgentIdentifier {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(Arc::new(name.into()))
    }
}

/// A decision policy driven by the environment's observations.
///
/// Implementations may keep internal state across steps; `reset` is called
/// between episodes so state never leaks from one rollout into the next.
pub trait Agent {
    /// Decide the per-asset trade intensities for the current observation.
    fn act(&mut self, obs: &Observation) -> TradegymResult<ActionVector>;

    /// Name used in reports. Override for anything user-facing.
    fn identifier(&self) -> AgentIdentifier {
        AgentIdentifier::named("UnnamedAgent: override Agent::identifier()")
    }

    /// Clear per-episode state. The default is a no-op for stateless agents.
    fn reset(&mut self) {}
}

// ============================================================================
//  Search-space utilities
// ============================================================================

/// One axis of a hyperparameter grid.
///
/// Bounds and step are parsed from strings so the intended decimal
/// precision is explicit; generated values are rounded back to it, keeping
/// grid points exact instead of drifting through float accumulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridAxis {
    start: f64,
    end: f64,
    step: f64,
    precision: u32,
}

impl GridAxis {
    pub fn new(start: &str, end: &str, step: &str) -> TradegymResult<Self> {
        let precision = step.split('.').nth(1).map(|s| s.len() as u32).unwrap_or(0);

        Ok(Self {
            start: f64::from_str(start).map_err(DataError::from)?,
            end: f64::from_str(end).map_err(DataError::from)?,
            step: f64::from_str(step).map_err(DataError::from)?,
            precision,
        })
    }

    /// All grid points in `[start, end)`.
    pub fn generate(&self) -> Vec<f64> {
        let factor = 10f64.powi(self.precision as i32);

        Array::range(self.start, self.end, self.step)
            .iter()
            .map(|v| (v * factor).round() / factor)
            .collect()
    }
}
