use crate::{
    agent::{Agent, AgentIdentifier},
    error::{AgentError, TradegymResult},
    gym::trading::{action::ActionVector, observation::Observation},
};

/// Classic dual-moving-average policy over the observation's indicator
/// block.
///
/// For every asset: fast average above slow → accumulate, below → unwind,
/// equal → hold. `fast` and `slow` are positions in the environment's
/// indicator list, so the same agent works against any pair of trend
/// indicators the feature pipeline provides. `intensity` sets how hard the
/// agent leans into a signal and is a natural grid-search axis.
#[derive(Debug, Clone)]
pub struct SmaCrossoverAgent {
    fast: usize,
    slow: usize,
    intensity: f64,
    identifier: AgentIdentifier,
}

impl SmaCrossoverAgent {
    pub fn new(fast: usize, slow: usize, intensity: f64) -> TradegymResult<Self> {
        if fast == slow {
            return Err(AgentError::InvalidInput(
                "fast and slow must reference different indicator slots".to_string(),
            )
            .into());
        }
        if !(0.0..=1.0).contains(&intensity) {
            return Err(AgentError::InvalidInput(format!(
                "intensity must lie in [0, 1], got {intensity}"
            ))
            .into());
        }

        Ok(Self {
            fast,
            slow,
            intensity,
            identifier: AgentIdentifier::named(format!("sma-crossover-{fast}-{slow}-{intensity}")),
        })
    }
}

impl Agent for SmaCrossoverAgent {
    fn act(&mut self, obs: &Observation) -> TradegymResult<ActionVector> {
        if self.fast >= obs.num_indicators() || self.slow >= obs.num_indicators() {
            return Err(AgentError::InvalidInput(format!(
                "indicator slots ({}, {}) out of range for {} indicators",
                self.fast,
                self.slow,
                obs.num_indicators()
            ))
            .into());
        }

        let intensities = (0..obs.stock_dim())
            .map(|asset| {
                let fast = obs.indicator(self.fast, asset);
                let slow = obs.indicator(self.slow, asset);
                if fast > slow {
                    self.intensity
                } else if fast < slow {
                    -self.intensity
                } else {
                    0.0
                }
            })
            .collect();

        Ok(ActionVector::new(intensities))
    }

    fn identifier(&self) -> AgentIdentifier {
        self.identifier.clone()
    }
}
