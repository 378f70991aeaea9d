use crate::{
    agent::{Agent, AgentIdentifier},
    error::TradegymResult,
    gym::trading::{action::ActionSpace, action::ActionVector, observation::Observation},
};

/// Uniform-random policy. The exploration floor every learned policy has
/// to beat, and a convenient smoke-test driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAgent;

impl Agent for RandomAgent {
    fn act(&mut self, obs: &Observation) -> TradegymResult<ActionVector> {
        // The sampler wraps a thread-local RNG, so it is built per call
        // rather than stored; this keeps the agent `Send` for parallel
        // evaluation.
        Ok(ActionSpace::new(obs.stock_dim()).sample())
    }

    fn identifier(&self) -> AgentIdentifier {
        AgentIdentifier::Random
    }
}
