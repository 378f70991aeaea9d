use rand::{Rng, rngs::ThreadRng};
use serde::{Deserialize, Serialize};

/// Per-asset trade intensity in `[-1, 1]`: negative sells, positive buys,
/// magnitude scaled by the environment's `hmax` into a share count.
///
/// Out-of-range values are accepted and simply behave like aggressive
/// requests the execution engine clamps to feasibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionVector(Vec<f64>);

impl ActionVector {
    pub fn new(intensities: Vec<f64>) -> Self {
        Self(intensities)
    }

    /// The do-nothing action.
    pub fn hold(stock_dim: usize) -> Self {
        Self(vec![0.0; stock_dim])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for ActionVector {
    fn from(v: Vec<f64>) -> Self {
        Self(v)
    }
}

/// Uniform sampler over the action box, for exploration baselines and
/// smoke tests.
#[derive(Debug)]
pub struct ActionSpace {
    stock_dim: usize,
    rng: ThreadRng,
}

impl ActionSpace {
    pub fn new(stock_dim: usize) -> Self {
        Self {
            stock_dim,
            rng: rand::rng(),
        }
    }

    pub fn sample(&mut self) -> ActionVector {
        let intensities = (0..self.stock_dim)
            .map(|_| self.rng.random_range(-1.0..=1.0))
            .collect();
        ActionVector(intensities)
    }
}
