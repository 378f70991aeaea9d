use serde::{Deserialize, Serialize};

use crate::math::stats;

/// Mixing weights of the three reward components.
///
/// `cost_penalty` scales the raw cumulative trading cost into the cost
/// component before the `cost` weight is applied, so the effective cost
/// coefficient is `cost_penalty * cost`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardWeights {
    /// Weight of the one-day portfolio return.
    pub gain: f64,
    /// Weight of the episode-to-date volatility penalty.
    pub risk: f64,
    /// Weight of the trading-cost penalty.
    pub cost: f64,
    /// Converts accumulated cost into the raw cost component.
    pub cost_penalty: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            gain: 0.5,
            risk: 0.2,
            cost: 0.1,
            cost_penalty: 0.1,
        }
    }
}

/// Scalar learning signal for one step.
///
/// * gain component — one-day relative change of total valuation, `0` when
///   no previous valuation exists or the divisor is degenerate;
/// * risk component — negative standard deviation of the episode-to-date
///   daily returns. A whole-episode quantity: noisy and near zero early,
///   increasingly informative as the history grows;
/// * cost component — negative *episode-cumulative* trading cost (see
///   [`crate::gym::trading::cursor::TradeAccumulator`]).
///
/// Degenerate inputs always fall back to `0`; the result is finite for any
/// reachable history.
pub(crate) fn step_reward(
    asset_values: &[f64],
    cumulative_cost: f64,
    weights: RewardWeights,
    reward_scaling: f64,
) -> f64 {
    let gain_component = match asset_values {
        [.., prev, curr] if prev.abs() > f64::EPSILON => (curr - prev) / prev,
        _ => 0.0,
    };

    let risk_component = if asset_values.len() > 1 {
        -stats::population_std(&stats::period_returns(asset_values))
    } else {
        0.0
    };

    let cost_component = -cumulative_cost * weights.cost_penalty;

    (gain_component * weights.gain + risk_component * weights.risk + cost_component * weights.cost)
        * reward_scaling
}
