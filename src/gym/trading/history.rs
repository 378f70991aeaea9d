use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Append-only record of one episode.
///
/// `asset_values` and `dates` are seeded with the day-0 entry on reset and
/// then grow by exactly one element per non-terminal step, in lockstep with
/// `rewards` and `actions` (which start empty).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeHistory {
    asset_values: Vec<f64>,
    rewards: Vec<f64>,
    actions: Vec<Vec<f64>>,
    dates: Vec<NaiveDate>,
}

impl EpisodeHistory {
    /// Clears everything and seeds day 0.
    pub(crate) fn reseed(&mut self, initial_value: f64, date: NaiveDate) {
        self.asset_values.clear();
        self.rewards.clear();
        self.actions.clear();
        self.dates.clear();

        self.asset_values.push(initial_value);
        self.dates.push(date);
    }

    pub(crate) fn push_valuation(&mut self, value: f64, date: NaiveDate) {
        self.asset_values.push(value);
        self.dates.push(date);
    }

    pub(crate) fn push_reward(&mut self, reward: f64) {
        self.rewards.push(reward);
    }

    pub(crate) fn push_action(&mut self, action: Vec<f64>) {
        self.actions.push(action);
    }

    pub fn asset_values(&self) -> &[f64] {
        &self.asset_values
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn actions(&self) -> &[Vec<f64>] {
        &self.actions
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of recorded trading days, including the seed entry.
    pub fn len(&self) -> usize {
        self.asset_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asset_values.is_empty()
    }

    pub fn cumulative_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }

    pub fn final_value(&self) -> Option<f64> {
        self.asset_values.last().copied()
    }
}
