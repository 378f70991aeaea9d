use chrono::NaiveDate;
use polars::{df, frame::DataFrame};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    error::{DataError, TradegymResult},
    gym::trading::history::EpisodeHistory,
    math::stats,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum JournalCol {
    Date,
    AccountValue,
    Reward,
}

impl JournalCol {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The account curve of one episode, ready for analysis and export.
///
/// Day 0 carries the seed valuation and a zero reward placeholder so all
/// columns align row-for-row with trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    dates: Vec<NaiveDate>,
    account_values: Vec<f64>,
    rewards: Vec<f64>,
}

impl Journal {
    pub fn new(history: &EpisodeHistory) -> TradegymResult<Self> {
        let mut rewards = Vec::with_capacity(history.len());
        rewards.push(0.0);
        rewards.extend_from_slice(history.rewards());

        Ok(Self {
            dates: history.dates().to_vec(),
            account_values: history.asset_values().to_vec(),
            rewards,
        })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn account_values(&self) -> &[f64] {
        &self.account_values
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    pub fn as_df(&self) -> TradegymResult<DataFrame> {
        let dates: Vec<String> = self.dates.iter().map(|d| d.to_string()).collect();

        df![
            JournalCol::Date.to_string() => dates,
            JournalCol::AccountValue.to_string() => self.account_values.clone(),
            JournalCol::Reward.to_string() => self.rewards.clone(),
        ]
        .map_err(|e| DataError::DataFrame(e.to_string()).into())
    }

    pub fn to_json(&self) -> TradegymResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::error::IoError::Json(e).into())
    }

    pub fn performance(&self) -> PerformanceSummary {
        PerformanceSummary::from_account_values(&self.account_values)
    }
}

/// Headline statistics of an account curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub initial_value: f64,
    pub final_value: f64,
    /// Whole-episode return as a fraction (0.05 = +5%).
    pub total_return: f64,
    /// Population stddev of daily returns.
    pub daily_volatility: f64,
    /// Annualized, zero risk-free rate.
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough loss as a non-negative fraction.
    pub max_drawdown: f64,
}

impl PerformanceSummary {
    fn from_account_values(values: &[f64]) -> Self {
        let initial_value = values.first().copied().unwrap_or(0.0);
        let final_value = values.last().copied().unwrap_or(0.0);
        let total_return = if initial_value.abs() > f64::EPSILON {
            final_value / initial_value - 1.0
        } else {
            0.0
        };

        Self {
            initial_value,
            final_value,
            total_return,
            daily_volatility: stats::population_std(&stats::period_returns(values)),
            sharpe_ratio: stats::sharpe_ratio(values),
            max_drawdown: stats::max_drawdown(values),
        }
    }
}
