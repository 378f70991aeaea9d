use polars::{df, frame::DataFrame};
use serde::{Deserialize, Serialize};

use crate::{
    agent::AgentIdentifier,
    error::{DataError, TradegymResult},
};

/// One agent's score from a parallel evaluation sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub agent_uid: u64,
    pub identifier: AgentIdentifier,
    /// Account value at the end of the episode.
    pub final_value: f64,
    /// Sum of all step rewards over the episode.
    pub cumulative_reward: f64,
}

/// Top performers of an evaluation sweep, ordered by final account value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Sorts descending by final value (NaN scores sink to the bottom) and
    /// keeps the best `top_k`.
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>, top_k: usize) -> Self {
        use std::cmp::Ordering;

        entries.sort_by(|a, b| match (a.final_value.is_nan(), b.final_value.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => b
                .final_value
                .partial_cmp(&a.final_value)
                .unwrap_or(Ordering::Equal),
        });
        entries.truncate(top_k);
        Self { entries }
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_df(&self) -> TradegymResult<DataFrame> {
        let uids: Vec<i64> = self.entries.iter().map(|e| e.agent_uid as i64).collect();
        let identifiers: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.identifier.to_string())
            .collect();
        let final_values: Vec<f64> = self.entries.iter().map(|e| e.final_value).collect();
        let rewards: Vec<f64> = self.entries.iter().map(|e| e.cumulative_reward).collect();

        df![
            "agent_uid" => uids,
            "identifier" => identifiers,
            "final_value" => final_values,
            "cumulative_reward" => rewards,
        ]
        .map_err(|e| DataError::DataFrame(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(uid: u64, final_value: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            agent_uid: uid,
            identifier: AgentIdentifier::Random,
            final_value,
            cumulative_reward: 0.0,
        }
    }

    #[test]
    fn sorts_descending_and_truncates() {
        let board =
            Leaderboard::from_entries(vec![entry(1, 90.0), entry(2, 110.0), entry(3, 100.0)], 2);

        let uids: Vec<u64> = board.entries().iter().map(|e| e.agent_uid).collect();
        assert_eq!(uids, vec![2, 3]);
        assert_eq!(board.best().unwrap().agent_uid, 2);
    }

    #[test]
    fn nan_scores_never_win() {
        let board = Leaderboard::from_entries(vec![entry(1, f64::NAN), entry(2, 50.0)], 2);
        assert_eq!(board.best().unwrap().agent_uid, 2);
    }

    #[test]
    fn as_df_has_one_row_per_entry() {
        let board = Leaderboard::from_entries(vec![entry(1, 90.0), entry(2, 110.0)], 10);
        let df = board.as_df().unwrap();
        assert_eq!(df.height(), 2);
    }
}
