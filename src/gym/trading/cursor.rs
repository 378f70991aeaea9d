use serde::{Deserialize, Serialize};

/// Episode-cumulative trading friction counters.
///
/// `cost` keeps growing across the whole episode, and the reward's cost
/// penalty reads this running total — later steps are penalized by all
/// prior trading cost, not just their own increment. That accumulation is
/// part of the environment's contract; do not convert it to a per-step
/// delta without changing the reward definition with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeAccumulator {
    cost: f64,
    trades: u64,
}

impl TradeAccumulator {
    /// Records one executed (or attempted) trade and its fee.
    pub(crate) fn record(&mut self, cost_delta: f64) {
        self.cost += cost_delta;
        self.trades += 1;
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn trades(&self) -> u64 {
        self.trades
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Position of an episode within the day range, plus its friction counters.
///
/// `day` starts at 0 and increments once per non-terminal step; `terminal`
/// latches when `day` reaches the last available index and only `reset`
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpisodeCursor {
    day: usize,
    terminal: bool,
    friction: TradeAccumulator,
}

impl EpisodeCursor {
    pub fn day(&self) -> usize {
        self.day
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn friction(&self) -> &TradeAccumulator {
        &self.friction
    }

    pub(crate) fn friction_mut(&mut self) -> &mut TradeAccumulator {
        &mut self.friction
    }

    /// Moves to the next day and latches the terminal flag when the day
    /// range is exhausted.
    pub(crate) fn advance(&mut self, last_day: usize) {
        debug_assert!(!self.terminal, "advance called on a terminal cursor");
        self.day += 1;
        if self.day >= last_day {
            self.terminal = true;
        }
    }

    /// Back to day 0 with cleared counters.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Degenerate frames with a single day start out terminal.
    pub(crate) fn sync_terminal(&mut self, last_day: usize) {
        self.terminal = self.day >= last_day;
    }
}
