use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::math::stats;

/// An incrementally updated technical indicator.
///
/// Object-safe so feature pipelines can hold `Box<dyn StreamingIndicator>`
/// and drive a heterogeneous set of indicators over the same price stream.
pub trait StreamingIndicator: std::fmt::Debug + Send + Sync {
    /// Feed the latest close price. Returns `Some(value)` once the indicator
    /// has seen enough data to be meaningful, `None` while warming up.
    fn update(&mut self, close: f64) -> Option<f64>;

    /// Drop all accumulated state, e.g. between independent price panels.
    fn reset(&mut self);
}

// ================================================================================================
// Simple Moving Average
// ================================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingSma {
    window: usize,
    buffer: VecDeque<f64>,
    running_sum: f64,
}

impl StreamingSma {
    pub fn new(window: u16) -> Self {
        let window = window as usize;
        Self {
            window,
            buffer: VecDeque::with_capacity(window),
            running_sum: 0.0,
        }
    }
}

impl StreamingIndicator for StreamingSma {
    fn update(&mut self, close: f64) -> Option<f64> {
        self.buffer.push_back(close);
        self.running_sum += close;

        if self.buffer.len() > self.window
            && let Some(evicted) = self.buffer.pop_front()
        {
            self.running_sum -= evicted;
        }

        (self.buffer.len() >= self.window).then(|| self.running_sum / self.buffer.len() as f64)
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.running_sum = 0.0;
    }
}

// ================================================================================================
// Exponentially Weighted Mean (shared recursion for EMA and Wilder smoothing)
// ================================================================================================

/// Recursive form `y_t = alpha * x_t + (1 - alpha) * y_{t-1}`, seeded with
/// the first observation (`adjust=false` convention).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ewm {
    alpha: f64,
    mean: Option<f64>,
    seen: usize,
    warmup: usize,
}

impl Ewm {
    fn new(alpha: f64, warmup: usize) -> Self {
        Self {
            alpha,
            mean: None,
            seen: 0,
            warmup,
        }
    }

    fn update(&mut self, value: f64) -> Option<f64> {
        self.seen += 1;
        let next = match self.mean {
            None => value,
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
        };
        self.mean = Some(next);

        (self.seen >= self.warmup).then_some(next)
    }

    fn reset(&mut self) {
        self.mean = None;
        self.seen = 0;
    }
}

// ================================================================================================
// Exponential Moving Average
// ================================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingEma {
    inner: Ewm,
}

impl StreamingEma {
    pub fn new(window: u16) -> Self {
        // Standard EMA: alpha = 2 / (span + 1)
        let alpha = 2.0 / (window as f64 + 1.0);
        Self {
            inner: Ewm::new(alpha, window as usize),
        }
    }
}

impl StreamingIndicator for StreamingEma {
    fn update(&mut self, close: f64) -> Option<f64> {
        self.inner.update(close)
    }

    fn reset(&mut self) {
        self.inner.reset();
    }
}

// ================================================================================================
// Relative Strength Index (Wilder)
// ================================================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamingRsi {
    prev_close: Option<f64>,
    avg_gain: Ewm,
    avg_loss: Ewm,
}

impl StreamingRsi {
    pub fn new(window: u16) -> Self {
        // Wilder smoothing: alpha = 1 / N
        let alpha = 1.0 / window as f64;
        Self {
            prev_close: None,
            avg_gain: Ewm::new(alpha, window as usize),
            avg_loss: Ewm::new(alpha, window as usize),
        }
    }
}

impl StreamingIndicator for StreamingRsi {
    fn update(&mut self, close: f64) -> Option<f64> {
        let prev = match self.prev_close.replace(close) {
            Some(p) => p,
            // First tick has no delta to attribute.
            None => return None,
        };

        let delta = close - prev;
        let gain = self.avg_gain.update(delta.max(0.0));
        let loss = self.avg_loss.update((-delta).max(0.0));

        match (gain, loss) {
            (Some(g), Some(l)) => {
                if l == 0.0 {
                    // No losses in the window: fully overbought by convention.
                    Some(100.0)
                } else {
                    Some(100.0 - 100.0 / (1.0 + g / l))
                }
            }
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.avg_gain.reset();
        self.avg_loss.reset();
    }
}

// ================================================================================================
// Turbulence Index
// ================================================================================================

/// Cross-sectional market stress measure over a rolling window.
///
/// For each trading day the index is the average squared standardized
/// deviation of every asset's daily return against that asset's rolling
/// return distribution. Calm markets hover near 1; synchronized shocks
/// spike well above it. Fed one day at a time with the full per-asset
/// close vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurbulenceIndex {
    window: usize,
    prev_closes: Option<Vec<f64>>,
    returns: Vec<VecDeque<f64>>,
}

impl TurbulenceIndex {
    pub fn new(window: u16, assets: usize) -> Self {
        Self {
            window: window as usize,
            prev_closes: None,
            returns: vec![VecDeque::with_capacity(window as usize); assets],
        }
    }

    /// Feed one day of closes (one entry per asset, fixed order).
    /// Returns `Some(score)` once every asset has a full return window.
    pub fn update(&mut self, closes: &[f64]) -> Option<f64> {
        debug_assert_eq!(closes.len(), self.returns.len());

        let prev = self.prev_closes.replace(closes.to_vec());
        let prev = prev?;

        let mut todays_returns = Vec::with_capacity(closes.len());
        for (asset, (&close, &prev_close)) in closes.iter().zip(prev.iter()).enumerate() {
            let r = if prev_close.abs() > f64::EPSILON {
                close / prev_close - 1.0
            } else {
                0.0
            };
            todays_returns.push(r);

            let history = &mut self.returns[asset];
            history.push_back(r);
            if history.len() > self.window {
                history.pop_front();
            }
        }

        if self.returns.iter().any(|h| h.len() < self.window) {
            return None;
        }

        let mut score = 0.0;
        let mut counted = 0usize;
        for (asset, r) in todays_returns.iter().enumerate() {
            let history: Vec<f64> = self.returns[asset].iter().copied().collect();
            let mean = stats::mean(&history);
            let std = stats::population_std(&history);
            if std > f64::EPSILON {
                let z = (r - mean) / std;
                score += z * z;
                counted += 1;
            }
        }

        // Flat assets contribute nothing; an entirely flat market is calm.
        if counted == 0 {
            return Some(0.0);
        }
        Some(score / counted as f64)
    }

    pub fn reset(&mut self) {
        self.prev_closes = None;
        self.returns.iter_mut().for_each(VecDeque::clear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_warms_up_then_averages_window() {
        let mut sma = StreamingSma::new(3);
        assert_eq!(sma.update(1.0), None);
        assert_eq!(sma.update(2.0), None);
        assert_eq!(sma.update(3.0), Some(2.0));
        assert_eq!(sma.update(4.0), Some(3.0));
    }

    #[test]
    fn sma_reset_restarts_warmup() {
        let mut sma = StreamingSma::new(2);
        sma.update(10.0);
        sma.update(20.0);
        sma.reset();
        assert_eq!(sma.update(5.0), None);
        assert_eq!(sma.update(7.0), Some(6.0));
    }

    #[test]
    fn ema_seeds_with_first_value() {
        let mut ema = StreamingEma::new(1);
        // Window 1: alpha = 1, warm immediately, tracks the input exactly.
        assert_eq!(ema.update(42.0), Some(42.0));
        assert_eq!(ema.update(10.0), Some(10.0));
    }

    #[test]
    fn ema_converges_towards_constant_input() {
        let mut ema = StreamingEma::new(5);
        let mut last = None;
        for _ in 0..100 {
            last = ema.update(50.0);
        }
        let value = last.expect("warm after 100 updates");
        assert!((value - 50.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_is_100_for_monotonic_gains() {
        let mut rsi = StreamingRsi::new(3);
        let mut last = None;
        for i in 0..10 {
            last = rsi.update(100.0 + i as f64);
        }
        assert_eq!(last, Some(100.0));
    }

    #[test]
    fn rsi_alternating_equal_moves_oscillate_around_midline() {
        let mut rsi = StreamingRsi::new(2);
        let mut values = Vec::new();
        for i in 0..40 {
            let close = if i % 2 == 0 { 100.0 } else { 101.0 };
            if let Some(v) = rsi.update(close) {
                values.push(v);
            }
        }

        // Up-tick and down-tick readings are complementary once converged.
        let pair_sum = values[values.len() - 2] + values[values.len() - 1];
        assert!((pair_sum - 100.0).abs() < 2.0, "got {pair_sum}");
        assert!(values.iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn turbulence_needs_full_window() {
        let mut turb = TurbulenceIndex::new(3, 2);
        assert_eq!(turb.update(&[10.0, 20.0]), None); // no previous close yet
        assert_eq!(turb.update(&[10.1, 20.2]), None);
        assert_eq!(turb.update(&[10.2, 20.1]), None);
        assert!(turb.update(&[10.3, 20.3]).is_some());
    }

    #[test]
    fn turbulence_flat_market_scores_zero() {
        let mut turb = TurbulenceIndex::new(2, 2);
        let mut last = None;
        for _ in 0..5 {
            last = turb.update(&[10.0, 20.0]);
        }
        assert_eq!(last, Some(0.0));
    }

    #[test]
    fn turbulence_spikes_on_synchronized_shock() {
        let mut turb = TurbulenceIndex::new(4, 2);
        let mut calm = None;
        let mut closes = [100.0, 200.0];
        for i in 0..12 {
            // Gentle alternating drift to keep per-asset stddev non-zero.
            let drift = if i % 2 == 0 { 1.001 } else { 0.999 };
            closes = [closes[0] * drift, closes[1] * drift];
            calm = turb.update(&closes);
        }
        let calm = calm.expect("warm");

        // 10% crash across the board.
        let shocked = turb
            .update(&[closes[0] * 0.9, closes[1] * 0.9])
            .expect("warm");
        assert!(shocked > calm * 10.0, "calm={calm} shocked={shocked}");
    }
}
