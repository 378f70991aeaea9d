//! Small numeric helpers shared by the reward function and the reports.
//!
//! All functions are total: degenerate inputs (empty slices, zero divisors)
//! map to `0.0` instead of NaN so no caller ever has to sanitize results.

/// Trading days per year, used to annualize daily statistics.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Period-over-period returns of a value series.
///
/// Pairs with a zero or non-finite base are dropped rather than producing
/// infinities.
pub fn period_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev.abs() <= f64::EPSILON {
                return None;
            }
            let r = curr / prev - 1.0;
            r.is_finite().then_some(r)
        })
        .collect()
}

/// Largest peak-to-trough loss of the series, as a non-negative fraction.
pub fn max_drawdown(values: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst = 0.0f64;
    for &v in values {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.max((peak - v) / peak);
        }
    }
    worst
}

/// Annualized Sharpe ratio of a daily value series, zero risk-free rate.
pub fn sharpe_ratio(values: &[f64]) -> f64 {
    let returns = period_returns(values);
    let std = population_std(&returns);
    if std <= f64::EPSILON {
        return 0.0;
    }
    mean(&returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn population_std_matches_hand_computation() {
        // values 2, 4: mean 3, variance ((1)+(1))/2 = 1
        assert!((population_std(&[2.0, 4.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn population_std_of_single_sample_is_zero() {
        assert_eq!(population_std(&[5.0]), 0.0);
    }

    #[test]
    fn period_returns_basic() {
        let r = period_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn period_returns_skips_zero_base() {
        let r = period_returns(&[0.0, 10.0, 20.0]);
        assert_eq!(r, vec![1.0]);
    }

    #[test]
    fn max_drawdown_detects_trough() {
        let dd = max_drawdown(&[100.0, 120.0, 90.0, 130.0]);
        assert!((dd - 0.25).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_of_monotone_series_is_zero() {
        assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn sharpe_of_flat_series_is_zero() {
        assert_eq!(sharpe_ratio(&[100.0, 100.0, 100.0]), 0.0);
    }

    #[test]
    fn sharpe_sign_follows_drift() {
        assert!(sharpe_ratio(&[100.0, 101.0, 103.0, 104.0]) > 0.0);
        assert!(sharpe_ratio(&[100.0, 99.0, 97.0, 96.0]) < 0.0);
    }
}
