//! Summary statistics and the realism heuristic for generated paths.

use serde::{Deserialize, Serialize};

use crate::brownian::quadratic_variation;

/// Per-step volatility the realism score treats as typical.
const TARGET_STEP_VOLATILITY: f64 = 0.02;
const MIN_REALISM: f64 = 70.0;
const MAX_REALISM: f64 = 99.9;

/// Statistics for one price path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStatistics {
    pub start: f64,
    pub end: f64,
    pub min: f64,
    pub max: f64,
    /// `end / start - 1`
    pub total_return: f64,
    /// Population std of simple returns
    pub return_std: f64,
    /// Population std of log returns
    pub log_return_std: f64,
    /// Sum of squared log returns
    pub realized_variance: f64,
    /// Mean simple return over its std, 0 when flat
    pub sharpe: f64,
}

impl PathStatistics {
    /// Computes statistics from present prices in order.
    ///
    /// Returns `None` for fewer than two prices.
    pub fn from_prices(prices: &[f64]) -> Option<Self> {
        let (&start, &end) = (prices.first()?, prices.last()?);
        if prices.len() < 2 {
            return None;
        }

        let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let returns = simple_returns(prices);
        let (mean_return, return_std) = mean_and_population_std(&returns);

        let log_prices: Vec<f64> = prices.iter().map(|p| p.ln()).collect();
        let log_returns: Vec<f64> = log_prices.windows(2).map(|w| w[1] - w[0]).collect();
        let (_, log_return_std) = mean_and_population_std(&log_returns);

        let sharpe = if return_std > 0.0 {
            mean_return / return_std
        } else {
            0.0
        };

        Some(Self {
            start,
            end,
            min,
            max,
            total_return: end / start - 1.0,
            return_std,
            log_return_std,
            realized_variance: quadratic_variation(&log_prices),
            sharpe,
        })
    }
}

/// Heuristic realism score in `[70, 99.9]`, rounded to one decimal.
///
/// Rewards per-step volatility near 2%, few returns beyond three standard
/// deviations, and strictly positive prices. Fewer than two prices score 0.
pub fn realism_score(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }

    let returns = simple_returns(prices);
    let (_, std) = mean_and_population_std(&returns);

    let vol_score = (100.0 - (std - TARGET_STEP_VOLATILITY).abs() * 1000.0).clamp(0.0, 100.0);

    let outliers = returns.iter().filter(|r| r.abs() > 3.0 * std).count();
    let outlier_ratio = outliers as f64 / returns.len() as f64;
    let jump_score = (100.0 - outlier_ratio * 500.0).max(0.0);

    let continuity_score = if prices.iter().all(|&p| p > 0.0) { 100.0 } else { 50.0 };

    let score = vol_score * 0.3 + jump_score * 0.3 + continuity_score * 0.2 + 15.0;
    let score = score.clamp(MIN_REALISM, MAX_REALISM);
    (score * 10.0).round() / 10.0
}

fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

fn mean_and_population_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbm::GeometricBrownianMotion;
    use crate::rng::seeded_rng;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_statistics_basic() {
        let stats = PathStatistics::from_prices(&[100.0, 110.0, 99.0, 120.0]).unwrap();
        assert_eq!(stats.start, 100.0);
        assert_eq!(stats.end, 120.0);
        assert_eq!(stats.min, 99.0);
        assert_eq!(stats.max, 120.0);
        assert_abs_diff_eq!(stats.total_return, 0.2, epsilon = 1e-12);
        assert!(stats.return_std > 0.0);
        assert_abs_diff_eq!(
            stats.realized_variance,
            (1.1_f64.ln()).powi(2) + (0.9_f64.ln()).powi(2) + (120.0_f64 / 99.0).ln().powi(2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_statistics_flat_path() {
        let stats = PathStatistics::from_prices(&[50.0; 10]).unwrap();
        assert_eq!(stats.return_std, 0.0);
        assert_eq!(stats.sharpe, 0.0);
        assert_eq!(stats.realized_variance, 0.0);
    }

    #[test]
    fn test_statistics_need_two_prices() {
        assert!(PathStatistics::from_prices(&[]).is_none());
        assert!(PathStatistics::from_prices(&[1.0]).is_none());
    }

    #[test]
    fn test_realized_variance_tracks_sigma() {
        let gbm = GeometricBrownianMotion::new(100.0, 0.0, 0.02).unwrap();
        let path = gbm.generate_path(&mut seeded_rng(Some(11)), 5_000, 1.0);
        let stats = PathStatistics::from_prices(&path).unwrap();
        let expected = 5_000.0 * 0.02 * 0.02;
        assert!((stats.realized_variance / expected - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_realism_score_short_input() {
        assert_eq!(realism_score(&[]), 0.0);
        assert_eq!(realism_score(&[100.0]), 0.0);
    }

    #[test]
    fn test_realism_score_flat_series() {
        // std 0: vol 80, no outliers, positive => 24 + 30 + 20 + 15 = 89
        assert_abs_diff_eq!(realism_score(&[100.0; 50]), 89.0, epsilon = 1e-9);
    }

    #[test]
    fn test_realism_score_typical_path() {
        let gbm = GeometricBrownianMotion::new(100.0, 0.0, 0.02).unwrap();
        let path = gbm.generate_path(&mut seeded_rng(Some(5)), 1_000, 1.0);
        let score = realism_score(&path);
        assert!((90.0..=99.9).contains(&score), "score = {score}");
        assert_abs_diff_eq!(score * 10.0, (score * 10.0).round(), epsilon = 1e-9);
    }

    #[test]
    fn test_realism_score_clamped_low() {
        let wild: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 100.0 } else { 300.0 }).collect();
        assert_eq!(realism_score(&wild), 70.0);
    }
}
