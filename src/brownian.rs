//! Brownian shocks driving the price model.
//!
//! A Wiener process has independent Gaussian increments `W_{t+dt} - W_t ~ N(0, dt)`.
//! The generator only ever needs the standardized draws `Z_i ~ N(0, 1)`; the caller
//! applies `sqrt(dt)` when it builds log-returns.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Source of standard-normal shocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrownianMotion;

impl BrownianMotion {
    pub fn new() -> Self {
        Self
    }

    /// Draws `n_steps` independent standard-normal shocks `Z_1..Z_n`.
    ///
    /// The draws are consumed from `rng` in order, so a seeded generator always
    /// yields the same vector.
    pub fn shocks<R: Rng>(&self, rng: &mut R, n_steps: usize) -> Vec<f64> {
        (0..n_steps)
            .map(|_| -> f64 { StandardNormal.sample(&mut *rng) })
            .collect()
    }
}

/// Sum of squared increments of a path.
///
/// Applied to a log-price path this is the realized variance over the window;
/// for a Wiener path it approaches the elapsed time.
pub fn quadratic_variation(path: &[f64]) -> f64 {
    path.windows(2)
        .map(|w| {
            let diff = w[1] - w[0];
            diff * diff
        })
        .sum()
}
