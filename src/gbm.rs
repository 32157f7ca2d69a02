//! Geometric Brownian Motion (GBM)
//!
//! dS_t = μ S_t dt + σ S_t dW_t
//!
//! Discretized exactly in log space:
//! log S_{i} = log S_{i-1} + (μ - σ²/2) dt + σ √dt Z_i
//!
//! Drift and volatility are quoted per day and `dt` is the step size as a fraction of
//! a day. The equivalent pre-scaled form (μ / n, σ / √n with `dt = 1`) is available
//! through [`scale_to_step`]; both produce the same log-returns.

use rand::Rng;

use crate::brownian::BrownianMotion;
use crate::error::{Result, SimulationError};

/// Geometric Brownian Motion model
///
/// The price is always positive due to the exponential structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometricBrownianMotion {
    /// Initial price S_0
    pub s0: f64,
    /// Drift μ
    pub mu: f64,
    /// Volatility σ
    pub sigma: f64,
}

impl GeometricBrownianMotion {
    /// Creates a new GBM model
    ///
    /// # Errors
    /// [`SimulationError::InvalidParameter`] if `s0` is not a positive finite number,
    /// `sigma` is negative or non-finite, or `mu` is non-finite.
    pub fn new(s0: f64, mu: f64, sigma: f64) -> Result<Self> {
        if !(s0.is_finite() && s0 > 0.0) {
            return Err(SimulationError::invalid(
                "start_price",
                format!("must be positive, got {s0}"),
            ));
        }
        if !mu.is_finite() {
            return Err(SimulationError::invalid("drift", format!("must be finite, got {mu}")));
        }
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(SimulationError::invalid(
                "volatility",
                format!("must be non-negative, got {sigma}"),
            ));
        }
        Ok(Self { s0, mu, sigma })
    }

    /// Log-return of one step for shock `z`.
    #[inline]
    pub fn step_log_return(&self, z: f64, dt: f64) -> f64 {
        step_log_return(self.mu, self.sigma, dt, z)
    }

    /// Prices for a given shock vector.
    ///
    /// # Returns
    /// `shocks.len() + 1` prices; the first is `s0`.
    pub fn path_from_shocks(&self, shocks: &[f64], dt: f64) -> Vec<f64> {
        let mut path = Vec::with_capacity(shocks.len() + 1);
        path.push(self.s0);

        let mut cumulative = 0.0;
        for &z in shocks {
            cumulative += self.step_log_return(z, dt);
            path.push(self.s0 * cumulative.exp());
        }

        path
    }

    /// Generates a price path
    ///
    /// # Arguments
    /// * `rng` - Random number generator
    /// * `n_steps` - Number of time steps
    /// * `dt` - Time step size
    ///
    /// # Returns
    /// Vector of prices S_t for t = 0, dt, 2dt, ..., n_steps*dt
    pub fn generate_path<R: Rng>(&self, rng: &mut R, n_steps: usize, dt: f64) -> Vec<f64> {
        let shocks = BrownianMotion::new().shocks(rng, n_steps);
        self.path_from_shocks(&shocks, dt)
    }

    /// Expected value E[S_t] = S_0 * exp(μt)
    pub fn expected_value(&self, t: f64) -> f64 {
        self.s0 * (self.mu * t).exp()
    }
}

/// `(μ - σ²/2) dt + σ √dt z`
#[inline]
pub fn step_log_return(mu: f64, sigma: f64, dt: f64, z: f64) -> f64 {
    (mu - 0.5 * sigma * sigma) * dt + sigma * dt.sqrt() * z
}

/// Rescales daily drift and volatility to one step of a day split into
/// `steps_per_day` steps.
///
/// Returns `(μ / n, σ / √n)`, to be used with `dt = 1`.
pub fn scale_to_step(mu_daily: f64, sigma_daily: f64, steps_per_day: u32) -> (f64, f64) {
    let n = f64::from(steps_per_day);
    (mu_daily / n, sigma_daily / n.sqrt())
}
