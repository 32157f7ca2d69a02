//! Stochastic crash model.
//!
//! A crash of size `m` spread over `d` steps draws one return per step from a
//! normal distribution whose drift and volatility follow a fixed envelope: panic is
//! strongest at the start and fades towards the end of the window. The raw draws are
//! then pulled 70% of the way towards the requested cumulative drop, so the realized
//! crash is close to, but not exactly, `m`. After the window every price is rebased by
//! `1 - m`.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::EventError;
use crate::event::{trigger_index, MIN_MULTIPLIER};

/// Default crash size when no magnitude is given (30%).
pub const DEFAULT_CRASH_MAGNITUDE: f64 = 0.3;
/// Default crash length in steps.
pub const DEFAULT_CRASH_DURATION: i64 = 10;

const MIN_MAGNITUDE: f64 = 0.01;
const MAX_MAGNITUDE: f64 = 0.99;
/// Largest single-step drop.
const MAX_STEP_DROP: f64 = -0.15;
/// Largest single-step bounce.
const MAX_STEP_BOUNCE: f64 = 0.05;
/// Share of the correction towards the target magnitude.
const TARGET_BLEND: f64 = 0.7;
/// Raw cumulative returns smaller than this are left unscaled.
const BLEND_THRESHOLD: f64 = 0.01;
/// The running multiplier stays above `1 - FLOOR_FACTOR * m`.
const FLOOR_FACTOR: f64 = 1.1;

/// Drift and volatility weights at position `i` of an `n`-step window.
///
/// Drift weight falls linearly from 1.5 towards 0.7, volatility weight from 1.3
/// towards 0.9. Depends on position only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashEnvelope {
    pub drift_weight: f64,
    pub volatility_weight: f64,
}

impl CrashEnvelope {
    pub fn at(i: usize, n: usize) -> Self {
        let progress = i as f64 / n as f64;
        Self {
            drift_weight: 1.5 - progress * 0.8,
            volatility_weight: 1.3 - progress * 0.4,
        }
    }
}

/// Validated crash inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrashShape {
    pub trigger: usize,
    pub magnitude: f64,
    /// Steps actually covered, truncated at the end of the series.
    pub duration: usize,
}

impl CrashShape {
    /// Clamps magnitude into `[0.01, 0.99]` and duration to at least one step.
    pub fn resolve(
        len: usize,
        trigger_step: i64,
        magnitude: Option<f64>,
        duration_steps: Option<i64>,
    ) -> Result<Self, EventError> {
        let trigger = trigger_index(trigger_step, len)?;

        let magnitude = magnitude.unwrap_or(DEFAULT_CRASH_MAGNITUDE);
        if !magnitude.is_finite() {
            return Err(EventError::NonFiniteMagnitude(magnitude));
        }
        let magnitude = magnitude.clamp(MIN_MAGNITUDE, MAX_MAGNITUDE);

        let requested = duration_steps.unwrap_or(DEFAULT_CRASH_DURATION).max(1) as usize;
        let duration = requested.min(len - trigger);

        Ok(Self {
            trigger,
            magnitude,
            duration,
        })
    }

    /// Lowest cumulative multiplier allowed inside the window.
    pub fn floor(&self) -> f64 {
        (1.0 - FLOOR_FACTOR * self.magnitude).max(MIN_MULTIPLIER)
    }

    /// Draws the per-step returns of the crash window.
    pub fn draw_returns<R: Rng>(&self, rng: &mut R) -> Result<Vec<f64>, EventError> {
        let n = self.duration;
        let avg_return = -self.magnitude / n as f64;
        let crash_volatility = avg_return.abs() * rng.gen_range(2.5..4.0);

        let mut returns = Vec::with_capacity(n);
        for i in 0..n {
            let envelope = CrashEnvelope::at(i, n);
            let normal = Normal::new(
                avg_return * envelope.drift_weight,
                crash_volatility * envelope.volatility_weight,
            )
            .map_err(|e| EventError::Distribution(e.to_string()))?;

            returns.push(normal.sample(rng).clamp(MAX_STEP_DROP, MAX_STEP_BOUNCE));
        }

        let realized: f64 = returns.iter().sum();
        if realized.abs() > BLEND_THRESHOLD {
            let scale = -self.magnitude / realized;
            let factor = TARGET_BLEND * scale + (1.0 - TARGET_BLEND);
            returns.iter_mut().for_each(|r| *r *= factor);
        }

        Ok(returns)
    }

    /// Applies the drawn `returns` to `prices`.
    pub fn apply(&self, prices: &[Option<f64>], returns: &[f64]) -> Vec<Option<f64>> {
        let floor = self.floor();
        let mut next = prices.to_vec();

        let mut cumulative = 1.0;
        for (i, r) in returns.iter().enumerate().take(self.duration) {
            cumulative = (cumulative * (1.0 + r)).max(floor);
            if let Some(p) = next[self.trigger + i].as_mut() {
                *p *= cumulative;
            }
        }

        let rebase = 1.0 - self.magnitude;
        for p in next[self.trigger + self.duration..].iter_mut().flatten() {
            *p *= rebase;
        }
        next
    }
}

/// Applies a crash to `prices` using randomness from `rng`.
pub fn apply_crash<R: Rng>(
    prices: &[Option<f64>],
    trigger_step: i64,
    magnitude: Option<f64>,
    duration_steps: Option<i64>,
    rng: &mut R,
) -> Result<Vec<Option<f64>>, EventError> {
    let shape = CrashShape::resolve(prices.len(), trigger_step, magnitude, duration_steps)?;
    let returns = shape.draw_returns(rng)?;
    Ok(shape.apply(prices, &returns))
}
