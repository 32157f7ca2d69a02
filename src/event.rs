//! Market event specifications and the deterministic event rules.
//!
//! Rules take the current price column and return the next one; they never modify
//! their input. The stochastic crash rule lives in [`crate::crash`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EventError;

/// Default earnings gap when no magnitude is given (+10%).
pub const DEFAULT_EARNINGS_MAGNITUDE: f64 = 0.1;

/// Smallest multiplier an event may apply, keeping prices positive.
pub const MIN_MULTIPLIER: f64 = 0.01;

/// Kind of market event.
///
/// Names outside the known set parse to [`EventKind::Other`], which the injector
/// skips with a warning.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// Asset did not exist before the trigger.
    Ipo,
    /// Stochastic multi-step decline followed by a permanent rebase.
    Crash,
    /// Instantaneous permanent gap.
    Earnings,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Ipo => "ipo",
            EventKind::Crash => "crash",
            EventKind::Earnings => "earnings",
            EventKind::Other(name) => name,
        }
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "ipo" => EventKind::Ipo,
            "crash" => EventKind::Crash,
            "earnings" => EventKind::Earnings,
            _ => EventKind::Other(value),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        EventKind::from(value.to_string())
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One event to inject. `trigger_step` is a 0-based row index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSpec {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub trigger_step: i64,
    #[serde(default)]
    pub magnitude: Option<f64>,
    /// Crash length in steps.
    #[serde(default, alias = "duration")]
    pub duration_steps: Option<i64>,
}

impl EventSpec {
    pub fn ipo(trigger_step: i64) -> Self {
        Self {
            kind: EventKind::Ipo,
            trigger_step,
            magnitude: None,
            duration_steps: None,
        }
    }

    pub fn earnings(trigger_step: i64, magnitude: f64) -> Self {
        Self {
            kind: EventKind::Earnings,
            trigger_step,
            magnitude: Some(magnitude),
            duration_steps: None,
        }
    }

    pub fn crash(trigger_step: i64, magnitude: f64, duration_steps: i64) -> Self {
        Self {
            kind: EventKind::Crash,
            trigger_step,
            magnitude: Some(magnitude),
            duration_steps: Some(duration_steps),
        }
    }
}

/// Index of `trigger_step` if it addresses a row of a series of length `len`.
pub(crate) fn trigger_index(trigger_step: i64, len: usize) -> Result<usize, EventError> {
    usize::try_from(trigger_step)
        .ok()
        .filter(|&t| t < len)
        .ok_or(EventError::OutOfRange { trigger_step, len })
}

/// Blanks every price before `trigger_step`.
///
/// A trigger of 0 means the asset existed from the first row and changes nothing.
pub fn apply_ipo(
    prices: &[Option<f64>],
    trigger_step: i64,
) -> Result<Vec<Option<f64>>, EventError> {
    let t = trigger_index(trigger_step, prices.len())?;
    let mut next = prices.to_vec();
    next[..t].iter_mut().for_each(|p| *p = None);
    Ok(next)
}

/// Multiplies every price from `trigger_step` onwards by `1 + magnitude`.
///
/// A non-positive multiplier is floored at [`MIN_MULTIPLIER`].
pub fn apply_earnings(
    prices: &[Option<f64>],
    trigger_step: i64,
    magnitude: f64,
) -> Result<Vec<Option<f64>>, EventError> {
    let t = trigger_index(trigger_step, prices.len())?;
    if !magnitude.is_finite() {
        return Err(EventError::NonFiniteMagnitude(magnitude));
    }

    let mut multiplier = 1.0 + magnitude;
    if multiplier <= 0.0 {
        multiplier = MIN_MULTIPLIER;
    }

    let mut next = prices.to_vec();
    for p in next[t..].iter_mut().flatten() {
        *p *= multiplier;
    }
    Ok(next)
}
