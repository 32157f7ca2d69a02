//! Generator defaults and request-level configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::frequency::Frequency;
use crate::generator::SimulationParameters;

pub const DEFAULT_HORIZON_DAYS: u32 = 30;
pub const MAX_HORIZON_DAYS: u32 = 365;
/// Daily drift used when no market parameters are supplied.
pub const DEFAULT_DRIFT: f64 = 0.0001;
/// Daily volatility used when no market parameters are supplied (2%).
pub const DEFAULT_VOLATILITY: f64 = 0.02;
pub const DEFAULT_START_PRICE: f64 = 100.0;
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// Configuration shared by every dataset built with it.
///
/// Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub frequency: Frequency,
    pub horizon_days: u32,
    pub drift: f64,
    pub volatility: f64,
    pub drift_multiplier: f64,
    pub volatility_multiplier: f64,
    pub start_price: f64,
    pub preview_rows: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            frequency: Frequency::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            drift: DEFAULT_DRIFT,
            volatility: DEFAULT_VOLATILITY,
            drift_multiplier: 1.0,
            volatility_multiplier: 1.0,
            start_price: DEFAULT_START_PRICE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl GeneratorConfig {
    /// Parses a JSON document and validates it.
    ///
    /// # Errors
    /// [`SimulationError::UnsupportedFrequency`] for an unknown `frequency` name,
    /// [`SimulationError::InvalidConfig`] for any other malformed or out-of-range field.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(malformed)?;
        if let Some(name) = value.get("frequency").and_then(serde_json::Value::as_str) {
            name.parse::<Frequency>()?;
        }
        let config: Self = serde_json::from_value(value).map_err(malformed)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = drift;
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = volatility;
        self
    }

    pub fn with_multipliers(mut self, drift_multiplier: f64, volatility_multiplier: f64) -> Self {
        self.drift_multiplier = drift_multiplier;
        self.volatility_multiplier = volatility_multiplier;
        self
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = start_price;
        self
    }

    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows;
        self
    }

    /// Unseeded parameters for one path over the configured horizon.
    pub fn simulation_parameters(&self) -> SimulationParameters {
        SimulationParameters::for_horizon(
            self.start_price,
            self.drift,
            self.volatility,
            self.frequency,
            self.horizon_days,
        )
        .with_multipliers(self.drift_multiplier, self.volatility_multiplier)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        validate_horizon(self.horizon_days)?;
        if !(self.start_price.is_finite() && self.start_price > 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "start_price must be positive, got {}",
                self.start_price
            )));
        }
        if !self.drift.is_finite() {
            return Err(SimulationError::InvalidConfig(format!(
                "drift must be finite, got {}",
                self.drift
            )));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(SimulationError::InvalidConfig(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        for (name, m) in [
            ("drift_multiplier", self.drift_multiplier),
            ("volatility_multiplier", self.volatility_multiplier),
        ] {
            if !(m.is_finite() && m >= 0.0) {
                return Err(SimulationError::InvalidConfig(format!(
                    "{name} must be non-negative, got {m}"
                )));
            }
        }
        Ok(())
    }
}

fn malformed(e: serde_json::Error) -> SimulationError {
    SimulationError::InvalidConfig(format!("invalid generator config: {e}"))
}

/// Accepts horizons of 1 to 365 days.
pub fn validate_horizon(horizon_days: u32) -> Result<()> {
    if !(1..=MAX_HORIZON_DAYS).contains(&horizon_days) {
        return Err(SimulationError::InvalidConfig(format!(
            "horizon_days must be between 1 and {MAX_HORIZON_DAYS}, got {horizon_days}"
        )));
    }
    Ok(())
}
