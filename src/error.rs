//! Error types for path generation, calibration and event injection.

use thiserror::Error;

/// Errors that abort a generation or calibration call before any output exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// The sampling frequency string is not one of the supported values.
    #[error("Unsupported frequency: {0} (supported: 1m, 5m, 15m, 30m, 1h, 4h, 1d)")]
    UnsupportedFrequency(String),

    /// A numeric parameter is outside its domain.
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Human-readable description of the violated constraint.
        reason: String,
    },

    /// Not enough historical closes to estimate drift and volatility.
    #[error("Insufficient data for '{symbol}': required {required} points, got {available}")]
    InsufficientData {
        /// Symbol being calibrated.
        symbol: String,
        /// Minimum number of closes required.
        required: usize,
        /// Number of closes available.
        available: usize,
    },

    /// The market-data source has nothing for this symbol.
    #[error("Asset '{symbol}' not found in region '{region}': {message}")]
    AssetNotFound {
        /// Requested symbol.
        symbol: String,
        /// Requested region.
        region: String,
        /// Detail from the source.
        message: String,
    },

    /// A configuration or request value is invalid.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl SimulationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Failure of a single event rule.
///
/// Never surfaced to callers of the injector: each one is logged as a warning and the
/// offending event is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// The event kind is not known to the injector.
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    /// The trigger step does not address a row of the series.
    #[error("trigger step {trigger_step} outside series of length {len}")]
    OutOfRange {
        /// Requested trigger step.
        trigger_step: i64,
        /// Length of the series.
        len: usize,
    },

    /// The magnitude is NaN or infinite.
    #[error("magnitude must be finite, got {0}")]
    NonFiniteMagnitude(f64),

    /// The return distribution for a crash could not be built.
    #[error("crash distribution: {0}")]
    Distribution(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimulationError>;
