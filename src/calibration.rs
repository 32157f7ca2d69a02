//! Market calibration: drift and volatility estimated from historical closes.
//!
//! The history itself comes from a [`PriceHistorySource`]; this module only formats
//! symbols, computes the statistics and caches the result.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, ParameterCache};
use crate::error::{Result, SimulationError};

/// Fewest closes accepted for an estimate.
pub const MIN_DATA_POINTS: usize = 30;

/// How long calibrated parameters stay cached.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Daily log-return statistics for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketParameters {
    pub symbol: String,
    pub region: String,
    /// Mean daily log return
    pub drift: f64,
    /// Sample standard deviation of daily log returns
    pub volatility: f64,
    /// Most recent close, used as the simulation start price
    pub last_price: f64,
    pub data_points_used: usize,
    pub fetched_at: DateTime<Utc>,
}

impl MarketParameters {
    /// Estimates parameters from daily closes, oldest first.
    ///
    /// # Errors
    /// [`SimulationError::InsufficientData`] for fewer than [`MIN_DATA_POINTS`] closes,
    /// [`SimulationError::InvalidParameter`] when a close is not positive and finite.
    pub fn from_closes(symbol: &str, region: &str, closes: &[f64]) -> Result<Self> {
        if closes.len() < MIN_DATA_POINTS {
            return Err(SimulationError::InsufficientData {
                symbol: symbol.to_string(),
                required: MIN_DATA_POINTS,
                available: closes.len(),
            });
        }
        if let Some(bad) = closes.iter().find(|c| !(c.is_finite() && **c > 0.0)) {
            return Err(SimulationError::invalid(
                "closes",
                format!("every close must be positive, got {bad}"),
            ));
        }

        let log_returns: Vec<f64> = closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
        let n = log_returns.len() as f64;
        let drift = log_returns.iter().sum::<f64>() / n;
        let variance = log_returns.iter().map(|r| (r - drift).powi(2)).sum::<f64>() / (n - 1.0);

        Ok(Self {
            symbol: symbol.trim().to_uppercase(),
            region: region.trim().to_uppercase(),
            drift,
            volatility: variance.sqrt(),
            last_price: closes[closes.len() - 1],
            data_points_used: closes.len(),
            fetched_at: Utc::now(),
        })
    }
}

/// Where historical closes come from.
pub trait PriceHistorySource: Send + Sync {
    /// Daily closes for an already formatted symbol, oldest first.
    ///
    /// An empty vector means the symbol is unknown.
    fn daily_closes(&self, formatted_symbol: &str) -> Result<Vec<f64>>;
}

/// Fixed histories keyed by formatted symbol.
#[derive(Debug, Clone, Default)]
pub struct StaticHistory {
    closes: HashMap<String, Vec<f64>>,
}

impl StaticHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_closes(mut self, formatted_symbol: impl Into<String>, closes: Vec<f64>) -> Self {
        self.closes.insert(formatted_symbol.into(), closes);
        self
    }
}

impl PriceHistorySource for StaticHistory {
    fn daily_closes(&self, formatted_symbol: &str) -> Result<Vec<f64>> {
        Ok(self.closes.get(formatted_symbol).cloned().unwrap_or_default())
    }
}

/// Symbol as the history source expects it.
///
/// Upper-cases and trims; region `IN` gets the NSE suffix `.NS` unless the symbol
/// already carries `.NS` or `.BO`.
pub fn format_symbol(symbol: &str, region: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    let listed = symbol.ends_with(".NS") || symbol.ends_with(".BO");
    if region.trim().eq_ignore_ascii_case("IN") && !listed {
        return format!("{symbol}.NS");
    }
    symbol
}

/// Fetches, calibrates and caches market parameters.
pub struct MarketProfiler<S> {
    source: S,
    cache: ParameterCache,
    ttl: Duration,
}

impl<S: PriceHistorySource> MarketProfiler<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: ParameterCache::new(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn cache(&self) -> &ParameterCache {
        &self.cache
    }

    /// Parameters for `symbol` in `region`.
    ///
    /// With `use_cache` a valid cached entry is returned as is; otherwise the history
    /// is fetched again and the cache refreshed.
    ///
    /// # Errors
    /// [`SimulationError::AssetNotFound`] when the source has no closes,
    /// [`SimulationError::InsufficientData`] when it has too few.
    pub fn parameters(
        &self,
        symbol: &str,
        region: &str,
        use_cache: bool,
    ) -> Result<MarketParameters> {
        let key = CacheKey::new(symbol, region);
        let fetch = || self.calibrate(symbol, region);

        if use_cache {
            return self.cache.get_or_fetch(&key, self.ttl, fetch);
        }
        let parameters = fetch()?;
        self.cache.insert(key, parameters.clone(), self.ttl);
        Ok(parameters)
    }

    fn calibrate(&self, symbol: &str, region: &str) -> Result<MarketParameters> {
        let formatted = format_symbol(symbol, region);
        let closes = self.source.daily_closes(&formatted)?;
        if closes.is_empty() {
            return Err(SimulationError::AssetNotFound {
                symbol: symbol.to_string(),
                region: region.to_string(),
                message: format!("no historical data for '{formatted}'"),
            });
        }

        let parameters = MarketParameters::from_closes(symbol, region, &closes)?;
        tracing::info!(
            symbol = %parameters.symbol,
            region = %parameters.region,
            drift = parameters.drift,
            volatility = parameters.volatility,
            points = parameters.data_points_used,
            "calibrated market parameters"
        );
        Ok(parameters)
    }
}
