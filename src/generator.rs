//! Frequency-aware path generation.
//!
//! [`generate_path`] validates its inputs, draws every shock from one generator and
//! stamps the prices with evenly spaced timestamps. Nothing is produced when
//! validation fails. [`generate_paths`] fans the same model out over several
//! assets, each with its own seed derived from a base seed.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::frequency::Frequency;
use crate::gbm::GeometricBrownianMotion;
use crate::rng::{derive_seed, seeded_rng};
use crate::series::{step_offset, AssetSeries, PriceSeries, DEFAULT_PRICE_FIELD};

/// Inputs to one simulated path.
///
/// `drift` and `volatility` are daily; `step_fraction_of_day` is the `dt` of one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub start_price: f64,
    pub drift: f64,
    pub volatility: f64,
    pub step_fraction_of_day: f64,
    pub step_count: usize,
    pub seed: Option<u64>,
}

impl SimulationParameters {
    /// Parameters covering `horizon_days` days at `frequency`.
    pub fn for_horizon(
        start_price: f64,
        drift: f64,
        volatility: f64,
        frequency: Frequency,
        horizon_days: u32,
    ) -> Self {
        Self {
            start_price,
            drift,
            volatility,
            step_fraction_of_day: frequency.dt(),
            step_count: frequency.steps_for_days(horizon_days),
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_multipliers(mut self, drift_multiplier: f64, volatility_multiplier: f64) -> Self {
        self.drift *= drift_multiplier;
        self.volatility *= volatility_multiplier;
        self
    }

    /// Checks every field; the model itself is built only from valid parameters.
    pub fn validate(&self) -> Result<GeometricBrownianMotion> {
        if !(self.step_fraction_of_day.is_finite() && self.step_fraction_of_day > 0.0) {
            return Err(SimulationError::invalid(
                "step_fraction_of_day",
                format!("must be positive, got {}", self.step_fraction_of_day),
            ));
        }
        if self.step_count == 0 {
            return Err(SimulationError::invalid("step_count", "must be at least 1"));
        }
        GeometricBrownianMotion::new(self.start_price, self.drift, self.volatility)
    }

    /// Checks that the last of the `step_count + 1` timestamps is representable.
    pub fn validate_timeline(&self, frequency: Frequency, anchor: DateTime<Utc>) -> Result<()> {
        if step_offset(anchor, frequency.step_duration(), self.step_count).is_none() {
            return Err(SimulationError::invalid(
                "step_count",
                format!(
                    "{} steps of {frequency} from {anchor} overflow the timeline",
                    self.step_count
                ),
            ));
        }
        Ok(())
    }
}

/// Generates one path of `step_count + 1` points anchored at `anchor`.
///
/// # Errors
/// [`SimulationError::InvalidParameter`] when any parameter is out of domain or the
/// last timestamp would overflow.
pub fn generate_path(
    params: &SimulationParameters,
    frequency: Frequency,
    anchor: DateTime<Utc>,
) -> Result<PriceSeries> {
    let model = params.validate()?;
    params.validate_timeline(frequency, anchor)?;

    let mut rng = seeded_rng(params.seed);
    let prices = model.generate_path(&mut rng, params.step_count, params.step_fraction_of_day);

    tracing::debug!(
        frequency = %frequency,
        steps = params.step_count,
        seed = ?params.seed,
        "generated path"
    );

    PriceSeries::from_values(DEFAULT_PRICE_FIELD, anchor, frequency.step_duration(), prices)
}

/// Per-asset adjustments on top of shared base parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetOverride {
    pub symbol: String,
    /// Replaces the base start price.
    #[serde(default)]
    pub start_price: Option<f64>,
    /// Replaces the base daily drift.
    #[serde(default)]
    pub drift: Option<f64>,
    /// Replaces the base daily volatility.
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default = "one")]
    pub drift_multiplier: f64,
    #[serde(default = "one")]
    pub volatility_multiplier: f64,
}

fn one() -> f64 {
    1.0
}

impl AssetOverride {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            start_price: None,
            drift: None,
            volatility: None,
            drift_multiplier: 1.0,
            volatility_multiplier: 1.0,
        }
    }

    pub fn with_start_price(mut self, start_price: f64) -> Self {
        self.start_price = Some(start_price);
        self
    }

    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = Some(drift);
        self
    }

    pub fn with_volatility(mut self, volatility: f64) -> Self {
        self.volatility = Some(volatility);
        self
    }

    pub fn with_multipliers(mut self, drift_multiplier: f64, volatility_multiplier: f64) -> Self {
        self.drift_multiplier = drift_multiplier;
        self.volatility_multiplier = volatility_multiplier;
        self
    }

    /// Base parameters with this asset's replacements and multipliers applied.
    pub fn apply(&self, base: &SimulationParameters, seed: Option<u64>) -> SimulationParameters {
        SimulationParameters {
            start_price: self.start_price.unwrap_or(base.start_price),
            drift: self.drift.unwrap_or(base.drift),
            volatility: self.volatility.unwrap_or(base.volatility),
            seed,
            ..*base
        }
        .with_multipliers(self.drift_multiplier, self.volatility_multiplier)
    }
}

/// Generates one path per asset.
///
/// Asset `i` is seeded with `base_seed + i * 1000`; without a base seed every asset
/// draws from fresh entropy. All assets are validated before any path is generated.
///
/// # Errors
/// [`SimulationError::InvalidConfig`] for an empty or duplicated asset list, otherwise
/// the first parameter error in asset order.
pub fn generate_paths(
    base: &SimulationParameters,
    assets: &[AssetOverride],
    base_seed: Option<u64>,
    frequency: Frequency,
    anchor: DateTime<Utc>,
) -> Result<AssetSeries> {
    if assets.is_empty() {
        return Err(SimulationError::InvalidConfig(
            "at least one asset is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(assets.len());
    if let Some(dup) = assets.iter().find(|a| !seen.insert(a.symbol.as_str())) {
        return Err(SimulationError::InvalidConfig(format!(
            "duplicate asset symbol '{}'",
            dup.symbol
        )));
    }

    let per_asset: Vec<(String, SimulationParameters)> = assets
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let seed = base_seed.map(|s| derive_seed(s, i));
            (asset.symbol.clone(), asset.apply(base, seed))
        })
        .collect();
    for (_, params) in &per_asset {
        params.validate()?;
        params.validate_timeline(frequency, anchor)?;
    }

    let series: Result<Vec<(String, PriceSeries)>> = per_asset
        .into_par_iter()
        .map(|(symbol, params)| Ok((symbol, generate_path(&params, frequency, anchor)?)))
        .collect();

    Ok(series?.into_iter().collect::<BTreeMap<_, _>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
    }

    fn base() -> SimulationParameters {
        SimulationParameters::for_horizon(150.0, 0.0005, 0.02, Frequency::H1, 1)
    }

    #[test]
    fn test_row_counts_per_frequency() {
        let cases = [
            (Frequency::H1, 1, 25),
            (Frequency::D1, 7, 8),
            (Frequency::M5, 1, 289),
            (Frequency::M1, 1, 1441),
        ];
        for (freq, days, rows) in cases {
            let params =
                SimulationParameters::for_horizon(100.0, 0.0, 0.02, freq, days).with_seed(42);
            let series = generate_path(&params, freq, anchor()).unwrap();
            assert_eq!(series.len(), rows, "{freq} over {days} days");
        }
    }

    #[test]
    fn test_seed_reproducibility() {
        let params = base().with_seed(42);
        let a = generate_path(&params, Frequency::H1, anchor()).unwrap();
        let b = generate_path(&params, Frequency::H1, anchor()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = generate_path(&base().with_seed(42), Frequency::H1, anchor()).unwrap();
        let b = generate_path(&base().with_seed(43), Frequency::H1, anchor()).unwrap();
        assert_ne!(a.prices(), b.prices());
    }

    #[test]
    fn test_unseeded_calls_diverge() {
        let a = generate_path(&base(), Frequency::H1, anchor()).unwrap();
        let b = generate_path(&base(), Frequency::H1, anchor()).unwrap();
        assert_ne!(a.prices(), b.prices());
    }

    #[test]
    fn test_start_price_and_positivity() {
        let series = generate_path(&base().with_seed(7), Frequency::H1, anchor()).unwrap();
        assert_eq!(series.first_price(), Some(150.0));
        assert!(series.present_prices().iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_timestamps_spaced_by_frequency() {
        let params =
            SimulationParameters::for_horizon(100.0, 0.0, 0.02, Frequency::M15, 1).with_seed(1);
        let series = generate_path(&params, Frequency::M15, anchor()).unwrap();
        assert_eq!(series.points[0].timestamp, anchor());
        for w in series.points.windows(2) {
            assert_eq!(w[1].timestamp - w[0].timestamp, Duration::minutes(15));
        }
    }

    #[test]
    fn test_volatility_multiplier_scales_returns() {
        let params =
            SimulationParameters::for_horizon(150.0, 0.0, 0.02, Frequency::H1, 5).with_seed(42);
        let low = generate_path(&params, Frequency::H1, anchor()).unwrap();
        let doubled = params.with_multipliers(1.0, 2.0);
        let high = generate_path(&doubled, Frequency::H1, anchor()).unwrap();

        let std = |s: &PriceSeries| {
            let p = s.present_prices();
            let r: Vec<f64> = p.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
            let m = r.iter().sum::<f64>() / r.len() as f64;
            (r.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (r.len() - 1) as f64).sqrt()
        };
        let ratio = std(&high) / std(&low);
        assert!((ratio - 2.0).abs() < 0.1, "ratio = {ratio}");
    }

    #[test]
    fn test_invalid_parameters_fail_before_output() {
        let mut p = base();
        p.start_price = 0.0;
        assert!(matches!(
            generate_path(&p, Frequency::H1, anchor()),
            Err(SimulationError::InvalidParameter { name: "start_price", .. })
        ));

        let mut p = base();
        p.step_count = 0;
        assert!(generate_path(&p, Frequency::H1, anchor()).is_err());

        let mut p = base();
        p.step_fraction_of_day = 0.0;
        assert!(generate_path(&p, Frequency::H1, anchor()).is_err());
    }

    #[test]
    fn test_step_count_overflowing_timeline_is_rejected() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let params = SimulationParameters {
            step_count: 100_000_000,
            ..SimulationParameters::for_horizon(100.0, 0.0, 0.02, Frequency::D1, 1)
        };
        assert!(matches!(
            generate_path(&params, Frequency::D1, start),
            Err(SimulationError::InvalidParameter { name: "step_count", .. })
        ));

        let params = SimulationParameters {
            step_count: i32::MAX as usize + 1,
            ..SimulationParameters::for_horizon(100.0, 0.0, 0.02, Frequency::M1, 1)
        };
        assert!(matches!(
            params.validate_timeline(Frequency::M1, start),
            Err(SimulationError::InvalidParameter { name: "step_count", .. })
        ));

        let assets = vec![AssetOverride::new("X")];
        let mut huge = base();
        huge.step_count = 100_000_000;
        assert!(matches!(
            generate_paths(&huge, &assets, Some(1), Frequency::D1, start),
            Err(SimulationError::InvalidParameter { name: "step_count", .. })
        ));
    }

    #[test]
    fn test_generate_paths_seeds_by_index() {
        let assets = vec![AssetOverride::new("AAA"), AssetOverride::new("BBB")];
        let all = generate_paths(&base(), &assets, Some(42), Frequency::H1, anchor()).unwrap();

        let first = generate_path(&base().with_seed(42), Frequency::H1, anchor()).unwrap();
        let second = generate_path(&base().with_seed(1042), Frequency::H1, anchor()).unwrap();
        assert_eq!(all["AAA"], first);
        assert_eq!(all["BBB"], second);
        assert_ne!(all["AAA"].prices(), all["BBB"].prices());
    }

    #[test]
    fn test_generate_paths_applies_overrides() {
        let assets = vec![
            AssetOverride::new("BTC").with_start_price(40_000.0),
            AssetOverride::new("ETH").with_start_price(2_000.0).with_volatility(0.05),
        ];
        let all = generate_paths(&base(), &assets, Some(1), Frequency::H1, anchor()).unwrap();
        assert_eq!(all["BTC"].first_price(), Some(40_000.0));
        assert_eq!(all["ETH"].first_price(), Some(2_000.0));
    }

    #[test]
    fn test_generate_paths_rejects_bad_asset_lists() {
        assert!(matches!(
            generate_paths(&base(), &[], Some(1), Frequency::H1, anchor()),
            Err(SimulationError::InvalidConfig(_))
        ));

        let dup = vec![AssetOverride::new("X"), AssetOverride::new("X")];
        assert!(matches!(
            generate_paths(&base(), &dup, Some(1), Frequency::H1, anchor()),
            Err(SimulationError::InvalidConfig(_))
        ));

        let bad = vec![AssetOverride::new("X"), AssetOverride::new("Y").with_start_price(-1.0)];
        assert!(generate_paths(&base(), &bad, Some(1), Frequency::H1, anchor()).is_err());
    }
}
