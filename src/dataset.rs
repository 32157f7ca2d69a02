//! Multi-asset dataset assembly.
//!
//! A request names the assets, the sampling frequency, the horizon and a base seed.
//! Paths are generated per asset, the events are applied to every asset, and the
//! result carries a realism score and a short preview.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::{MarketProfiler, PriceHistorySource};
use crate::config::{
    validate_horizon, DEFAULT_DRIFT, DEFAULT_HORIZON_DAYS, DEFAULT_PREVIEW_ROWS, DEFAULT_VOLATILITY,
};
use crate::error::{Result, SimulationError};
use crate::event::EventSpec;
use crate::frequency::Frequency;
use crate::generator::{generate_path, generate_paths, AssetOverride, SimulationParameters};
use crate::injector::EventInjector;
use crate::rng::derive_seed;
use crate::series::{AssetSeries, DEFAULT_PRICE_FIELD};
use crate::stats::realism_score;

/// Field name of series calibrated from market closes.
pub const CALIBRATED_PRICE_FIELD: &str = "Close";

/// One asset with an explicit start price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSpec {
    pub symbol: String,
    pub start_price: f64,
}

impl AssetSpec {
    pub fn new(symbol: impl Into<String>, start_price: f64) -> Self {
        Self {
            symbol: symbol.into(),
            start_price,
        }
    }
}

fn default_horizon() -> u32 {
    DEFAULT_HORIZON_DAYS
}

/// Dataset of assets simulated with the default drift and volatility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRequest {
    pub assets: Vec<AssetSpec>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    pub seed: u64,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

impl DatasetRequest {
    pub fn new(assets: Vec<AssetSpec>, seed: u64) -> Self {
        Self {
            assets,
            frequency: Frequency::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            seed,
            events: Vec::new(),
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_events(mut self, events: Vec<EventSpec>) -> Self {
        self.events = events;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_horizon(self.horizon_days)?;
        validate_symbols(self.assets.iter().map(|a| a.symbol.as_str()))?;
        if let Some(bad) = self
            .assets
            .iter()
            .find(|a| !(a.start_price.is_finite() && a.start_price > 0.0))
        {
            return Err(SimulationError::InvalidConfig(format!(
                "start_price for '{}' must be positive, got {}",
                bad.symbol, bad.start_price
            )));
        }
        Ok(())
    }
}

fn one() -> f64 {
    1.0
}

fn default_region() -> String {
    "US".to_string()
}

/// One asset calibrated from market history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealisticAsset {
    pub symbol: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "one")]
    pub drift_multiplier: f64,
    #[serde(default = "one")]
    pub volatility_multiplier: f64,
}

impl RealisticAsset {
    pub fn new(symbol: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            region: region.into(),
            drift_multiplier: 1.0,
            volatility_multiplier: 1.0,
        }
    }

    pub fn with_multipliers(mut self, drift_multiplier: f64, volatility_multiplier: f64) -> Self {
        self.drift_multiplier = drift_multiplier;
        self.volatility_multiplier = volatility_multiplier;
        self
    }
}

/// Dataset of assets whose start price, drift and volatility come from market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealisticDatasetRequest {
    pub assets: Vec<RealisticAsset>,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default = "default_horizon")]
    pub horizon_days: u32,
    pub seed: u64,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
}

fn default_use_cache() -> bool {
    true
}

impl RealisticDatasetRequest {
    pub fn new(assets: Vec<RealisticAsset>, seed: u64) -> Self {
        Self {
            assets,
            frequency: Frequency::default(),
            horizon_days: DEFAULT_HORIZON_DAYS,
            seed,
            events: Vec::new(),
            use_cache: true,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_horizon_days(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_events(mut self, events: Vec<EventSpec>) -> Self {
        self.events = events;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_horizon(self.horizon_days)?;
        validate_symbols(self.assets.iter().map(|a| a.symbol.as_str()))?;
        for asset in &self.assets {
            for (name, m) in [
                ("drift_multiplier", asset.drift_multiplier),
                ("volatility_multiplier", asset.volatility_multiplier),
            ] {
                if !(m.is_finite() && m >= 0.0) {
                    return Err(SimulationError::InvalidConfig(format!(
                        "{name} for '{}' must be non-negative, got {m}",
                        asset.symbol
                    )));
                }
            }
        }
        Ok(())
    }
}

fn validate_symbols<'a>(symbols: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for symbol in symbols {
        if symbol.trim().is_empty() {
            return Err(SimulationError::InvalidConfig(
                "asset symbol must not be empty".to_string(),
            ));
        }
        if !seen.insert(symbol) {
            return Err(SimulationError::InvalidConfig(format!(
                "duplicate asset symbol '{symbol}'"
            )));
        }
    }
    if seen.is_empty() {
        return Err(SimulationError::InvalidConfig("at least one asset is required".to_string()));
    }
    Ok(())
}

/// First rows of one asset, prices rounded to four decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPreview {
    pub symbol: String,
    pub timestamps: Vec<DateTime<Utc>>,
    pub prices: Vec<Option<f64>>,
}

/// Generated series with summary metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub series: AssetSeries,
    pub frequency: Frequency,
    pub horizon_days: u32,
    pub seed: u64,
    /// Rows per asset; every asset shares the same timeline
    pub total_rows: usize,
    pub realism_score: f64,
}

impl Dataset {
    fn assemble(series: AssetSeries, frequency: Frequency, horizon_days: u32, seed: u64) -> Self {
        let total_rows = series.values().next().map_or(0, |s| s.len());
        let all_prices: Vec<f64> = series.values().flat_map(|s| s.present_prices()).collect();
        let realism_score = realism_score(&all_prices);

        Self {
            series,
            frequency,
            horizon_days,
            seed,
            total_rows,
            realism_score,
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// First `rows` rows of every asset, in symbol order.
    pub fn preview(&self, rows: usize) -> Vec<AssetPreview> {
        self.series
            .iter()
            .map(|(symbol, s)| {
                let head = &s.points[..rows.min(s.len())];
                AssetPreview {
                    symbol: symbol.clone(),
                    timestamps: head.iter().map(|p| p.timestamp).collect(),
                    prices: head.iter().map(|p| p.price.map(round4)).collect(),
                }
            })
            .collect()
    }

    /// Preview with the default row count.
    pub fn default_preview(&self) -> Vec<AssetPreview> {
        self.preview(DEFAULT_PREVIEW_ROWS)
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Builds a dataset from explicit start prices and the default drift and volatility.
///
/// Asset `i` uses seed `seed + i * 1000`; events are applied with the request seed.
pub fn build_dataset(request: &DatasetRequest, anchor: DateTime<Utc>) -> Result<Dataset> {
    request.validate()?;

    let base = SimulationParameters::for_horizon(
        1.0,
        DEFAULT_DRIFT,
        DEFAULT_VOLATILITY,
        request.frequency,
        request.horizon_days,
    );
    let overrides: Vec<AssetOverride> = request
        .assets
        .iter()
        .map(|a| AssetOverride::new(a.symbol.clone()).with_start_price(a.start_price))
        .collect();

    let series = generate_paths(&base, &overrides, Some(request.seed), request.frequency, anchor)?;
    let series = inject(series, &request.events, request.seed, DEFAULT_PRICE_FIELD);

    let dataset = Dataset::assemble(series, request.frequency, request.horizon_days, request.seed);
    tracing::info!(
        assets = request.assets.len(),
        rows = dataset.total_rows,
        realism = dataset.realism_score,
        "dataset built"
    );
    Ok(dataset)
}

/// Builds a dataset whose assets are calibrated through `profiler`.
///
/// Start price is the last close; daily drift and volatility are the calibrated values
/// times the asset's multipliers. Calibration failures abort the whole request.
pub fn build_realistic_dataset<S: PriceHistorySource>(
    request: &RealisticDatasetRequest,
    profiler: &MarketProfiler<S>,
    anchor: DateTime<Utc>,
) -> Result<Dataset> {
    request.validate()?;

    let mut series = AssetSeries::new();
    for (i, asset) in request.assets.iter().enumerate() {
        let market = profiler.parameters(&asset.symbol, &asset.region, request.use_cache)?;
        let params = SimulationParameters::for_horizon(
            market.last_price,
            market.drift,
            market.volatility,
            request.frequency,
            request.horizon_days,
        )
        .with_multipliers(asset.drift_multiplier, asset.volatility_multiplier)
        .with_seed(derive_seed(request.seed, i));

        let mut path = generate_path(&params, request.frequency, anchor)?;
        path.field = CALIBRATED_PRICE_FIELD.to_string();
        series.insert(asset.symbol.clone(), path);
    }

    let series = inject(series, &request.events, request.seed, CALIBRATED_PRICE_FIELD);
    Ok(Dataset::assemble(
        series,
        request.frequency,
        request.horizon_days,
        request.seed,
    ))
}

fn inject(series: AssetSeries, events: &[EventSpec], seed: u64, price_field: &str) -> AssetSeries {
    if events.is_empty() {
        return series;
    }
    EventInjector::new()
        .with_seed(seed)
        .apply_events_to_many(&series, events, price_field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::StaticHistory;
    use chrono::TimeZone;

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 30, 0).unwrap()
    }

    fn two_assets() -> DatasetRequest {
        let assets = vec![AssetSpec::new("BTC", 40_000.0), AssetSpec::new("ETH", 2_000.0)];
        DatasetRequest::new(assets, 42).with_horizon_days(2)
    }

    #[test]
    fn test_build_dataset_shape() {
        let dataset = build_dataset(&two_assets(), anchor()).unwrap();
        assert_eq!(dataset.series.len(), 2);
        assert_eq!(dataset.total_rows, 49);
        assert_eq!(dataset.total_rows, dataset.series["BTC"].len());
        assert_eq!(dataset.total_rows, dataset.series["ETH"].len());
        assert_eq!(dataset.series["BTC"].first_price(), Some(40_000.0));
        assert_eq!(dataset.series["ETH"].first_price(), Some(2_000.0));
        assert!((70.0..=99.9).contains(&dataset.realism_score));
        assert_eq!(dataset.symbols().collect::<Vec<_>>(), vec!["BTC", "ETH"]);
    }

    #[test]
    fn test_build_dataset_reproducible() {
        let a = build_dataset(&two_assets(), anchor()).unwrap();
        let b = build_dataset(&two_assets(), anchor()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_dataset_uses_strided_seeds() {
        let dataset = build_dataset(&two_assets(), anchor()).unwrap();
        let eth = SimulationParameters::for_horizon(
            2_000.0,
            DEFAULT_DRIFT,
            DEFAULT_VOLATILITY,
            Frequency::H1,
            2,
        )
        .with_seed(1042);
        let expected = generate_path(&eth, Frequency::H1, anchor()).unwrap();
        assert_eq!(dataset.series["ETH"], expected);
    }

    #[test]
    fn test_build_dataset_applies_events() {
        let request =
            two_assets().with_events(vec![EventSpec::ipo(10), EventSpec::earnings(20, 0.5)]);
        let plain = build_dataset(&two_assets(), anchor()).unwrap();
        let dataset = build_dataset(&request, anchor()).unwrap();

        for symbol in ["BTC", "ETH"] {
            let prices = dataset.series[symbol].prices();
            assert!(prices[..10].iter().all(Option::is_none));
            let before = plain.series[symbol].points[25].price.unwrap();
            let after = prices[25].unwrap();
            assert!((after / before - 1.5).abs() < 1e-9);
        }
        assert_eq!(dataset.total_rows, plain.total_rows);
    }

    #[test]
    fn test_preview_rounds_and_keeps_gaps() {
        let request = two_assets().with_events(vec![EventSpec::ipo(3)]);
        let dataset = build_dataset(&request, anchor()).unwrap();
        let preview = dataset.default_preview();

        assert_eq!(preview.len(), 2);
        assert_eq!(preview[0].symbol, "BTC");
        assert_eq!(preview[0].prices.len(), 10);
        assert_eq!(preview[0].timestamps[0], anchor());
        assert!(preview[0].prices[..3].iter().all(Option::is_none));
        for p in preview[0].prices[3..].iter().flatten() {
            assert_eq!(*p, round4(*p));
        }
        assert_eq!(dataset.preview(1000)[1].prices.len(), 49);
    }

    #[test]
    fn test_request_validation() {
        let empty = DatasetRequest::new(vec![], 1);
        assert!(matches!(build_dataset(&empty, anchor()), Err(SimulationError::InvalidConfig(_))));

        let dup = DatasetRequest::new(vec![AssetSpec::new("A", 1.0), AssetSpec::new("A", 2.0)], 1);
        assert!(build_dataset(&dup, anchor()).is_err());

        let bad_price = DatasetRequest::new(vec![AssetSpec::new("A", -1.0)], 1);
        assert!(build_dataset(&bad_price, anchor()).is_err());

        assert!(build_dataset(&two_assets().with_horizon_days(0), anchor()).is_err());
        assert!(build_dataset(&two_assets().with_horizon_days(366), anchor()).is_err());
    }

    #[test]
    fn test_request_from_json() {
        let json = r#"{
            "assets": [{"symbol": "BTC", "start_price": 40000.0}],
            "frequency": "1d",
            "horizon_days": 10,
            "seed": 7,
            "events": [{"type": "crash", "trigger_step": 3, "magnitude": 0.4, "duration": 2}]
        }"#;
        let request: DatasetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.frequency, Frequency::D1);
        let dataset = build_dataset(&request, anchor()).unwrap();
        assert_eq!(dataset.total_rows, 11);
    }

    fn history() -> StaticHistory {
        let closes: Vec<f64> = (0..60)
            .map(|i| 150.0 * (1.0 + 0.01 * ((i % 5) as f64 - 2.0)))
            .collect();
        StaticHistory::new()
            .with_closes("AAPL", closes.clone())
            .with_closes("RELIANCE.NS", closes.iter().map(|c| c * 20.0).collect())
    }

    #[test]
    fn test_realistic_dataset_starts_at_last_close() {
        let profiler = MarketProfiler::new(history());
        let request = RealisticDatasetRequest::new(
            vec![
                RealisticAsset::new("AAPL", "US"),
                RealisticAsset::new("RELIANCE", "IN").with_multipliers(1.0, 2.0),
            ],
            9,
        )
        .with_horizon_days(1);

        let dataset = build_realistic_dataset(&request, &profiler, anchor()).unwrap();
        let aapl_last = profiler.parameters("AAPL", "US", true).unwrap().last_price;
        assert_eq!(dataset.series["AAPL"].first_price(), Some(aapl_last));
        assert_eq!(dataset.series["AAPL"].field, CALIBRATED_PRICE_FIELD);
        assert_eq!(dataset.series["RELIANCE"].len(), 25);
        assert_eq!(profiler.cache().stats().total_entries, 2);
    }

    #[test]
    fn test_realistic_dataset_events_resolve_close_field() {
        let profiler = MarketProfiler::new(history());
        let request = RealisticDatasetRequest::new(vec![RealisticAsset::new("AAPL", "US")], 3)
            .with_horizon_days(1)
            .with_events(vec![EventSpec::ipo(5)]);
        let dataset = build_realistic_dataset(&request, &profiler, anchor()).unwrap();
        assert!(dataset.series["AAPL"].prices()[..5].iter().all(Option::is_none));
    }

    #[test]
    fn test_realistic_dataset_unknown_asset_fails() {
        let profiler = MarketProfiler::new(history());
        let request = RealisticDatasetRequest::new(vec![RealisticAsset::new("ZZZ", "US")], 3);
        assert!(matches!(
            build_realistic_dataset(&request, &profiler, anchor()),
            Err(SimulationError::AssetNotFound { .. })
        ));
    }
}
