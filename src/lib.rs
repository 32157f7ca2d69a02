//! # SynthQuant
//!
//! Synthetic market data: reproducible Geometric Brownian Motion price paths at a
//! chosen sampling frequency, with market events (IPO, crash, earnings gap) injected
//! on top.
//!
//! ## Modules
//!
//! - [`frequency`] - Sampling frequencies and their time steps
//! - [`brownian`] - Standard normal shocks and quadratic variation
//! - [`gbm`] - Geometric Brownian Motion
//! - [`generator`] - Frequency-aware single and multi-asset path generation
//! - [`event`] / [`crash`] - Event specifications and rules
//! - [`injector`] - Ordered event application over series
//! - [`calibration`] / [`cache`] - Drift and volatility from market history
//! - [`stats`] - Path statistics and the realism score
//! - [`dataset`] - Multi-asset dataset assembly
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use synthquant::{apply_events, generate_path, EventSpec, Frequency, SimulationParameters};
//!
//! let anchor = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let params =
//!     SimulationParameters::for_horizon(100.0, 0.0001, 0.02, Frequency::H1, 30).with_seed(42);
//!
//! let series = generate_path(&params, Frequency::H1, anchor).unwrap();
//! assert_eq!(series.len(), 30 * 24 + 1);
//!
//! let events = [EventSpec::ipo(24), EventSpec::earnings(100, 0.1)];
//! let shocked = apply_events(&series, &events, "price");
//! assert!(shocked.points[0].price.is_none());
//! ```

pub mod brownian;
pub mod cache;
pub mod calibration;
pub mod config;
pub mod crash;
pub mod dataset;
pub mod error;
pub mod event;
pub mod frequency;
pub mod gbm;
pub mod generator;
pub mod injector;
pub mod rng;
pub mod series;
pub mod stats;

pub use brownian::BrownianMotion;
pub use cache::{CacheKey, CacheStats, ParameterCache};
pub use calibration::{MarketParameters, MarketProfiler, PriceHistorySource, StaticHistory};
pub use config::GeneratorConfig;
pub use dataset::{
    build_dataset, build_realistic_dataset, Dataset, DatasetRequest, RealisticDatasetRequest,
};
pub use error::{EventError, Result, SimulationError};
pub use event::{EventKind, EventSpec};
pub use frequency::Frequency;
pub use gbm::{scale_to_step, GeometricBrownianMotion};
pub use generator::{generate_path, generate_paths, AssetOverride, SimulationParameters};
pub use injector::{apply_events, apply_events_to_many, EventInjector};
pub use series::{AssetSeries, PricePoint, PriceSeries};
pub use stats::{realism_score, PathStatistics};
