//! Event injection over price series.
//!
//! Events are applied one after another to the evolving price column, so order
//! matters. A failing event is logged and skipped; the injector itself never fails
//! and never mutates its input.

use std::collections::HashMap;

use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::crash::apply_crash;
use crate::error::EventError;
use crate::event::{apply_earnings, apply_ipo, EventKind, EventSpec, DEFAULT_EARNINGS_MAGNITUDE};
use crate::rng::{derive_seed, fresh_seed, seeded_rng};
use crate::series::{AssetSeries, PriceSeries};

/// Applies event lists to series.
///
/// Crash randomness comes from fresh entropy unless a seed is set. With a seed the
/// `i`-th event of a list draws from `seed + i * 1000`, so repeated applications give
/// identical results.
#[derive(Debug, Clone, Default)]
pub struct EventInjector {
    seed: Option<u64>,
    asset_seeds: HashMap<String, u64>,
}

impl EventInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes the crash randomness for every application.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Gives one asset its own crash seed in batch application.
    pub fn with_asset_seed(mut self, symbol: impl Into<String>, seed: u64) -> Self {
        self.asset_seeds.insert(symbol.into(), seed);
        self
    }

    /// Returns a copy of `series` with `events` applied in order.
    ///
    /// When the series' price field does not match `price_field` (exactly, or as one of
    /// the accepted aliases) the copy is returned unchanged.
    pub fn apply_events(
        &self,
        series: &PriceSeries,
        events: &[EventSpec],
        price_field: &str,
    ) -> PriceSeries {
        self.apply_seeded(series, events, price_field, self.seed)
    }

    /// Applies the same events to every series independently.
    ///
    /// Assets without their own seed share one seed for the whole batch, so they all
    /// receive the same crash draws.
    pub fn apply_events_to_many(
        &self,
        series_by_symbol: &AssetSeries,
        events: &[EventSpec],
        price_field: &str,
    ) -> AssetSeries {
        let batch_seed = self.seed.unwrap_or_else(fresh_seed);

        series_by_symbol
            .par_iter()
            .map(|(symbol, series)| {
                let seed = self.asset_seeds.get(symbol).copied().unwrap_or(batch_seed);
                let next = self.apply_seeded(series, events, price_field, Some(seed));
                (symbol.clone(), next)
            })
            .collect()
    }

    fn apply_seeded(
        &self,
        series: &PriceSeries,
        events: &[EventSpec],
        price_field: &str,
        seed: Option<u64>,
    ) -> PriceSeries {
        let Some(field) = series.resolve_price_field(price_field) else {
            tracing::warn!(
                requested = price_field,
                available = %series.field,
                "no price field found, events not applied"
            );
            return series.clone();
        };
        tracing::trace!(field, events = events.len(), "applying events");

        let mut prices = series.prices();
        for (index, event) in events.iter().enumerate() {
            let mut rng = seeded_rng(seed.map(|s| derive_seed(s, index)));
            match apply_event(&prices, event, &mut rng) {
                Ok(next) => prices = next,
                Err(err) => {
                    tracing::warn!(
                        kind = %event.kind,
                        trigger_step = event.trigger_step,
                        "skipping event: {err}"
                    );
                }
            }
        }

        series.with_prices(prices)
    }
}

fn apply_event(
    prices: &[Option<f64>],
    event: &EventSpec,
    rng: &mut ChaCha8Rng,
) -> Result<Vec<Option<f64>>, EventError> {
    match &event.kind {
        EventKind::Ipo => apply_ipo(prices, event.trigger_step),
        EventKind::Earnings => apply_earnings(
            prices,
            event.trigger_step,
            event.magnitude.unwrap_or(DEFAULT_EARNINGS_MAGNITUDE),
        ),
        EventKind::Crash => apply_crash(
            prices,
            event.trigger_step,
            event.magnitude,
            event.duration_steps,
            rng,
        ),
        EventKind::Other(name) => Err(EventError::UnknownKind(name.clone())),
    }
}

/// [`EventInjector::apply_events`] with unseeded crash randomness.
pub fn apply_events(series: &PriceSeries, events: &[EventSpec], price_field: &str) -> PriceSeries {
    EventInjector::new().apply_events(series, events, price_field)
}

/// [`EventInjector::apply_events_to_many`] with unseeded crash randomness.
pub fn apply_events_to_many(
    series_by_symbol: &AssetSeries,
    events: &[EventSpec],
    price_field: &str,
) -> AssetSeries {
    EventInjector::new().apply_events_to_many(series_by_symbol, events, price_field)
}
