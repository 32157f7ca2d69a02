//! Timestamped price sequences.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Field name used for series produced by the generator.
pub const DEFAULT_PRICE_FIELD: &str = "price";

/// Field names accepted when the requested field is not present by exact name.
pub const PRICE_FIELD_ALIASES: [&str; 3] = ["close", "price", "prices"];

/// One observation. `price` is `None` while the asset does not exist yet (pre-IPO).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
}

impl PricePoint {
    pub fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self {
            timestamp,
            price: Some(price),
        }
    }
}

/// Ordered, evenly spaced price observations for one asset.
///
/// `field` names the value column; event injection resolves it against the
/// caller's hint before touching any price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub field: String,
    pub points: Vec<PricePoint>,
}

/// Series keyed by asset symbol.
pub type AssetSeries = BTreeMap<String, PriceSeries>;

impl PriceSeries {
    pub fn new(field: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            field: field.into(),
            points,
        }
    }

    /// Builds a series from raw values spaced `step` apart from `anchor`.
    ///
    /// # Errors
    /// [`SimulationError::InvalidParameter`] when a timestamp falls outside the
    /// representable date range.
    pub fn from_values<I>(
        field: impl Into<String>,
        anchor: DateTime<Utc>,
        step: Duration,
        values: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, price)| {
                let timestamp = step_offset(anchor, step, i).ok_or_else(|| {
                    SimulationError::invalid("timestamps", format!("row {i} is out of range"))
                })?;
                Ok(PricePoint::new(timestamp, price))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(field, points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Price column with absent values kept in place.
    pub fn prices(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Present prices only, in order.
    pub fn present_prices(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.price).collect()
    }

    pub fn first_price(&self) -> Option<f64> {
        self.points.first().and_then(|p| p.price)
    }

    pub fn last_price(&self) -> Option<f64> {
        self.points.last().and_then(|p| p.price)
    }

    /// Copy of this series with every price replaced by `prices[i]`.
    ///
    /// Lengths must match; timestamps and field name are kept.
    pub(crate) fn with_prices(&self, prices: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(prices.len(), self.points.len());
        let points = self
            .points
            .iter()
            .zip(prices)
            .map(|(p, price)| PricePoint {
                timestamp: p.timestamp,
                price,
            })
            .collect();
        Self::new(self.field.clone(), points)
    }

    /// Resolves the field that holds prices for a caller-supplied hint.
    ///
    /// Exact match wins; otherwise the series field is accepted when it is one of
    /// [`PRICE_FIELD_ALIASES`], compared case-insensitively.
    pub fn resolve_price_field(&self, hint: &str) -> Option<&str> {
        if self.field == hint {
            return Some(&self.field);
        }
        let lowered = self.field.to_lowercase();
        PRICE_FIELD_ALIASES
            .contains(&lowered.as_str())
            .then_some(self.field.as_str())
    }
}

/// Timestamp of row `index`, or `None` when it cannot be represented.
pub fn step_offset(anchor: DateTime<Utc>, step: Duration, index: usize) -> Option<DateTime<Utc>> {
    let index = i32::try_from(index).ok()?;
    anchor.checked_add_signed(step.checked_mul(index)?)
}

/// Current time truncated to whole minutes, the default timestamp anchor.
pub fn minute_anchor(now: DateTime<Utc>) -> DateTime<Utc> {
    now.duration_trunc(Duration::minutes(1)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn anchor() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_from_values_spacing() {
        let s = PriceSeries::from_values("price", anchor(), Duration::hours(1), [1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.points[2].timestamp, anchor() + Duration::hours(2));
        assert_eq!(s.prices(), vec![Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_resolve_exact_and_alias() {
        let s = PriceSeries::from_values("Close", anchor(), Duration::hours(1), [1.0]).unwrap();
        assert_eq!(s.resolve_price_field("Close"), Some("Close"));
        assert_eq!(s.resolve_price_field("price"), Some("Close"));

        let p = PriceSeries::from_values("PRICES", anchor(), Duration::hours(1), [1.0]).unwrap();
        assert_eq!(p.resolve_price_field("price"), Some("PRICES"));
    }

    #[test]
    fn test_resolve_unknown_field() {
        let s =
            PriceSeries::from_values("other_column", anchor(), Duration::hours(1), [1.0]).unwrap();
        assert_eq!(s.resolve_price_field("price"), None);
        assert_eq!(s.resolve_price_field("other_column"), Some("other_column"));
    }

    #[test]
    fn test_present_prices_skip_absent() {
        let mut s =
            PriceSeries::from_values("price", anchor(), Duration::hours(1), [1.0, 2.0, 3.0])
                .unwrap();
        s.points[0].price = None;
        assert_eq!(s.present_prices(), vec![2.0, 3.0]);
        assert_eq!(s.first_price(), None);
        assert_eq!(s.last_price(), Some(3.0));
    }

    #[test]
    fn test_timestamps_out_of_range() {
        assert!(step_offset(anchor(), Duration::days(1), 100_000_000).is_none());
        assert!(step_offset(anchor(), Duration::minutes(1), i32::MAX as usize + 1).is_none());
        assert_eq!(
            step_offset(anchor(), Duration::minutes(5), 12),
            Some(anchor() + Duration::hours(1))
        );

        let late = DateTime::<Utc>::MAX_UTC - Duration::hours(1);
        let err = PriceSeries::from_values("price", late, Duration::hours(1), [1.0, 2.0, 3.0]);
        assert!(matches!(err, Err(SimulationError::InvalidParameter { name: "timestamps", .. })));
    }

    #[test]
    fn test_minute_anchor_truncates() {
        let t = Utc.with_ymd_and_hms(2024, 3, 5, 10, 17, 42).unwrap();
        let a = minute_anchor(t);
        assert_eq!(a.second(), 0);
        assert_eq!(a.minute(), 17);
    }
}
