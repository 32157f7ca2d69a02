//! Sampling frequencies and their time scaling.
//!
//! Each frequency fixes the number of simulation steps per day, the step size `dt`
//! as a fraction of a day, and the wall-clock spacing between timestamps. Markets are
//! treated as trading around the clock, so a day always holds `24h / step` steps.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;

/// Nominal sampling frequency of a generated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 30 minutes
    M30,
    /// 1 hour
    H1,
    /// 4 hours
    H4,
    /// 1 day
    D1,
}

impl Frequency {
    /// All supported frequencies, finest first.
    pub const ALL: [Frequency; 7] = [
        Frequency::M1,
        Frequency::M5,
        Frequency::M15,
        Frequency::M30,
        Frequency::H1,
        Frequency::H4,
        Frequency::D1,
    ];

    /// Number of simulation steps in one day.
    #[must_use]
    pub fn steps_per_day(&self) -> u32 {
        match self {
            Frequency::M1 => 1440,
            Frequency::M5 => 288,
            Frequency::M15 => 96,
            Frequency::M30 => 48,
            Frequency::H1 => 24,
            Frequency::H4 => 6,
            Frequency::D1 => 1,
        }
    }

    /// Step size as a fraction of a day.
    #[must_use]
    pub fn dt(&self) -> f64 {
        1.0 / f64::from(self.steps_per_day())
    }

    /// Wall-clock distance between consecutive points.
    #[must_use]
    pub fn step_duration(&self) -> Duration {
        match self {
            Frequency::M1 => Duration::minutes(1),
            Frequency::M5 => Duration::minutes(5),
            Frequency::M15 => Duration::minutes(15),
            Frequency::M30 => Duration::minutes(30),
            Frequency::H1 => Duration::hours(1),
            Frequency::H4 => Duration::hours(4),
            Frequency::D1 => Duration::days(1),
        }
    }

    /// Total steps covered by `horizon_days` days.
    #[must_use]
    pub fn steps_for_days(&self, horizon_days: u32) -> usize {
        self.steps_per_day() as usize * horizon_days as usize
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::M1 => "1m",
            Frequency::M5 => "5m",
            Frequency::M15 => "15m",
            Frequency::M30 => "30m",
            Frequency::H1 => "1h",
            Frequency::H4 => "4h",
            Frequency::D1 => "1d",
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::H1
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Frequency::M1),
            "5m" => Ok(Frequency::M5),
            "15m" => Ok(Frequency::M15),
            "30m" => Ok(Frequency::M30),
            "1h" => Ok(Frequency::H1),
            "4h" => Ok(Frequency::H4),
            "1d" => Ok(Frequency::D1),
            other => Err(SimulationError::UnsupportedFrequency(other.to_string())),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = SimulationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_per_day_table() {
        let expected = [1440, 288, 96, 48, 24, 6, 1];
        for (freq, steps) in Frequency::ALL.iter().zip(expected) {
            assert_eq!(freq.steps_per_day(), steps, "{freq}");
        }
    }

    #[test]
    fn test_steps_divide_a_day_exactly() {
        for freq in Frequency::ALL {
            let day = Duration::days(1);
            assert_eq!(freq.step_duration() * freq.steps_per_day() as i32, day);
            assert!((freq.dt() * f64::from(freq.steps_per_day()) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parse_roundtrip() {
        for freq in Frequency::ALL {
            assert_eq!(freq.as_str().parse::<Frequency>(), Ok(freq));
        }
    }

    #[test]
    fn test_unknown_frequency_rejected() {
        let err = "2h".parse::<Frequency>().unwrap_err();
        assert_eq!(err, SimulationError::UnsupportedFrequency("2h".to_string()));
        assert!("1H".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_serde_uses_short_names() {
        let json = serde_json::to_string(&Frequency::M15).unwrap();
        assert_eq!(json, "\"15m\"");
        let back: Frequency = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(back, Frequency::H4);
        assert!(serde_json::from_str::<Frequency>("\"3d\"").is_err());
    }

    #[test]
    fn test_steps_for_days() {
        assert_eq!(Frequency::H1.steps_for_days(1), 24);
        assert_eq!(Frequency::D1.steps_for_days(7), 7);
        assert_eq!(Frequency::M5.steps_for_days(1), 288);
    }
}
