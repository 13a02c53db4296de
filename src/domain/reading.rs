use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metering granularity of a single interval reading.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Hour,
    FifteenMin,
}

impl Granularity {
    /// Interval length in hours.
    pub fn interval_hours(&self) -> f64 {
        match self {
            Self::Hour => 1.0,
            Self::FifteenMin => 0.25,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hour => "1h",
            Self::FifteenMin => "15min",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Granularity {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HOUR" | "1H" => Ok(Self::Hour),
            "FIFTEEN_MIN" | "15MIN" => Ok(Self::FifteenMin),
            _ => Err("invalid granularity; expected HOUR or FIFTEEN_MIN"),
        }
    }
}

/// One interval reading from a utility meter file.
///
/// `kwh` is the energy consumed over the interval (a 15-minute reading is
/// already quarter-hour energy and must not be divided again). `kw` is the
/// average demand over the interval; when the meter file does not carry it,
/// the profile builder derives it from `kwh / interval_hours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterReading {
    pub timestamp: DateTime<FixedOffset>,
    pub granularity: Granularity,
    pub kwh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kw: Option<f64>,
}

impl MeterReading {
    /// Average demand over the interval, derived from energy when the meter
    /// did not record power.
    pub fn demand_kw(&self) -> f64 {
        match self.kw {
            Some(kw) => kw,
            None => self.kwh / self.granularity.interval_hours(),
        }
    }
}
