use serde::{Deserialize, Serialize};

/// Normalized annual consumption and demand profile for one site.
///
/// Derived fresh per analysis run, never persisted as input. Annual energy is
/// the metered total scaled by the annualization factor; peak demand is the
/// instantaneous extremum and is deliberately not prorated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumptionProfile {
    pub annual_consumption_kwh: f64,
    pub peak_demand_kw: f64,
    pub data_span_days: f64,
    /// `365 / max(data_span_days, 1)`, always >= 1 for sub-year data sets.
    pub annualization_factor: f64,
    /// Mean interval energy per hour of day (index 0 = midnight hour).
    pub hourly_average_kwh: [f64; 24],
    /// Mean demand per hour of day.
    pub hourly_average_kw: [f64; 24],
}

impl ConsumptionProfile {
    /// Hour of day with the highest average demand.
    pub fn peak_hour(&self) -> usize {
        self.hourly_average_kw
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(hour, _)| hour)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_hour() {
        let mut profile = ConsumptionProfile {
            annual_consumption_kwh: 1000.0,
            peak_demand_kw: 10.0,
            data_span_days: 365.0,
            annualization_factor: 1.0,
            hourly_average_kwh: [0.0; 24],
            hourly_average_kw: [0.0; 24],
        };
        profile.hourly_average_kw[14] = 9.5;
        assert_eq!(profile.peak_hour(), 14);
    }
}
