use chrono::Timelike;
use tracing::debug;

use crate::domain::{ConsumptionProfile, MeterReading};
use crate::error::{EngineError, Result};

const DAYS_PER_YEAR: f64 = 365.0;

/// Aggregate ordered meter readings into a normalized annual profile.
///
/// Pure function of its input. Mixed granularities are allowed: each reading
/// contributes its interval energy as-is (a 15-minute kWh value is already
/// quarter-hour energy). Energy is annualized by `365 / span_days`; peak
/// demand is an instantaneous extremum and is never prorated.
pub fn build_profile(readings: &[MeterReading]) -> Result<ConsumptionProfile> {
    if readings.is_empty() {
        return Err(EngineError::insufficient_data(
            "no meter readings supplied for profile",
        ));
    }

    let mut total_kwh = 0.0;
    let mut peak_kw: f64 = 0.0;
    let mut kwh_sum_by_hour = [0.0f64; 24];
    let mut kw_sum_by_hour = [0.0f64; 24];
    let mut count_by_hour = [0usize; 24];

    for r in readings {
        let demand = r.demand_kw();
        total_kwh += r.kwh;
        peak_kw = peak_kw.max(demand);

        let hour = r.timestamp.hour() as usize;
        kwh_sum_by_hour[hour] += r.kwh;
        kw_sum_by_hour[hour] += demand;
        count_by_hour[hour] += 1;
    }

    // Span from first to last interval end, in days. Clamped to one day so
    // the annualization factor stays finite for tiny data sets.
    let first = readings[0].timestamp;
    let last = &readings[readings.len() - 1];
    let span_end = last.timestamp
        + chrono::Duration::seconds((last.granularity.interval_hours() * 3600.0) as i64);
    let span_days = (span_end - first).num_seconds() as f64 / 86_400.0;
    let annualization_factor = DAYS_PER_YEAR / span_days.max(1.0);

    let mut hourly_average_kwh = [0.0f64; 24];
    let mut hourly_average_kw = [0.0f64; 24];
    for hour in 0..24 {
        if count_by_hour[hour] > 0 {
            let n = count_by_hour[hour] as f64;
            hourly_average_kwh[hour] = kwh_sum_by_hour[hour] / n;
            hourly_average_kw[hour] = kw_sum_by_hour[hour] / n;
        }
    }

    let profile = ConsumptionProfile {
        annual_consumption_kwh: total_kwh * annualization_factor,
        peak_demand_kw: peak_kw,
        data_span_days: span_days,
        annualization_factor,
        hourly_average_kwh,
        hourly_average_kw,
    };

    debug!(
        readings = readings.len(),
        span_days = format!("{span_days:.1}"),
        annual_kwh = format!("{:.0}", profile.annual_consumption_kwh),
        peak_kw = format!("{peak_kw:.1}"),
        "profile built"
    );

    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Granularity;
    use chrono::{Duration, TimeZone, Utc};

    /// One reading per hour for `days` days, `kwh` energy each.
    fn hourly_readings(days: i64, kwh: f64) -> Vec<MeterReading> {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .unwrap()
            .fixed_offset();
        (0..days * 24)
            .map(|i| MeterReading {
                timestamp: start + Duration::hours(i),
                granularity: Granularity::Hour,
                kwh,
                kw: None,
            })
            .collect()
    }

    #[test]
    fn test_empty_readings_rejected() {
        let err = build_profile(&[]).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[test]
    fn test_annualization_idempotent_for_full_year() {
        let readings = hourly_readings(365, 100.0);
        let profile = build_profile(&readings).unwrap();

        assert!((profile.annualization_factor - 1.0).abs() < 1e-9);
        assert!((profile.annual_consumption_kwh - 365.0 * 24.0 * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_partial_year_scaled_up() {
        // Half a year of data doubles the annualization factor
        let readings = hourly_readings(182, 100.0);
        let profile = build_profile(&readings).unwrap();

        assert!((profile.annualization_factor - 365.0 / 182.0).abs() < 1e-9);
        let expected = 182.0 * 24.0 * 100.0 * (365.0 / 182.0);
        assert!((profile.annual_consumption_kwh - expected).abs() < 1e-6);
    }

    #[test]
    fn test_peak_demand_not_prorated() {
        let mut readings = hourly_readings(30, 100.0);
        readings[100].kw = Some(480.0);
        let profile = build_profile(&readings).unwrap();

        // Energy is scaled up for the 30-day span; the peak stays as metered.
        assert!(profile.annualization_factor > 12.0);
        assert_eq!(profile.peak_demand_kw, 480.0);
    }

    #[test]
    fn test_fifteen_minute_energy_not_divided_again() {
        let start = Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .unwrap()
            .fixed_offset();
        // 4 quarter-hour readings of 25 kWh each = 100 kWh over one hour
        let readings: Vec<MeterReading> = (0..4)
            .map(|i| MeterReading {
                timestamp: start + Duration::minutes(15 * i),
                granularity: Granularity::FifteenMin,
                kwh: 25.0,
                kw: None,
            })
            .collect();
        let profile = build_profile(&readings).unwrap();

        // Sub-day span clamps to one day: 100 kWh * 365
        assert!((profile.annual_consumption_kwh - 100.0 * 365.0).abs() < 1e-6);
        // Derived demand is 25 kWh / 0.25 h = 100 kW
        assert_eq!(profile.peak_demand_kw, 100.0);
    }

    #[test]
    fn test_sub_day_span_clamped() {
        let readings = hourly_readings(1, 10.0);
        let profile = build_profile(&readings).unwrap();
        assert!((profile.annualization_factor - 365.0).abs() < 1e-9);
    }

    #[test]
    fn test_hourly_averages_by_hour_of_day() {
        let readings = hourly_readings(10, 50.0);
        let profile = build_profile(&readings).unwrap();
        for hour in 0..24 {
            assert!((profile.hourly_average_kwh[hour] - 50.0).abs() < 1e-9);
            assert!((profile.hourly_average_kw[hour] - 50.0).abs() < 1e-9);
        }
    }
}
