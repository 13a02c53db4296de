use crate::config::{RatesConfig, SizingConfig};
use crate::domain::{ConsumptionProfile, CostComparison, SizingCandidate};

const DAYS_PER_YEAR: f64 = 365.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Pluggable utility rate schedule.
///
/// The engine only ever talks to this trait, so tiered or time-of-use
/// schedules can replace the flat one without touching the pipeline.
pub trait RateSchedule: Send + Sync {
    /// Annual energy charge for the given consumption.
    fn annual_energy_cost(&self, annual_kwh: f64) -> f64;

    /// Annual demand charge for the given billed peak.
    fn annual_demand_cost(&self, billed_peak_kw: f64) -> f64;
}

/// Flat volumetric + monthly demand-charge schedule.
#[derive(Debug, Clone)]
pub struct FlatRateSchedule {
    pub energy_rate_per_kwh: f64,
    pub demand_rate_per_kw_month: f64,
}

impl From<&RatesConfig> for FlatRateSchedule {
    fn from(cfg: &RatesConfig) -> Self {
        Self {
            energy_rate_per_kwh: cfg.energy_rate_per_kwh,
            demand_rate_per_kw_month: cfg.demand_rate_per_kw_month,
        }
    }
}

impl RateSchedule for FlatRateSchedule {
    fn annual_energy_cost(&self, annual_kwh: f64) -> f64 {
        annual_kwh * self.energy_rate_per_kwh
    }

    fn annual_demand_cost(&self, billed_peak_kw: f64) -> f64 {
        billed_peak_kw * self.demand_rate_per_kw_month * MONTHS_PER_YEAR
    }
}

/// Annual PV production at the regional specific yield.
pub fn annual_production_kwh(candidate: &SizingCandidate, params: &SizingConfig) -> f64 {
    candidate.pv_size_kw * params.specific_yield_kwh_per_kwp
}

/// Annual self-consumed energy: the direct-use share of production plus
/// battery-shifted surplus bounded by cycle throughput, capped by both
/// production and consumption.
pub fn self_consumption_kwh(
    profile: &ConsumptionProfile,
    candidate: &SizingCandidate,
    params: &SizingConfig,
) -> f64 {
    let production = annual_production_kwh(candidate, params);
    let direct = (production * params.direct_use_fraction).min(profile.annual_consumption_kwh);
    let surplus = production - direct;
    let shiftable =
        candidate.batt_energy_kwh * params.battery_cycles_per_day * DAYS_PER_YEAR;
    (direct + surplus.min(shiftable))
        .min(production)
        .min(profile.annual_consumption_kwh)
}

/// Peak reduction the battery can actually deliver: bounded by its power
/// rating and by the gap between metered peak and the shaving setpoint.
pub fn shaved_peak_kw(profile: &ConsumptionProfile, candidate: &SizingCandidate) -> f64 {
    let target_cut = (profile.peak_demand_kw - candidate.demand_shaving_setpoint_kw).max(0.0);
    candidate.batt_power_kw.min(target_cut)
}

/// Billed cost before and after the candidate system.
///
/// Savings are clamped so cost-after never goes negative: this model has no
/// export compensation, so a system cannot overproduce into a negative bill.
pub fn cost_comparison(
    profile: &ConsumptionProfile,
    candidate: &SizingCandidate,
    rates: &dyn RateSchedule,
    params: &SizingConfig,
) -> CostComparison {
    let annual_cost_before = rates.annual_energy_cost(profile.annual_consumption_kwh)
        + rates.annual_demand_cost(profile.peak_demand_kw);

    let energy_savings = rates.annual_energy_cost(self_consumption_kwh(profile, candidate, params));
    let demand_savings = rates.annual_demand_cost(shaved_peak_kw(profile, candidate));

    let annual_savings = (energy_savings + demand_savings).min(annual_cost_before);

    CostComparison {
        annual_cost_before,
        annual_cost_after: annual_cost_before - annual_savings,
        annual_savings,
    }
}
