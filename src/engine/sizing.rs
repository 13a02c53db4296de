use itertools::iproduct;
use tracing::debug;

use crate::config::SizingConfig;
use crate::domain::{ConsumptionProfile, GridSpec, SizingCandidate};

/// First-pass PV + battery recommendation from the consumption profile.
///
/// Policy, not physics: PV covers annual consumption at the regional
/// specific yield, battery energy covers `discharge_hours` of peak demand,
/// battery power covers `shaving_fraction` of the peak, and the shaving
/// setpoint targets a `target_peak_reduction` cut.
pub fn recommend(profile: &ConsumptionProfile, params: &SizingConfig) -> SizingCandidate {
    if profile.annual_consumption_kwh <= 0.0 {
        // Infeasible site; callers must not run the cash-flow pipeline on it.
        return SizingCandidate::zero();
    }

    let candidate = SizingCandidate {
        pv_size_kw: (profile.annual_consumption_kwh / params.specific_yield_kwh_per_kwp).round(),
        batt_energy_kwh: (profile.peak_demand_kw * params.discharge_hours).round(),
        batt_power_kw: (profile.peak_demand_kw * params.shaving_fraction).round(),
        demand_shaving_setpoint_kw: (profile.peak_demand_kw
            * (1.0 - params.target_peak_reduction))
            .round(),
    };

    debug!(%candidate, "primary sizing recommendation");
    candidate
}

/// Expand a grid specification into concrete sweep candidates.
///
/// The shaving setpoint is re-derived per point from the profile peak so
/// every candidate defends the same target reduction.
pub fn candidate_grid(
    profile: &ConsumptionProfile,
    spec: &GridSpec,
    params: &SizingConfig,
) -> Vec<SizingCandidate> {
    let setpoint = (profile.peak_demand_kw * (1.0 - params.target_peak_reduction)).round();
    iproduct!(
        spec.pv_kw.points(),
        spec.batt_energy_kwh.points(),
        spec.batt_power_kw.points()
    )
    .map(|(pv, energy, power)| SizingCandidate {
        pv_size_kw: pv,
        batt_energy_kwh: energy,
        batt_power_kw: power,
        demand_shaving_setpoint_kw: setpoint,
    })
    .collect()
}
