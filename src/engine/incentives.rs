use tracing::debug;

use crate::config::{CapexConfig, IncentivesConfig};
use crate::domain::{CapexBreakdown, IncentiveStack, SizingCandidate};
use crate::error::{EngineError, Result};

/// Gross installed cost from unit costs, reduced to net by the incentive
/// stack.
pub fn capex_breakdown(
    candidate: &SizingCandidate,
    capex: &CapexConfig,
    incentives: &IncentiveStack,
) -> CapexBreakdown {
    let pv_capex = candidate.pv_size_kw * capex.pv_cost_per_kw;
    let battery_capex = candidate.batt_energy_kwh * capex.battery_cost_per_kwh;
    let gross_capex = pv_capex + battery_capex;
    CapexBreakdown {
        pv_capex,
        battery_capex,
        gross_capex,
        net_capex: (gross_capex - incentives.total).max(0.0),
    }
}

/// Capped-percentage incentive stack.
///
/// Each capacity-based program contributes `min(rate * capacity,
/// cap_percent * gross)`. A single program whose uncapped claim exceeds
/// gross CAPEX with no cap to stop it is a configuration problem, not a
/// subsidy; the summed total is clamped to gross CAPEX.
pub fn incentive_stack(
    candidate: &SizingCandidate,
    gross_capex: f64,
    cfg: &IncentivesConfig,
) -> Result<IncentiveStack> {
    let hq_solar = capped_program(
        "hq_solar",
        cfg.hq_solar_rate_per_kw * candidate.pv_size_kw,
        cfg.hq_solar_cap_percent,
        gross_capex,
    )?;
    let hq_battery = capped_program(
        "hq_battery",
        cfg.hq_battery_rate_per_kwh * candidate.batt_energy_kwh,
        cfg.hq_battery_cap_percent,
        gross_capex,
    )?;

    let federal_itc = cfg.federal_itc_percent * gross_capex;
    // Depreciation shield on the basis the ITC leaves behind
    let tax_shield = cfg.tax_shield_percent * (gross_capex - federal_itc).max(0.0);

    let raw_total = hq_solar + hq_battery + federal_itc + tax_shield;
    let total = raw_total.min(gross_capex);
    if raw_total > gross_capex {
        debug!(
            raw_total = format!("{raw_total:.0}"),
            gross_capex = format!("{gross_capex:.0}"),
            "incentive stack clamped to gross CAPEX"
        );
    }

    Ok(IncentiveStack {
        hq_solar,
        hq_battery,
        federal_itc,
        tax_shield,
        total,
    })
}

fn capped_program(name: &str, raw: f64, cap_percent: f64, gross_capex: f64) -> Result<f64> {
    let cap = cap_percent * gross_capex;
    if raw > gross_capex && cap >= gross_capex {
        return Err(EngineError::configuration(format!(
            "incentive program {name} would exceed gross CAPEX ({raw:.0} > {gross_capex:.0}) \
             with no effective cap"
        )));
    }
    Ok(raw.min(cap))
}
