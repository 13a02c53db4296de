use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sizing::SizingCandidate;

/// Gross installed cost and its reduction to net through the incentive stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapexBreakdown {
    pub pv_capex: f64,
    pub battery_capex: f64,
    pub gross_capex: f64,
    pub net_capex: f64,
}

/// Layered incentive/tax stack applied against gross CAPEX.
///
/// Computed once per candidate from program rules and never mutated after
/// creation. `total` is already clamped to gross CAPEX.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncentiveStack {
    pub hq_solar: f64,
    pub hq_battery: f64,
    pub federal_itc: f64,
    pub tax_shield: f64,
    pub total: f64,
}

/// Billed utility cost before and after a candidate system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostComparison {
    pub annual_cost_before: f64,
    pub annual_cost_after: f64,
    pub annual_savings: f64,
}

/// One year of the projected cash-flow series.
///
/// Year 0 is the investment outflow; `cumulative` is the exact running sum
/// of `net_cashflow`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CashflowEntry {
    pub year: u32,
    pub net_cashflow: f64,
    pub cumulative: f64,
}

/// Standard investment metrics over the analysis horizon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialMetrics {
    pub npv: f64,
    /// None when IRR is undefined (zero investment, or no sign change over
    /// the solver's bracket).
    pub irr: Option<f64>,
    /// Smallest whole year where cumulative cash flow turns non-negative;
    /// None when payback is never reached within the horizon.
    pub simple_payback_years: Option<u32>,
    /// Fractional refinement of the payback year, interpolated within the
    /// break-even year.
    pub simple_payback_fractional: Option<f64>,
    pub lcoe_per_kwh: f64,
}

/// A fully evaluated sizing candidate: the financial case for one grid point
/// (or for the primary recommendation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatedCandidate {
    pub candidate: SizingCandidate,
    pub capex: CapexBreakdown,
    pub incentives: IncentiveStack,
    pub costs: CostComparison,
    pub cashflows: Vec<CashflowEntry>,
    pub metrics: FinancialMetrics,
    pub annual_production_kwh: f64,
    pub self_consumption_kwh: f64,
    /// Fraction of annual consumption met on site (direct + battery-shifted).
    pub self_sufficiency: f64,
    pub co2_avoided_kg_per_year: f64,
}

/// Persisted output of one engine invocation against a site's readings.
///
/// Read-only once created; re-runs supersede rather than mutate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    pub id: Uuid,
    pub site_id: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub annual_consumption_kwh: f64,
    pub peak_demand_kw: f64,
    pub result: EvaluatedCandidate,
    /// Sweep attached alongside the primary run, when one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<SensitivityAnalysis>,
    pub engine_version: String,
}

impl SimulationRun {
    /// Attach a sensitivity analysis, consuming the run and returning a new
    /// one. Runs are never mutated in place.
    pub fn with_sensitivity(self, sensitivity: SensitivityAnalysis) -> Self {
        Self {
            sensitivity: Some(sensitivity),
            ..self
        }
    }
}

/// Per-objective optima selected from the sweep results.
///
/// Each scenario carries the full candidate breakdown by value so it can be
/// merged into a presentation without re-running the sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimalScenarios {
    pub best_npv: Option<EvaluatedCandidate>,
    pub best_irr: Option<EvaluatedCandidate>,
    pub max_self_sufficiency: Option<EvaluatedCandidate>,
}

/// Output of the sensitivity sweep: every evaluated grid point plus the
/// per-objective selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityAnalysis {
    pub sweep_results: Vec<EvaluatedCandidate>,
    pub optimal_scenarios: OptimalScenarios,
    /// Grid points excluded from selection because their evaluation failed.
    pub failed_points: usize,
}
