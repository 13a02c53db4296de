pub mod cashflow;
pub mod incentives;
pub mod metrics;
pub mod profile;
pub mod rates;
pub mod sizing;
pub mod sweep;

use std::sync::Arc;

use chrono::Local;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    ConsumptionProfile, EvaluatedCandidate, GridSpec, MeterReading, SensitivityAnalysis,
    SimulationRun, SizingCandidate,
};
use crate::error::{EngineError, Result};
use self::rates::{FlatRateSchedule, RateSchedule};

pub const ENGINE_VERSION: &str = "feasibility-v2.0";

/// Evaluate one sizing candidate against a profile: rate and incentive
/// model, cash-flow projection, and financial metrics.
///
/// Pure function of its inputs; this is the unit the sensitivity sweep fans
/// out over. Zero-sized candidates are infeasible and never reach the
/// cash-flow stage.
pub fn evaluate_candidate(
    profile: &ConsumptionProfile,
    candidate: &SizingCandidate,
    config: &Config,
    rate_schedule: &dyn RateSchedule,
) -> Result<EvaluatedCandidate> {
    if candidate.is_zero_sized() {
        return Err(EngineError::insufficient_data(
            "zero-sized candidate is infeasible",
        ));
    }

    let annual_production_kwh = rates::annual_production_kwh(candidate, &config.sizing);
    let self_consumption_kwh = rates::self_consumption_kwh(profile, candidate, &config.sizing);
    let costs = rates::cost_comparison(profile, candidate, rate_schedule, &config.sizing);

    let gross_capex = candidate.pv_size_kw * config.capex.pv_cost_per_kw
        + candidate.batt_energy_kwh * config.capex.battery_cost_per_kwh;
    let incentive_stack = incentives::incentive_stack(candidate, gross_capex, &config.incentives)?;
    let capex = incentives::capex_breakdown(candidate, &config.capex, &incentive_stack);

    let cashflows = cashflow::project(
        capex.net_capex,
        costs.annual_savings,
        config.finance.analysis_horizon_years,
        config.finance.savings_escalation,
    );
    let metrics = metrics::evaluate(
        &cashflows,
        annual_production_kwh,
        config.finance.discount_rate,
        config.finance.production_degradation,
    )?;

    let self_sufficiency = if profile.annual_consumption_kwh > 0.0 {
        self_consumption_kwh / profile.annual_consumption_kwh
    } else {
        0.0
    };

    Ok(EvaluatedCandidate {
        candidate: *candidate,
        capex,
        incentives: incentive_stack,
        costs,
        cashflows,
        metrics,
        annual_production_kwh,
        self_consumption_kwh,
        self_sufficiency,
        co2_avoided_kg_per_year: self_consumption_kwh
            * config.finance.grid_emission_factor_kg_per_kwh,
    })
}

/// The potential-analysis pipeline: profile, sizing heuristic, rate and
/// incentive model, cash-flow projection, metrics, and sensitivity sweep.
pub struct FeasibilityEngine {
    config: Arc<Config>,
    rate_schedule: Arc<dyn RateSchedule>,
}

impl FeasibilityEngine {
    /// Engine with the flat rate schedule taken from config.
    pub fn new(config: Config) -> Result<Self> {
        let config = config.validated()?;
        let rate_schedule: Arc<dyn RateSchedule> =
            Arc::new(FlatRateSchedule::from(&config.rates));
        Ok(Self {
            config: Arc::new(config),
            rate_schedule,
        })
    }

    /// Engine with a substituted rate schedule (tiered, TOU, ...).
    pub fn with_rate_schedule(
        config: Config,
        rate_schedule: Arc<dyn RateSchedule>,
    ) -> Result<Self> {
        let config = config.validated()?;
        Ok(Self {
            config: Arc::new(config),
            rate_schedule,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Primary entry point: readings to a stored-ready simulation result.
    ///
    /// Deterministic in its financial output given identical readings and
    /// config (the run id and timestamp are fresh per invocation).
    pub fn run_analysis(&self, site_id: Uuid, readings: &[MeterReading]) -> Result<SimulationRun> {
        let profile = profile::build_profile(readings)?;
        self.analyze_profile(site_id, &profile)
    }

    /// One-pass convenience entry point: the primary analysis plus a
    /// sensitivity sweep over a grid derived from the recommendation,
    /// attached to the returned run. Profile and sizing run exactly once.
    pub async fn run_analysis_with_sweep(
        &self,
        site_id: Uuid,
        readings: &[MeterReading],
        token: CancellationToken,
    ) -> Result<SimulationRun> {
        let profile = profile::build_profile(readings)?;
        let run = self.analyze_profile(site_id, &profile)?;
        let grid_spec = GridSpec::around(&run.result.candidate);
        let analysis = self
            .run_sensitivity_sweep(&profile, &grid_spec, token)
            .await?;
        Ok(run.with_sensitivity(analysis))
    }

    fn analyze_profile(&self, site_id: Uuid, profile: &ConsumptionProfile) -> Result<SimulationRun> {
        let primary = sizing::recommend(profile, &self.config.sizing);
        if primary.is_zero_sized() {
            return Err(EngineError::insufficient_data(
                "metered consumption is zero; no feasible system to analyze",
            ));
        }

        let result =
            evaluate_candidate(profile, &primary, &self.config, self.rate_schedule.as_ref())?;
        info!(
            %site_id,
            candidate = %primary,
            npv = format!("{:.0}", result.metrics.npv),
            "analysis complete"
        );

        Ok(SimulationRun {
            id: Uuid::new_v4(),
            site_id,
            created_at: Local::now().fixed_offset(),
            annual_consumption_kwh: profile.annual_consumption_kwh,
            peak_demand_kw: profile.peak_demand_kw,
            result,
            sensitivity: None,
            engine_version: ENGINE_VERSION.to_string(),
        })
    }

    /// Standalone what-if exploration over a candidate grid; does not create
    /// or supersede any simulation run.
    pub async fn run_sensitivity_sweep(
        &self,
        profile: &ConsumptionProfile,
        grid_spec: &GridSpec,
        token: CancellationToken,
    ) -> Result<SensitivityAnalysis> {
        let candidates = sizing::candidate_grid(profile, grid_spec, &self.config.sizing);
        sweep::run(
            profile,
            candidates,
            Arc::clone(&self.config),
            Arc::clone(&self.rate_schedule),
            token,
        )
        .await
    }
}

/// Reconstruct a simulation run around an optimal scenario picked from a
/// sweep.
///
/// Returns a new immutable run carrying the scenario's full breakdown; the
/// scenario's cash-flow series is rebuilt so the cumulative-sum invariant
/// holds even if the supplied summary was rounded or stale upstream.
pub fn merge_scenario(base: &SimulationRun, scenario: &EvaluatedCandidate) -> SimulationRun {
    let mut result = scenario.clone();
    result.cashflows = cashflow::rebuild(&scenario.cashflows);
    SimulationRun {
        id: Uuid::new_v4(),
        site_id: base.site_id,
        created_at: Local::now().fixed_offset(),
        annual_consumption_kwh: base.annual_consumption_kwh,
        peak_demand_kw: base.peak_demand_kw,
        result,
        sensitivity: base.sensitivity.clone(),
        engine_version: base.engine_version.clone(),
    }
}
