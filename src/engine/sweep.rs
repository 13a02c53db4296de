use std::cmp::Reverse;
use std::sync::Arc;

use futures::future::join_all;
use ordered_float::OrderedFloat;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::evaluate_candidate;
use crate::config::Config;
use crate::domain::{
    ConsumptionProfile, EvaluatedCandidate, OptimalScenarios, SensitivityAnalysis, SizingCandidate,
};
use crate::engine::rates::RateSchedule;
use crate::error::{EngineError, Result};

/// Evaluate every grid candidate and select per-objective optima.
///
/// Each grid point is a pure function of its inputs, so candidates fan out
/// across tokio tasks with no shared mutable state and are gathered with a
/// single join. The cancellation token is checked per grid point; a
/// candidate whose evaluation fails is logged and excluded from selection
/// instead of aborting the sweep.
pub async fn run(
    profile: &ConsumptionProfile,
    candidates: Vec<SizingCandidate>,
    config: Arc<Config>,
    rates: Arc<dyn RateSchedule>,
    token: CancellationToken,
) -> Result<SensitivityAnalysis> {
    if token.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    if candidates.is_empty() {
        return Err(EngineError::insufficient_data("empty candidate grid"));
    }

    let profile = Arc::new(profile.clone());
    let total = candidates.len();

    let tasks = candidates.into_iter().map(|candidate| {
        let profile = Arc::clone(&profile);
        let config = Arc::clone(&config);
        let rates = Arc::clone(&rates);
        let token = token.clone();
        tokio::spawn(async move {
            if token.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            evaluate_candidate(&profile, &candidate, &config, rates.as_ref())
        })
    });

    let mut sweep_results = Vec::with_capacity(total);
    let mut failed_points = 0usize;
    for joined in join_all(tasks).await {
        match joined {
            Ok(Ok(evaluated)) => sweep_results.push(evaluated),
            Ok(Err(EngineError::Cancelled)) => return Err(EngineError::Cancelled),
            Ok(Err(err)) => {
                warn!(error = %err, "grid point excluded from sweep");
                failed_points += 1;
            }
            Err(err) => {
                warn!(error = %err, "grid point task failed");
                failed_points += 1;
            }
        }
    }
    if token.is_cancelled() {
        return Err(EngineError::Cancelled);
    }

    let optimal_scenarios = select_optima(&sweep_results);
    info!(
        evaluated = sweep_results.len(),
        failed = failed_points,
        "sensitivity sweep complete"
    );

    Ok(SensitivityAnalysis {
        sweep_results,
        optimal_scenarios,
        failed_points,
    })
}

/// Independent max-reductions per objective, each with a total order so
/// repeated runs on identical input select identical candidates.
pub fn select_optima(results: &[EvaluatedCandidate]) -> OptimalScenarios {
    let best_npv = results
        .iter()
        .max_by_key(|c| OrderedFloat(c.metrics.npv))
        .cloned();

    // Zero-investment candidates have no defined rate of return.
    let best_irr = results
        .iter()
        .filter(|c| c.capex.net_capex > 0.0)
        .filter_map(|c| c.metrics.irr.map(|rate| (c, rate)))
        .max_by_key(|(_, rate)| OrderedFloat(*rate))
        .map(|(c, _)| c.clone());

    // Ties on self-sufficiency go to the cheaper system.
    let max_self_sufficiency = results
        .iter()
        .max_by_key(|c| {
            (
                OrderedFloat(c.self_sufficiency),
                Reverse(OrderedFloat(c.capex.net_capex)),
            )
        })
        .cloned();

    OptimalScenarios {
        best_npv,
        best_irr,
        max_self_sufficiency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GridSpec;
    use crate::engine::rates::FlatRateSchedule;
    use crate::engine::sizing;

    fn profile(annual_kwh: f64, peak_kw: f64) -> ConsumptionProfile {
        ConsumptionProfile {
            annual_consumption_kwh: annual_kwh,
            peak_demand_kw: peak_kw,
            data_span_days: 365.0,
            annualization_factor: 1.0,
            hourly_average_kwh: [0.0; 24],
            hourly_average_kw: [0.0; 24],
        }
    }

    fn sweep_inputs() -> (
        ConsumptionProfile,
        Vec<SizingCandidate>,
        Arc<Config>,
        Arc<dyn RateSchedule>,
    ) {
        let config = Arc::new(Config::default());
        let p = profile(1_200_000.0, 300.0);
        let primary = sizing::recommend(&p, &config.sizing);
        let grid = sizing::candidate_grid(&p, &GridSpec::around(&primary), &config.sizing);
        let rates: Arc<dyn RateSchedule> = Arc::new(FlatRateSchedule::from(&config.rates));
        (p, grid, config, rates)
    }

    #[tokio::test]
    async fn test_sweep_evaluates_whole_grid() {
        let (p, grid, config, rates) = sweep_inputs();
        let n = grid.len();
        let analysis = run(&p, grid, config, rates, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(analysis.sweep_results.len(), n);
        assert_eq!(analysis.failed_points, 0);
        assert!(analysis.optimal_scenarios.best_npv.is_some());
        assert!(analysis.optimal_scenarios.best_irr.is_some());
        assert!(analysis.optimal_scenarios.max_self_sufficiency.is_some());
    }

    #[tokio::test]
    async fn test_sweep_is_deterministic() {
        let (p, grid, config, rates) = sweep_inputs();
        let first = run(
            &p,
            grid.clone(),
            Arc::clone(&config),
            Arc::clone(&rates),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        let second = run(&p, grid, config, rates, CancellationToken::new())
            .await
            .unwrap();

        let a = first.optimal_scenarios.best_npv.unwrap().candidate;
        let b = second.optimal_scenarios.best_npv.unwrap().candidate;
        assert_eq!(a, b);

        let a = first.optimal_scenarios.max_self_sufficiency.unwrap().candidate;
        let b = second.optimal_scenarios.max_self_sufficiency.unwrap().candidate;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (p, grid, config, rates) = sweep_inputs();
        let token = CancellationToken::new();
        token.cancel();
        let err = run(&p, grid, config, rates, token).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }

    #[tokio::test]
    async fn test_empty_grid_rejected() {
        let (p, _, config, rates) = sweep_inputs();
        let err = run(&p, Vec::new(), config, rates, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn test_failed_points_excluded_not_fatal() {
        // An uncapped oversubsidizing program makes every PV-carrying grid
        // point fail; battery-only points still evaluate.
        let mut config = Config::default();
        config.incentives.hq_solar_rate_per_kw = 50_000.0;
        config.incentives.hq_solar_cap_percent = 1.0;
        let config = Arc::new(config);

        let p = profile(1_200_000.0, 300.0);
        let rates: Arc<dyn RateSchedule> = Arc::new(FlatRateSchedule::from(&config.rates));
        let grid = vec![
            SizingCandidate {
                pv_size_kw: 1000.0,
                batt_energy_kwh: 600.0,
                batt_power_kw: 90.0,
                demand_shaving_setpoint_kw: 255.0,
            },
            SizingCandidate {
                pv_size_kw: 0.0,
                batt_energy_kwh: 600.0,
                batt_power_kw: 90.0,
                demand_shaving_setpoint_kw: 255.0,
            },
        ];

        let analysis = run(&p, grid, config, rates, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(analysis.failed_points, 1);
        assert_eq!(analysis.sweep_results.len(), 1);
        assert_eq!(
            analysis.sweep_results[0].candidate.pv_size_kw,
            0.0
        );
    }

    #[test]
    fn test_best_irr_excludes_zero_investment() {
        let (p, grid, config, rates) = sweep_inputs();
        let mut evaluated: Vec<EvaluatedCandidate> = grid
            .iter()
            .take(3)
            .map(|c| evaluate_candidate(&p, c, &config, rates.as_ref()).unwrap())
            .collect();

        // Forge a degenerate free candidate with an absurd IRR
        evaluated[0].capex.net_capex = 0.0;
        evaluated[0].metrics.irr = Some(99.0);

        let optima = select_optima(&evaluated);
        let best = optima.best_irr.unwrap();
        assert!(best.capex.net_capex > 0.0);
        assert_ne!(best.metrics.irr, Some(99.0));
    }

    #[test]
    fn test_self_sufficiency_tie_breaks_on_lower_capex() {
        let (p, grid, config, rates) = sweep_inputs();
        let base = evaluate_candidate(&p, &grid[0], &config, rates.as_ref()).unwrap();

        let mut cheap = base.clone();
        cheap.self_sufficiency = 0.5;
        cheap.capex.net_capex = 100_000.0;
        let mut expensive = base.clone();
        expensive.self_sufficiency = 0.5;
        expensive.capex.net_capex = 900_000.0;

        let optima = select_optima(&[expensive, cheap]);
        assert_eq!(
            optima.max_self_sufficiency.unwrap().capex.net_capex,
            100_000.0
        );
    }

    #[test]
    fn test_select_optima_empty_is_all_none() {
        let optima = select_optima(&[]);
        assert!(optima.best_npv.is_none());
        assert!(optima.best_irr.is_none());
        assert!(optima.max_self_sufficiency.is_none());
    }
}
