use serde::{Deserialize, Serialize};
use std::fmt;

/// One candidate PV + battery system size.
///
/// Immutable once generated; the sizing heuristic emits the primary
/// recommendation and the sensitivity sweep emits a grid of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SizingCandidate {
    pub pv_size_kw: f64,
    pub batt_energy_kwh: f64,
    pub batt_power_kw: f64,
    /// Grid-draw ceiling the battery defends during peak-demand windows.
    pub demand_shaving_setpoint_kw: f64,
}

impl SizingCandidate {
    pub fn zero() -> Self {
        Self {
            pv_size_kw: 0.0,
            batt_energy_kwh: 0.0,
            batt_power_kw: 0.0,
            demand_shaving_setpoint_kw: 0.0,
        }
    }

    /// Zero-sized candidates are infeasible; callers must not run the
    /// cash-flow pipeline on one.
    pub fn is_zero_sized(&self) -> bool {
        self.pv_size_kw == 0.0 && self.batt_energy_kwh == 0.0
    }
}

impl fmt::Display for SizingCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.0} kW PV / {:.0} kWh / {:.0} kW battery",
            self.pv_size_kw, self.batt_energy_kwh, self.batt_power_kw
        )
    }
}

/// Grid specification for the sensitivity sweep.
///
/// Either explicit ranges per axis, or the reduced parametrization from
/// [`GridSpec::around`] that spans 50%..150% of a primary recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSpec {
    pub pv_kw: AxisSpec,
    pub batt_energy_kwh: AxisSpec,
    pub batt_power_kw: AxisSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisSpec {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AxisSpec {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Inclusive sample points along this axis.
    pub fn points(&self) -> Vec<f64> {
        if self.step <= 0.0 || self.max < self.min {
            return vec![self.min];
        }
        let mut out = Vec::new();
        let mut v = self.min;
        while v <= self.max + 1e-9 {
            out.push(v);
            v += self.step;
        }
        out
    }
}

impl GridSpec {
    /// Reduced parametrization: a coarse grid centered on the heuristic's
    /// primary recommendation, bounding the search to sizes a designer
    /// would actually quote.
    pub fn around(primary: &SizingCandidate) -> Self {
        let axis = |center: f64| {
            if center <= 0.0 {
                AxisSpec::new(0.0, 0.0, 0.0)
            } else {
                AxisSpec::new(center * 0.5, center * 1.5, center * 0.25)
            }
        };
        Self {
            pv_kw: axis(primary.pv_size_kw),
            batt_energy_kwh: axis(primary.batt_energy_kwh),
            batt_power_kw: axis(primary.batt_power_kw),
        }
    }

    pub fn point_count(&self) -> usize {
        self.pv_kw.points().len()
            * self.batt_energy_kwh.points().len()
            * self.batt_power_kw.points().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_candidate_is_infeasible() {
        assert!(SizingCandidate::zero().is_zero_sized());
        let sized = SizingCandidate {
            pv_size_kw: 100.0,
            batt_energy_kwh: 0.0,
            batt_power_kw: 0.0,
            demand_shaving_setpoint_kw: 0.0,
        };
        assert!(!sized.is_zero_sized());
    }

    #[test]
    fn test_axis_points_inclusive() {
        let axis = AxisSpec::new(500.0, 1500.0, 250.0);
        assert_eq!(axis.points(), vec![500.0, 750.0, 1000.0, 1250.0, 1500.0]);
    }

    #[test]
    fn test_axis_degenerate_step() {
        let axis = AxisSpec::new(100.0, 100.0, 0.0);
        assert_eq!(axis.points(), vec![100.0]);
    }

    #[test]
    fn test_grid_around_primary() {
        let primary = SizingCandidate {
            pv_size_kw: 1000.0,
            batt_energy_kwh: 600.0,
            batt_power_kw: 90.0,
            demand_shaving_setpoint_kw: 255.0,
        };
        let grid = GridSpec::around(&primary);
        assert_eq!(grid.pv_kw.points().len(), 5);
        assert_eq!(grid.point_count(), 125);
    }
}
