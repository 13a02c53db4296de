use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use validator::Validate;

use crate::error::EngineError;

/// Engine configuration: rate schedule, incentive programs, financial
/// assumptions, and sizing policy. Everything the candidate evaluation needs
/// is resolved here before any pipeline work starts.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub sizing: SizingConfig,
    #[validate(nested)]
    pub rates: RatesConfig,
    #[validate(nested)]
    pub capex: CapexConfig,
    #[validate(nested)]
    pub incentives: IncentivesConfig,
    #[validate(nested)]
    pub finance: FinanceConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SizingConfig {
    /// Annual PV yield per installed kWp for the reference climate.
    #[validate(range(min = 1.0))]
    pub specific_yield_kwh_per_kwp: f64,
    #[validate(range(min = 0.0))]
    pub discharge_hours: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub shaving_fraction: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub target_peak_reduction: f64,
    /// Share of annual PV production coincident with on-site load.
    #[validate(range(min = 0.0, max = 1.0))]
    pub direct_use_fraction: f64,
    /// Battery throughput bound for self-consumption, in full cycles per day.
    #[validate(range(min = 0.0))]
    pub battery_cycles_per_day: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RatesConfig {
    #[validate(range(min = 0.0))]
    pub energy_rate_per_kwh: f64,
    #[validate(range(min = 0.0))]
    pub demand_rate_per_kw_month: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CapexConfig {
    #[validate(range(min = 0.0))]
    pub pv_cost_per_kw: f64,
    #[validate(range(min = 0.0))]
    pub battery_cost_per_kwh: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IncentivesConfig {
    #[validate(range(min = 0.0))]
    pub hq_solar_rate_per_kw: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub hq_solar_cap_percent: f64,
    #[validate(range(min = 0.0))]
    pub hq_battery_rate_per_kwh: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub hq_battery_cap_percent: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub federal_itc_percent: f64,
    /// Tax shield applied to the depreciable basis (gross CAPEX net of ITC).
    #[validate(range(min = 0.0, max = 1.0))]
    pub tax_shield_percent: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FinanceConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub discount_rate: f64,
    #[validate(range(min = 1, max = 50))]
    pub analysis_horizon_years: u32,
    /// Annual escalation applied to utility savings (price inflation).
    #[validate(range(min = -0.5, max = 0.5))]
    pub savings_escalation: f64,
    /// Annual PV output degradation used for LCOE lifetime energy.
    #[validate(range(min = 0.0, max = 0.1))]
    pub production_degradation: f64,
    /// Grid emission factor for CO2-avoided reporting.
    #[validate(range(min = 0.0))]
    pub grid_emission_factor_kg_per_kwh: f64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SFE__").split("__"));
        let cfg: Config = figment.extract()?;
        cfg.validated().map_err(Into::into)
    }

    /// Run validator rules, mapping failures into the engine taxonomy.
    pub fn validated(self) -> std::result::Result<Self, EngineError> {
        self.validate()?;
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sizing: SizingConfig {
                specific_yield_kwh_per_kwp: 1200.0,
                discharge_hours: 2.0,
                shaving_fraction: 0.30,
                target_peak_reduction: 0.15,
                direct_use_fraction: 0.45,
                battery_cycles_per_day: 1.0,
            },
            rates: RatesConfig {
                energy_rate_per_kwh: 0.073,
                demand_rate_per_kw_month: 15.5,
            },
            capex: CapexConfig {
                pv_cost_per_kw: 1800.0,
                battery_cost_per_kwh: 650.0,
            },
            incentives: IncentivesConfig {
                hq_solar_rate_per_kw: 1000.0,
                hq_solar_cap_percent: 0.40,
                hq_battery_rate_per_kwh: 300.0,
                hq_battery_cap_percent: 0.25,
                federal_itc_percent: 0.30,
                tax_shield_percent: 0.15,
            },
            finance: FinanceConfig {
                discount_rate: 0.06,
                analysis_horizon_years: 25,
                savings_escalation: 0.0,
                production_degradation: 0.005,
                grid_emission_factor_kg_per_kwh: 0.03,
            },
        }
    }
}
