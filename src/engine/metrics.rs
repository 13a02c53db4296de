use crate::domain::{CashflowEntry, FinancialMetrics};
use crate::error::{EngineError, Result};

const IRR_TOLERANCE: f64 = 1e-7;
const IRR_MAX_ITERATIONS: usize = 200;
const IRR_BRACKET_LOW: f64 = -0.99;
const IRR_BRACKET_HIGH: f64 = 10.0;

/// Net present value of a cash-flow series. Year 0 is undiscounted: the
/// outflow is already at present time.
pub fn npv(entries: &[CashflowEntry], rate: f64) -> f64 {
    entries
        .iter()
        .map(|e| e.net_cashflow / (1.0 + rate).powi(e.year as i32))
        .sum()
}

/// Internal rate of return, solved numerically as the root of NPV(rate).
///
/// A closed-form annuity shortcut is only valid for level cash flows and
/// breaks down under escalation or variable-year incentives, so the root is
/// found by bisection with a Newton polish. Returns `Ok(None)` when IRR is
/// undefined: no investment outflow, or no sign change over the bracket.
pub fn irr(entries: &[CashflowEntry]) -> Result<Option<f64>> {
    if entries.is_empty() || entries[0].net_cashflow >= 0.0 {
        // Zero (or negative) investment: the rate-of-return question has no
        // answer, which is distinct from a solver failure.
        return Ok(None);
    }

    let f = |rate: f64| npv(entries, rate);

    let mut low = IRR_BRACKET_LOW;
    let mut high = IRR_BRACKET_HIGH;
    let mut f_low = f(low);
    let f_high = f(high);
    if f_low * f_high > 0.0 {
        return Ok(None);
    }

    let mut mid = 0.0;
    for _ in 0..IRR_MAX_ITERATIONS {
        mid = (low + high) / 2.0;
        let f_mid = f(mid);

        if f_mid.abs() < IRR_TOLERANCE || (high - low) < IRR_TOLERANCE {
            return Ok(Some(newton_polish(&f, mid)));
        }

        if f_low * f_mid < 0.0 {
            high = mid;
        } else {
            low = mid;
            f_low = f_mid;
        }
    }

    if f(mid).abs() < IRR_TOLERANCE * 1e3 {
        return Ok(Some(mid));
    }
    Err(EngineError::NumericConvergence {
        context: "IRR bisection".to_string(),
        iterations: IRR_MAX_ITERATIONS,
        tolerance: IRR_TOLERANCE,
    })
}

/// A few Newton steps with a numeric derivative to tighten the bisection
/// result. Falls back to the input on a flat derivative.
fn newton_polish<F: Fn(f64) -> f64>(f: &F, guess: f64) -> f64 {
    let h = 1e-8;
    let mut x = guess;
    for _ in 0..4 {
        let fx = f(x);
        if fx.abs() < IRR_TOLERANCE {
            return x;
        }
        let derivative = (f(x + h) - f(x - h)) / (2.0 * h);
        if derivative.abs() < 1e-12 {
            return x;
        }
        let next = x - fx / derivative;
        if !(IRR_BRACKET_LOW..=IRR_BRACKET_HIGH).contains(&next) {
            return x;
        }
        x = next;
    }
    x
}

/// Smallest whole year where cumulative cash flow turns non-negative.
/// `None` means payback is never reached within the horizon.
pub fn simple_payback(entries: &[CashflowEntry]) -> Option<u32> {
    entries.iter().find(|e| e.cumulative >= 0.0).map(|e| e.year)
}

/// Fractional payback, interpolating within the break-even year.
pub fn simple_payback_fractional(entries: &[CashflowEntry]) -> Option<f64> {
    let year = simple_payback(entries)?;
    if year == 0 {
        return Some(0.0);
    }
    let idx = year as usize;
    let prev_cumulative = entries[idx - 1].cumulative;
    let net = entries[idx].net_cashflow;
    if net <= 0.0 {
        return Some(year as f64);
    }
    Some((year - 1) as f64 + (-prev_cumulative) / net)
}

/// Levelized cost of energy: discounted lifetime cost over discounted
/// lifetime production, with the same discount rate as NPV so scenarios
/// compare on one basis. Returns 0 for candidates that produce nothing.
pub fn lcoe(
    capex_net: f64,
    annual_production_kwh: f64,
    horizon_years: u32,
    discount_rate: f64,
    degradation: f64,
) -> f64 {
    if annual_production_kwh <= 0.0 {
        return 0.0;
    }
    let discounted_energy: f64 = (1..=horizon_years)
        .map(|y| {
            annual_production_kwh * (1.0 - degradation).powi(y as i32 - 1)
                / (1.0 + discount_rate).powi(y as i32)
        })
        .sum();
    if discounted_energy <= 0.0 {
        return 0.0;
    }
    capex_net / discounted_energy
}

/// Full metric set for one cash-flow series.
pub fn evaluate(
    entries: &[CashflowEntry],
    annual_production_kwh: f64,
    discount_rate: f64,
    degradation: f64,
) -> Result<FinancialMetrics> {
    let horizon = entries.len().saturating_sub(1) as u32;
    Ok(FinancialMetrics {
        npv: npv(entries, discount_rate),
        irr: irr(entries)?,
        simple_payback_years: simple_payback(entries),
        simple_payback_fractional: simple_payback_fractional(entries),
        lcoe_per_kwh: lcoe(
            -entries.first().map(|e| e.net_cashflow).unwrap_or(0.0),
            annual_production_kwh,
            horizon,
            discount_rate,
            degradation,
        ),
    })
}
