use crate::domain::CashflowEntry;

/// Project the year-by-year cash-flow series over the analysis horizon.
///
/// Year 0 is the investment outflow; years 1..=horizon carry the annual
/// savings, escalated when a non-zero escalation is configured. The series
/// always has `horizon + 1` entries and `cumulative` is the exact running
/// sum of `net_cashflow`.
pub fn project(
    capex_net: f64,
    annual_savings: f64,
    horizon_years: u32,
    escalation: f64,
) -> Vec<CashflowEntry> {
    let mut entries = Vec::with_capacity(horizon_years as usize + 1);
    let mut cumulative = -capex_net;
    entries.push(CashflowEntry {
        year: 0,
        net_cashflow: -capex_net,
        cumulative,
    });

    for year in 1..=horizon_years {
        let net = annual_savings * (1.0 + escalation).powi(year as i32 - 1);
        cumulative += net;
        entries.push(CashflowEntry {
            year,
            net_cashflow: net,
            cumulative,
        });
    }

    entries
}

/// Re-derive a consistent series from upstream-summarized entries.
///
/// Upstream scenario objects may carry stale or rounded cumulative values;
/// only the net cash flows are trusted, and every cumulative is recomputed
/// from the first entry so the running-sum invariant holds exactly.
pub fn rebuild(entries: &[CashflowEntry]) -> Vec<CashflowEntry> {
    let mut cumulative = 0.0;
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            cumulative += e.net_cashflow;
            CashflowEntry {
                year: i as u32,
                net_cashflow: e.net_cashflow,
                cumulative,
            }
        })
        .collect()
}
