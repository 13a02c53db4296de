use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

use solar_feasibility_engine::domain::MeterReading;
use solar_feasibility_engine::{telemetry, Config, FeasibilityEngine};

/// Runs the full pipeline against a JSON file of parsed meter readings and
/// prints the resulting simulation run (with its sensitivity analysis) as
/// JSON. Meter-file parsing itself belongs to the ingestion collaborator.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let cfg = Config::load()?;

    let readings_path = std::env::args()
        .nth(1)
        .context("usage: solar-feasibility-engine <readings.json>")?;
    let raw = tokio::fs::read_to_string(&readings_path)
        .await
        .with_context(|| format!("reading {readings_path}"))?;
    let readings: Vec<MeterReading> =
        serde_json::from_str(&raw).context("parsing meter readings")?;
    info!(count = readings.len(), path = %readings_path, "readings loaded");

    let engine = FeasibilityEngine::new(cfg)?;
    let token = telemetry::cancel_on_ctrl_c();
    let run = engine
        .run_analysis_with_sweep(Uuid::new_v4(), &readings, token)
        .await?;

    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}
