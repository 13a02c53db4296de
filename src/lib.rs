//! Potential analysis and financial feasibility engine for commercial
//! PV + battery systems.
//!
//! The engine turns already-parsed utility interval readings into a
//! consumption profile, a first-pass system sizing, a multi-year financial
//! case under a layered incentive regime, and a sensitivity sweep that
//! selects scenario-optimal designs. Everything around it (ingestion, UI,
//! persistence, document rendering) is a collaborator, not part of this
//! crate.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use config::Config;
pub use engine::{merge_scenario, FeasibilityEngine};
pub use error::EngineError;
