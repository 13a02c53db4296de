use thiserror::Error;

/// Engine error taxonomy.
///
/// "Payback never reached" is deliberately not here: it is a representable
/// result state (`FinancialMetrics::simple_payback_years == None`), not a
/// failure of the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Numeric convergence failure in {context}: no root after {iterations} iterations (tolerance {tolerance:e})")]
    NumericConvergence {
        context: String,
        iterations: usize,
        tolerance: f64,
    },

    #[error("Analysis cancelled by caller")]
    Cancelled,
}

impl EngineError {
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<validator::ValidationErrors> for EngineError {
    fn from(errors: validator::ValidationErrors) -> Self {
        EngineError::Configuration(errors.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
