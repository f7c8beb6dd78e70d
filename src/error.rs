//! Error taxonomy for the planning engine
//!
//! Configuration and calibration problems are fatal: the run either completes
//! in full or fails, there is no degraded-output mode. Numerical noise inside
//! the survival recursions is clamped locally and never surfaces here.

use thiserror::Error;

/// Errors surfaced by the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Table/sex combination that no data source supports
    #[error("unsupported mortality table/sex combination: {table} / {sex}")]
    UnsupportedTable { table: String, sex: String },

    /// A table kind was requested whose data has not been loaded
    #[error("mortality table data not loaded: {0}")]
    MissingTableData(String),

    /// Invalid or inconsistent configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Life-expectancy bisection exhausted its iteration budget
    #[error("life expectancy calibration failed to converge (target offset {le_add} at age {age})")]
    CalibrationFailed { le_add: f64, age: usize },

    /// Failure reported by the external policy solver
    #[error("policy solver failure: {0}")]
    Solver(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}
