//! Retirement planning engine - actuarial statistics and stochastic scenario ensembles
//!
//! This library provides:
//! - Mortality-table construction with cohort interpolation, mortality
//!   improvement, and annuitant experience adjustment
//! - Life-expectancy-matching calibration via bisection search
//! - Discounted survival/decrement curves (bounded and upside variants)
//! - Joint (two-life) survival recursion and Monte Carlo death sampling
//! - Ensemble orchestration with percentile confidence bands

pub mod config;
pub mod ensemble;
pub mod error;
pub mod mortality;
pub mod returns;
pub mod survival;

// Re-export commonly used types
pub use config::{AnnuityExperience, Config};
pub use ensemble::{EnsembleRunner, PolicySolver, PolicySurface, RunReport, Scenario, SurfacePoint};
pub use error::EngineError;
pub use mortality::{LifeTable, MortalityProjection, Sex, TableData};
pub use returns::ReturnsSample;
pub use survival::{StatsCache, VitalStats};
