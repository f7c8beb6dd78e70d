//! Mortality models: table construction, cohort projection, and
//! life-expectancy calibration

mod builder;
mod calibrate;
pub mod data;
pub mod loader;

pub use builder::{LifeTable, MortalityProjection, MortalityTableBuilder, Sex};
pub use calibrate::{calibrated_q, le_vector, life_expectancy};
pub use loader::{TableData, DEFAULT_MORTALITY_PATH};
