//! Scenario ensemble: perturbed parameter sampling, worker-pool dispatch,
//! and percentile confidence banding around a baseline policy

mod bands;
mod orchestrator;
mod params;
mod solver;

pub use bands::{band_indices, compute_bands, write_bands, BandRow, BandValue};
pub use orchestrator::{EnsembleRunner, RunReport, Scenario, BAND_SIGNIFICANCES};
pub use params::{ErrorEnsemble, ScenarioParameters};
pub use solver::{PolicySolver, PolicySurface, SurfacePoint};
