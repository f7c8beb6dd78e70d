//! Policy-solver collaborator interface
//!
//! The dynamic-programming policy optimizer lives outside this crate. The
//! orchestrator only needs two operations from it: a fit step that sets a
//! scenario's risk-tolerance bound, and a solve step that produces a
//! queryable consumption/allocation surface for one scenario.

use crate::error::EngineError;
use crate::survival::VitalStats;

use super::orchestrator::Scenario;

/// Interpolated surface value at one (period, portfolio) coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct SurfacePoint {
    /// Consumption at the queried coordinate
    pub consume: f64,
    /// Allocation fraction per asset class
    pub allocations: Vec<f64>,
}

/// Queryable result surface over (portfolio fraction, time period)
pub trait PolicySurface: Send + Sync {
    /// Number of time periods the surface covers
    fn periods(&self) -> usize;

    /// Interpolated consumption and allocations at arbitrary coordinates
    fn lookup_interpolate(&self, portfolio: f64, period: usize) -> SurfacePoint;
}

/// External policy optimizer
pub trait PolicySolver: Send + Sync {
    /// Fit step: mutates the scenario to hold a fitted risk-tolerance bound
    fn fit(&self, scenario: &mut Scenario) -> Result<(), EngineError>;

    /// Main simulation: solve one scenario against its survival statistics
    fn solve(
        &self,
        scenario: &Scenario,
        stats: &VitalStats,
    ) -> Result<Box<dyn PolicySurface>, EngineError>;
}
