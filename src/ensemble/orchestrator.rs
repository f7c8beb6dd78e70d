//! Baseline-plus-ensemble run coordination
//!
//! The runner builds baseline snapshots at the generation and validation
//! resolutions, fits and solves the baseline scenarios sequentially, then
//! dispatches the perturbed ensemble members onto a fixed-size worker pool.
//! Each member builds its own survival snapshot from its mortality
//! multiplier, so members never coordinate over shared mutable state. The
//! first member failure cancels the remaining work and propagates; partial
//! ensemble results are discarded. Banding runs only after every member has
//! completed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use rayon::prelude::*;

use crate::config::Config;
use crate::error::EngineError;
use crate::mortality::TableData;
use crate::returns::ReturnsSample;
use crate::survival::{build_stats, StatsCache, VitalStats};

use super::bands::{compute_bands, write_bands};
use super::params::{ErrorEnsemble, ScenarioParameters};
use super::solver::{PolicySolver, PolicySurface};

/// Significance levels of the emitted band datasets
pub const BAND_SIGNIFICANCES: [f64; 2] = [0.68, 0.95];

/// One scenario to fit and simulate
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub params: ScenarioParameters,
    /// Replace the configured risk premium with the historical sample mean
    pub compute_risk_premium: bool,
    /// Risk-tolerance bound set by the policy solver's fit step
    pub risk_tolerance: Option<f64>,
}

impl Scenario {
    /// Fixed two-asset comparison scenario at the configured nominal premium
    pub fn comparison(config: &Config) -> Self {
        Self {
            name: "compare".to_string(),
            params: ScenarioParameters::two_asset(config),
            compute_risk_premium: false,
            risk_tolerance: None,
        }
    }

    /// All-assets-tradable reference scenario
    pub fn reference(config: &Config) -> Self {
        Self {
            name: "all-tradable".to_string(),
            params: ScenarioParameters::nominal(config),
            compute_risk_premium: true,
            risk_tolerance: None,
        }
    }

    /// Primary scenario; its surface is the band baseline
    pub fn primary(config: &Config) -> Self {
        Self {
            name: "primary".to_string(),
            params: ScenarioParameters::nominal(config),
            compute_risk_premium: true,
            risk_tolerance: None,
        }
    }

    /// One perturbed ensemble member
    pub fn member(index: usize, params: ScenarioParameters) -> Self {
        Self {
            name: format!("error-{}", index),
            params,
            compute_risk_premium: false,
            risk_tolerance: None,
        }
    }
}

/// Outputs of a completed run
pub struct RunReport {
    /// Solved baseline surfaces in dispatch order; the primary is last
    pub surfaces: Vec<(String, Box<dyn PolicySurface>)>,
    /// Band files written, one per significance level (empty when N = 0)
    pub band_files: Vec<PathBuf>,
}

/// Coordinates baseline scenarios and the perturbed ensemble
pub struct EnsembleRunner<'a> {
    config: &'a Config,
    data: &'a TableData,
    pool: rayon::ThreadPool,
    cache: StatsCache,
    generate_stats: Arc<VitalStats>,
    validate_stats: Arc<VitalStats>,
    /// Common projection horizon in years across both resolutions
    pub max_years: usize,
}

impl<'a> EnsembleRunner<'a> {
    pub fn new(config: &'a Config, data: &'a TableData) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| EngineError::Config(format!("worker pool: {}", e)))?;

        let mut cache = StatsCache::new();
        let generate_stats = cache.get_or_build(
            config,
            data,
            &config.generate_life_table,
            config.generate_time_periods,
            1.0,
        )?;
        let validate_stats = cache.get_or_build(
            config,
            data,
            &config.validate_life_table,
            config.validate_time_periods,
            1.0,
        )?;
        let max_years = common_horizon(config, &generate_stats, &validate_stats);

        Ok(Self {
            config,
            data,
            pool,
            cache,
            generate_stats,
            validate_stats,
            max_years,
        })
    }

    /// Baseline snapshot at the generation resolution
    pub fn generate_stats(&self) -> &Arc<VitalStats> {
        &self.generate_stats
    }

    /// Baseline snapshot at the validation resolution
    pub fn validate_stats(&self) -> &Arc<VitalStats> {
        &self.validate_stats
    }

    /// Cache-backed snapshot lookup for ad-hoc table/resolution combinations
    pub fn snapshot(
        &mut self,
        table: &crate::mortality::LifeTable,
        time_periods: f64,
        q_adjust: f64,
    ) -> Result<Arc<VitalStats>, EngineError> {
        self.cache
            .get_or_build(self.config, self.data, table, time_periods, q_adjust)
    }

    /// Run the full pipeline: baselines, ensemble, percentile bands
    pub fn run(
        &mut self,
        solver: &dyn PolicySolver,
        returns: &ReturnsSample,
        out_dir: &Path,
    ) -> Result<RunReport, EngineError> {
        let mut baselines = Vec::new();
        if !self.config.skip_compare {
            baselines.push(Scenario::comparison(self.config));
        }
        if self.config.all_tradable {
            baselines.push(Scenario::reference(self.config));
        }
        baselines.push(Scenario::primary(self.config));

        let mut surfaces: Vec<(String, Box<dyn PolicySurface>)> = Vec::new();
        for mut scenario in baselines {
            if scenario.compute_risk_premium {
                scenario.params.ret_equity_premium = returns.mean;
            }
            solver.fit(&mut scenario)?;
            info!("solving baseline scenario {}", scenario.name);
            let surface = solver.solve(&scenario, &self.generate_stats)?;
            surfaces.push((scenario.name.clone(), surface));
        }

        let mut band_files = Vec::new();
        if self.config.error_count > 0 {
            let ensemble = ErrorEnsemble::sample(self.config, returns)?;
            let mut members: Vec<Scenario> = ensemble
                .members
                .into_iter()
                .enumerate()
                .map(|(i, params)| Scenario::member(i, params))
                .collect();
            for member in &mut members {
                solver.fit(member)?;
            }

            info!(
                "dispatching {} ensemble members on {} workers",
                members.len(),
                self.config.workers
            );
            let config = self.config;
            let data = self.data;
            let member_surfaces: Vec<Box<dyn PolicySurface>> = self.pool.install(|| {
                members
                    .par_iter()
                    .map(|member| {
                        let stats = build_stats(
                            config,
                            data,
                            &config.generate_life_table,
                            config.generate_time_periods,
                            member.params.q_adjust,
                        )?;
                        solver.solve(member, &stats)
                    })
                    .collect::<Result<Vec<_>, EngineError>>()
            })?;

            let (_, primary_surface) = surfaces
                .last()
                .ok_or_else(|| EngineError::Config("no primary scenario".to_string()))?;
            for significance in BAND_SIGNIFICANCES {
                let rows =
                    compute_bands(config, primary_surface.as_ref(), &member_surfaces, significance)?;
                let path =
                    out_dir.join(format!("{}-error-{:.2}.csv", config.prefix, significance));
                write_bands(&path, &rows)?;
                info!("wrote {} band rows to {}", rows.len(), path.display());
                band_files.push(path);
            }
        }

        Ok(RunReport {
            surfaces,
            band_files,
        })
    }
}

/// Common horizon across both resolutions
///
/// The minimum of the configured projection limit and either table's span
/// past the start age, rounded down to a multiple of the least common
/// multiple of the two resolutions' reporting intervals so all snapshots
/// terminate on a shared period boundary.
fn common_horizon(config: &Config, generate: &VitalStats, validate: &VitalStats) -> usize {
    let generate_years = generate.death.len() - config.start_age;
    let validate_years = validate.death.len() - config.start_age;
    let mut years = generate_years.min(validate_years);
    if let Some(limit) = config.years {
        years = years.min(limit);
    }
    let step = lcm(
        reporting_interval(config.generate_time_periods),
        reporting_interval(config.validate_time_periods),
    );
    years - years % step
}

/// Years per reporting boundary; sub-year resolutions report every year
fn reporting_interval(time_periods: f64) -> usize {
    ((1.0 / time_periods).round() as usize).max(1)
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::solver::SurfacePoint;
    use crate::mortality::MortalityProjection;

    struct StubSurface {
        scale: f64,
        periods: usize,
    }

    impl PolicySurface for StubSurface {
        fn periods(&self) -> usize {
            self.periods
        }

        fn lookup_interpolate(&self, portfolio: f64, _period: usize) -> SurfacePoint {
            SurfacePoint {
                consume: portfolio * self.scale,
                allocations: vec![0.6, 0.4],
            }
        }
    }

    struct StubSolver;

    impl PolicySolver for StubSolver {
        fn fit(&self, scenario: &mut Scenario) -> Result<(), EngineError> {
            scenario.risk_tolerance = Some(1.0);
            Ok(())
        }

        fn solve(
            &self,
            scenario: &Scenario,
            stats: &VitalStats,
        ) -> Result<Box<dyn PolicySurface>, EngineError> {
            Ok(Box::new(StubSurface {
                scale: scenario.params.q_adjust,
                periods: stats.dying.len().min(3),
            }))
        }
    }

    struct FailingSolver;

    impl PolicySolver for FailingSolver {
        fn fit(&self, _scenario: &mut Scenario) -> Result<(), EngineError> {
            Ok(())
        }

        fn solve(
            &self,
            scenario: &Scenario,
            _stats: &VitalStats,
        ) -> Result<Box<dyn PolicySurface>, EngineError> {
            if scenario.name.starts_with("error-") {
                Err(EngineError::Solver(format!("{} diverged", scenario.name)))
            } else {
                Ok(Box::new(StubSurface {
                    scale: 1.0,
                    periods: 3,
                }))
            }
        }
    }

    fn fixture() -> (Config, TableData) {
        let mut config = Config::default();
        config.mortality_projection = MortalityProjection::Rate(0.0);
        config.workers = 2;
        config.gamma_vol = 0.2;
        config.q_vol = 0.1;
        config.seed = 5;
        (config, TableData::default())
    }

    fn returns() -> ReturnsSample {
        ReturnsSample {
            mean: 0.05,
            sd: 0.18,
            n: 50,
        }
    }

    fn out_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("retirement_engine_{}", tag));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_zero_ensemble_skips_banding() {
        let (config, data) = fixture();
        let mut runner = EnsembleRunner::new(&config, &data).unwrap();

        let report = runner
            .run(&StubSolver, &returns(), &std::env::temp_dir())
            .unwrap();
        assert!(report.band_files.is_empty());
        let names: Vec<&str> = report.surfaces.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["compare", "primary"]);
        assert!(runner.max_years > 0);
    }

    #[test]
    fn test_ensemble_writes_both_band_files() {
        let (mut config, data) = fixture();
        config.error_count = 8;
        config.prefix = "bandtest".to_string();
        let dir = out_dir("bands");

        let mut runner = EnsembleRunner::new(&config, &data).unwrap();
        let report = runner.run(&StubSolver, &returns(), &dir).unwrap();

        assert_eq!(report.band_files.len(), 2);
        assert!(dir.join("bandtest-error-0.68.csv").is_file());
        assert!(dir.join("bandtest-error-0.95.csv").is_file());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_member_failure_propagates() {
        let (mut config, data) = fixture();
        config.error_count = 4;
        let dir = out_dir("failure");

        let mut runner = EnsembleRunner::new(&config, &data).unwrap();
        let result = runner.run(&FailingSolver, &returns(), &dir);
        assert!(matches!(result, Err(EngineError::Solver(_))));
        // No partial band output on failure.
        assert!(!dir.join("plan-error-0.68.csv").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_common_horizon_lands_on_shared_boundary() {
        let (mut config, data) = fixture();
        config.generate_time_periods = 1.0;
        config.validate_time_periods = 0.5; // reporting interval of 2 years
        let runner = EnsembleRunner::new(&config, &data).unwrap();
        assert!(runner.max_years > 0);
        assert_eq!(runner.max_years % 2, 0);

        let (mut config, data) = fixture();
        config.years = Some(31);
        config.validate_time_periods = 0.5;
        let runner = EnsembleRunner::new(&config, &data).unwrap();
        assert_eq!(runner.max_years, 30);
    }

    #[test]
    fn test_snapshot_lookup_is_cached() {
        use crate::mortality::LifeTable;

        let (config, data) = fixture();
        let mut runner = EnsembleRunner::new(&config, &data).unwrap();
        let a = runner.snapshot(&LifeTable::CdcPeriod, 1.0, 1.2).unwrap();
        let b = runner.snapshot(&LifeTable::CdcPeriod, 1.0, 1.2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_skip_compare_drops_comparison_scenario() {
        let (mut config, data) = fixture();
        config.skip_compare = true;
        config.all_tradable = true;
        let mut runner = EnsembleRunner::new(&config, &data).unwrap();

        let report = runner
            .run(&StubSolver, &returns(), &std::env::temp_dir())
            .unwrap();
        let names: Vec<&str> = report.surfaces.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["all-tradable", "primary"]);
    }
}
