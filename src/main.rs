//! Retirement engine CLI
//!
//! Runs the baseline-plus-ensemble pipeline with a simple annuitization
//! policy rule standing in for an external optimizer, and writes the
//! percentile band files.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use retirement_engine::mortality::DEFAULT_MORTALITY_PATH;
use retirement_engine::{
    Config, EngineError, EnsembleRunner, PolicySolver, PolicySurface, ReturnsSample, Scenario,
    SurfacePoint, TableData, VitalStats,
};

#[derive(Parser, Debug)]
#[command(
    name = "retirement_engine",
    about = "Actuarial survival statistics and scenario-ensemble confidence bands"
)]
struct Args {
    /// JSON scenario configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// CSV of per-period equity excess returns (period, excess_return)
    #[arg(long)]
    returns: Option<PathBuf>,
    /// Directory of mortality table CSV files
    #[arg(long, default_value = DEFAULT_MORTALITY_PATH)]
    mortality_data: PathBuf,
    /// Output directory for band files
    #[arg(long, default_value = ".")]
    output: PathBuf,
    /// Override the configured ensemble size
    #[arg(long)]
    error_count: Option<usize>,
    /// Override the configured RNG seed
    #[arg(long)]
    seed: Option<u64>,
    /// Override the configured worker count
    #[arg(long)]
    workers: Option<usize>,
}

/// Annuitization policy rule
///
/// Consumption at each period is the portfolio divided by the remaining
/// bounded discounted survival mass (the actuarially fair payout rate), with
/// allocations split evenly across the scenario's asset classes. A real
/// dynamic-programming optimizer plugs in through the same trait.
struct AnnuitizeSolver;

struct AnnuitizeSurface {
    sum_avg_alive: Vec<f64>,
    asset_count: usize,
}

impl PolicySurface for AnnuitizeSurface {
    fn periods(&self) -> usize {
        self.sum_avg_alive.len()
    }

    fn lookup_interpolate(&self, portfolio: f64, period: usize) -> SurfacePoint {
        let index = period.min(self.sum_avg_alive.len() - 1);
        // Floor at one remaining period so the terminal payout is the whole
        // portfolio rather than a division blowup.
        let divisor = self.sum_avg_alive[index].max(1.0);
        SurfacePoint {
            consume: portfolio / divisor,
            allocations: vec![1.0 / self.asset_count as f64; self.asset_count],
        }
    }
}

impl PolicySolver for AnnuitizeSolver {
    fn fit(&self, scenario: &mut Scenario) -> Result<(), EngineError> {
        scenario.risk_tolerance = Some(scenario.params.gamma_adjust);
        Ok(())
    }

    fn solve(
        &self,
        scenario: &Scenario,
        stats: &VitalStats,
    ) -> Result<Box<dyn PolicySurface>, EngineError> {
        Ok(Box::new(AnnuitizeSurface {
            sum_avg_alive: stats.bounded_sum_avg_alive.clone(),
            asset_count: scenario.params.asset_classes.len(),
        }))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_json_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(error_count) = args.error_count {
        config.error_count = error_count;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate()?;

    let data = TableData::load_from(&args.mortality_data)
        .with_context(|| format!("loading mortality data from {}", args.mortality_data.display()))?;

    let returns = match &args.returns {
        Some(path) => ReturnsSample::from_csv_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        // Long-run U.S. equity premium sample when no series is supplied.
        None => ReturnsSample {
            mean: config.ret_equity_premium,
            sd: 0.17,
            n: 50,
        },
    };

    let mut runner = EnsembleRunner::new(&config, &data)?;
    info!("common projection horizon {} years", runner.max_years);

    let report = runner.run(&AnnuitizeSolver, &returns, &args.output)?;

    let stats = runner.generate_stats();
    println!(
        "life expectancy at age {}: {:.1} years",
        config.start_age,
        stats.le[config.start_age]
    );
    for (name, surface) in &report.surfaces {
        let point = surface.lookup_interpolate(1.0, 0);
        println!(
            "scenario {:>12}: initial payout rate {:.4}, {} periods",
            name,
            point.consume,
            surface.periods()
        );
    }
    for path in &report.band_files {
        println!("wrote {}", path.display());
    }
    Ok(())
}
