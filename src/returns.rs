//! Historical excess-return sample statistics
//!
//! The ensemble only needs the sample mean, sample standard deviation, and
//! observation count of the per-period equity excess-return series; the
//! series itself comes from an external data file.

use std::fs::File;
use std::path::Path;

use crate::error::EngineError;

/// Summary statistics of a historical excess-return series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnsSample {
    /// Sample mean of per-period excess returns
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator)
    pub sd: f64,
    /// Number of observations
    pub n: usize,
}

impl ReturnsSample {
    /// Compute sample statistics from an in-memory series
    pub fn from_series(series: &[f64]) -> Result<Self, EngineError> {
        if series.len() < 2 {
            return Err(EngineError::Config(
                "excess-return series needs at least two observations".to_string(),
            ));
        }
        let n = series.len();
        let mean = series.iter().sum::<f64>() / n as f64;
        let var = series.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Ok(Self {
            mean,
            sd: var.sqrt(),
            n,
        })
    }

    /// Load a series from CSV and compute its statistics
    /// CSV columns: period, excess_return
    pub fn from_csv_path(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);

        let mut series = Vec::new();
        for result in reader.records() {
            let record = result?;
            let value: f64 = record[1].trim().parse().map_err(|e| {
                EngineError::Config(format!("{}: bad excess return: {}", path.display(), e))
            })?;
            series.push(value);
        }
        Self::from_series(&series)
    }
}
