//! Percentile confidence bands over an age × portfolio-fraction grid
//!
//! Each grid point gathers every ensemble member's interpolated consumption
//! and allocation values, sorts them, and picks rank-based cutoffs around
//! the requested significance level. The baseline value always comes from
//! the primary scenario's surface, never from the ensemble.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::Config;
use crate::error::EngineError;

use super::solver::PolicySurface;

/// Order-statistic indices bracketing `significance` of `count` sorted values
pub fn band_indices(significance: f64, count: usize) -> (usize, usize) {
    let n = (count - 1) as f64;
    let low = ((1.0 - significance) / 2.0 * n).floor() as usize;
    let high = low + (significance * n).round() as usize;
    (low, high)
}

/// Baseline value with its low/high band edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandValue {
    pub base: f64,
    pub low: f64,
    pub high: f64,
}

/// One grid point of the band dataset
#[derive(Debug, Clone, PartialEq)]
pub struct BandRow {
    pub age: f64,
    pub portfolio: f64,
    pub consume: BandValue,
    pub allocations: Vec<BandValue>,
}

/// Compute band rows for one significance level
///
/// The grid runs over every period of the primary surface and, within each
/// period, over `band_steps + 1` portfolio fractions descending from
/// `tp_max` to zero.
pub fn compute_bands(
    config: &Config,
    primary: &dyn PolicySurface,
    members: &[Box<dyn PolicySurface>],
    significance: f64,
) -> Result<Vec<BandRow>, EngineError> {
    if members.is_empty() {
        return Err(EngineError::Config(
            "banding requires a non-empty ensemble".to_string(),
        ));
    }
    let (low, high) = band_indices(significance, members.len());
    let time_periods = config.generate_time_periods;
    let asset_count = config.asset_classes.len();

    let mut rows = Vec::new();
    for period in 0..primary.periods() {
        let age = config.start_age as f64 + period as f64 / time_periods;
        for step in 0..=config.band_steps {
            let portfolio =
                (config.band_steps - step) as f64 * config.tp_max / config.band_steps as f64;
            let base = primary.lookup_interpolate(portfolio, period);

            let mut consumes = Vec::with_capacity(members.len());
            let mut allocations = vec![Vec::with_capacity(members.len()); asset_count];
            for member in members {
                let point = member.lookup_interpolate(portfolio, period);
                consumes.push(point.consume);
                for (k, gathered) in allocations.iter_mut().enumerate() {
                    gathered.push(point.allocations.get(k).copied().unwrap_or(0.0));
                }
            }

            rows.push(BandRow {
                age,
                portfolio,
                consume: band_value(base.consume, &mut consumes, low, high),
                allocations: allocations
                    .iter_mut()
                    .enumerate()
                    .map(|(k, gathered)| {
                        band_value(
                            base.allocations.get(k).copied().unwrap_or(0.0),
                            gathered,
                            low,
                            high,
                        )
                    })
                    .collect(),
            });
        }
    }
    Ok(rows)
}

fn band_value(base: f64, gathered: &mut [f64], low: usize, high: usize) -> BandValue {
    gathered.sort_by(|a, b| a.total_cmp(b));
    BandValue {
        base,
        low: gathered[low],
        high: gathered[high],
    }
}

/// Write band rows with fixed precision, blank line between age blocks
///
/// Downstream plotting depends on the exact precision: one decimal place for
/// ages, two for fractions and consumption, three for allocations.
pub fn write_bands(path: &Path, rows: &[BandRow]) -> Result<(), EngineError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    let mut last_age = None;
    for row in rows {
        if let Some(age) = last_age {
            if age != row.age {
                writeln!(out)?;
            }
        }
        last_age = Some(row.age);

        write!(
            out,
            "{:.1},{:.2},{:.2},{:.2},{:.2}",
            row.age, row.portfolio, row.consume.base, row.consume.low, row.consume.high
        )?;
        for alloc in &row.allocations {
            write!(out, ",{:.3},{:.3},{:.3}", alloc.base, alloc.low, alloc.high)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
