//! Snapshot construction and caching
//!
//! `build_stats` is a pure function of (table kind, resolution, mortality
//! multiplier); the cache makes repeated requests for the same key cheap.
//! The ensemble reuses the default-multiplier snapshots many times while
//! each perturbed member builds its own.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;

use crate::config::Config;
use crate::error::EngineError;
use crate::mortality::{calibrated_q, LifeTable, MortalityTableBuilder, TableData};

use super::curve::VitalStats;

type StatsKey = (String, u64, u64);

/// Cache of built snapshots keyed by (table kind, resolution, multiplier)
#[derive(Debug, Default)]
pub struct StatsCache {
    entries: HashMap<StatsKey, Arc<VitalStats>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a cached snapshot, or build and cache it
    pub fn get_or_build(
        &mut self,
        config: &Config,
        data: &TableData,
        table: &LifeTable,
        time_periods: f64,
        q_adjust: f64,
    ) -> Result<Arc<VitalStats>, EngineError> {
        let key = stats_key(table, time_periods, q_adjust);
        if let Some(stats) = self.entries.get(&key) {
            return Ok(stats.clone());
        }
        let stats = Arc::new(build_stats(config, data, table, time_periods, q_adjust)?);
        self.entries.insert(key, stats.clone());
        Ok(stats)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn stats_key(table: &LifeTable, time_periods: f64, q_adjust: f64) -> StatsKey {
    (table.key(), time_periods.to_bits(), q_adjust.to_bits())
}

/// Build a snapshot for the configured life (or couple) from scratch
///
/// Pure with respect to its arguments: ensemble members with different
/// multipliers can build concurrently without coordination.
pub fn build_stats(
    config: &Config,
    data: &TableData,
    table: &LifeTable,
    time_periods: f64,
    q_adjust: f64,
) -> Result<VitalStats, EngineError> {
    debug!(
        "building vital stats: table {} tp {} q_adjust {}",
        table.key(),
        time_periods,
        q_adjust
    );
    let builder = MortalityTableBuilder::new(config, data);
    let birth_year = config.birth_year_for(config.start_age);

    let death1 = calibrated_q(
        &builder,
        table,
        config.sex,
        birth_year,
        config.le_add,
        config.start_age,
        false,
        q_adjust,
    )?;
    check_table_span(&death1, config.start_age)?;

    match config.sex2 {
        None => Ok(VitalStats::single(config, death1, time_periods)),
        Some(sex2) => {
            let birth_year2 =
                birth_year - (config.start_age2 as f64 - config.start_age as f64);
            let death2 = calibrated_q(
                &builder,
                table,
                sex2,
                birth_year2,
                config.le_add2,
                config.start_age2,
                false,
                q_adjust,
            )?;
            check_table_span(&death2, config.start_age2)?;
            Ok(VitalStats::joint(config, death1, death2, time_periods))
        }
    }
}

// A table that ends at or before the start age has no projectable years.
fn check_table_span(death: &[f64], start_age: usize) -> Result<(), EngineError> {
    if death.len() <= start_age {
        return Err(EngineError::Config(format!(
            "mortality table ends at age {} at or before start age {}",
            death.len().saturating_sub(1),
            start_age
        )));
    }
    Ok(())
}
