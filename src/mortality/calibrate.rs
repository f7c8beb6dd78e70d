//! Life expectancy and life-expectancy-matching calibration
//!
//! Calibration answers: by how many whole years must an individual's
//! effective table age shift so that the resulting life expectancy at the
//! true age lands on a requested offset from the base table? The search is a
//! bisection over the integer shift; failure to converge indicates a target
//! outside the representable range and is fatal.

use log::debug;

use super::builder::{LifeTable, MortalityTableBuilder, Sex};
use crate::config::Config;
use crate::error::EngineError;

/// Bisection bounds on the effective age shift, in years
const AGE_SHIFT_BOUND: i64 = 50;
/// Iteration budget for the bisection
const MAX_ITERATIONS: usize = 50;

/// Life expectancy at `age` given annual death probabilities `q`
///
/// Discounted sum of survival probabilities from `age` to the table horizon,
/// plus half a year for death occurring uniformly within the final year.
pub fn life_expectancy(q: &[f64], age: usize) -> f64 {
    let mut expectancy = 0.0;
    let mut alive = 1.0;
    for &qy in q.iter().skip(age) {
        alive *= 1.0 - qy;
        expectancy += alive;
    }
    expectancy + 0.5
}

/// Per-age life expectancy vector over the full table
///
/// Ages before the projection start extend the start-age expectancy by the
/// remaining years; the vector is indexed by age from birth.
pub fn le_vector(config: &Config, death: &[f64]) -> Vec<f64> {
    let mut le = Vec::with_capacity(death.len());
    let start_le = life_expectancy(death, config.start_age);
    for s in 0..config.start_age.min(death.len()) {
        le.push((config.start_age - s) as f64 + start_le);
    }
    for s in config.start_age..death.len() {
        le.push(life_expectancy(death, s));
    }
    le
}

/// Build a death-probability array whose life expectancy at `age` equals the
/// base table's expectancy plus `le_add`
///
/// With `le_add == 0` the base table is returned untouched; no search runs.
#[allow(clippy::too_many_arguments)]
pub fn calibrated_q(
    builder: &MortalityTableBuilder,
    table: &LifeTable,
    sex: Sex,
    birth_year: f64,
    le_add: f64,
    age: usize,
    age_nearest_birthday: bool,
    q_adjust: f64,
) -> Result<Vec<f64>, EngineError> {
    let base = builder.build(table, sex, birth_year, age, age_nearest_birthday, q_adjust)?;
    if le_add == 0.0 {
        return Ok(base);
    }

    let le_target = life_expectancy(&base, age) + le_add;
    let mut lo = -AGE_SHIFT_BOUND;
    let mut hi = AGE_SHIFT_BOUND;

    for _ in 0..MAX_ITERATIONS {
        let shift = ((lo + hi) as f64 / 2.0).floor() as i64;
        let trial_age = (age as i64 + shift).max(0) as usize;
        let trial = builder.build(
            table,
            sex,
            birth_year - shift as f64,
            trial_age,
            age_nearest_birthday,
            q_adjust,
        )?;

        // Re-index the shifted table back to true ages; past the table end
        // death is certain, before its start survival is certain.
        let mut shifted = vec![0.0; base.len()];
        for (j, slot) in shifted.iter_mut().enumerate().skip(age) {
            let idx = j as i64 + shift;
            *slot = if idx < 0 {
                0.0
            } else if (idx as usize) < trial.len() {
                trial[idx as usize]
            } else {
                1.0
            };
        }

        let le_found = life_expectancy(&shifted, age);
        if hi - lo <= 1 {
            debug!(
                "le calibration: shift {} gives {:.3} (target {:.3})",
                shift, le_found, le_target
            );
            return Ok(shifted);
        }
        if le_found >= le_target {
            lo = shift;
        } else {
            hi = shift;
        }
    }

    Err(EngineError::CalibrationFailed { le_add, age })
}
