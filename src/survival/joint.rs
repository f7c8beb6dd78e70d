//! Joint (two-life) survival recursion
//!
//! Derives the couple's death-probability curve, where death means the
//! transition from "at least one alive" to "both dead" within a year.

use crate::config::Config;

/// Combined death-probability array for a couple
///
/// The two lives are aligned by calendar year: at couple age `a` the second
/// life is `a - start_age + start_age2` years old. Ages past either table's
/// end carry a death probability of 1. Entries before the start age are NaN;
/// the recursion is undefined there and nothing downstream reads them.
pub fn couple_death(config: &Config, death1: &[f64], death2: &[f64]) -> Vec<f64> {
    let years1 = death1.len().saturating_sub(config.start_age);
    let years2 = death2.len().saturating_sub(config.start_age2);
    let couple_len = config.start_age + years1.max(years2);

    let mut couple = vec![f64::NAN; couple_len];
    let mut m_alive = 1.0_f64;
    let mut f_alive = 1.0_f64;
    let mut c_alive = 1.0_f64;

    for (age, slot) in couple.iter_mut().enumerate().skip(config.start_age) {
        let age2 = age - config.start_age + config.start_age2;
        let m_death = death1.get(age).copied().unwrap_or(1.0);
        let f_death = death2.get(age2).copied().unwrap_or(1.0);
        let m_dead = 1.0 - m_alive;
        let f_dead = 1.0 - f_alive;

        // P(couple dies this year | couple not already fully deceased).
        let mut c_death = if c_alive > 0.0 {
            (m_alive * f_dead * m_death
                + m_dead * f_alive * f_death
                + m_alive * f_alive * m_death * f_death)
                / c_alive
        } else {
            1.0
        };

        m_alive *= 1.0 - m_death;
        f_alive *= 1.0 - f_death;
        c_alive *= 1.0 - c_death;
        if c_death > 1.0 {
            c_death = 1.0; // Floating point precision limitations.
        }
        *slot = c_death;
    }

    couple
}
