//! Monte Carlo death-time realization sampling
//!
//! Draws one simulated death age per life by inverse-CDF sampling on a
//! single uniform draw: the realized death period is where the discounted
//! alive curve first drops below the draw. Each call with a fresh random
//! source yields an independent realization; no state is retained.

use rand::Rng;

use crate::config::Config;
use crate::error::EngineError;

use super::curve::VitalStats;

/// Sample one realized death-probability array for a single life
///
/// The result is degenerate: 0.0 before the sampled death age, 1.0 at and
/// after it.
pub fn sample_death<R: Rng + ?Sized>(
    stats: &VitalStats,
    start_age: usize,
    rng: &mut R,
) -> Vec<f64> {
    let longevity: f64 = rng.random();
    let mut death = vec![0.0; stats.death.len()];
    for (y, slot) in death.iter_mut().enumerate().skip(start_age) {
        let period = (((y - start_age) as f64) * stats.time_periods).round() as usize;
        let period = period.min(stats.alive.len() - 1);
        *slot = if longevity < stats.alive[period] {
            0.0
        } else {
            1.0
        };
    }
    death
}

/// Sample a joint-life realization for a couple snapshot
///
/// Each life is sampled independently with its own draw; the joint curve is
/// then recomputed from the two realized arrays through the same couple
/// recursion used for expected survival.
pub fn joint_realization<R: Rng + ?Sized>(
    config: &Config,
    stats: &VitalStats,
    rng: &mut R,
) -> Result<VitalStats, EngineError> {
    let (Some(first), Some(second)) = (&stats.first, &stats.second) else {
        return Err(EngineError::Config(
            "joint realization requires a couple snapshot".to_string(),
        ));
    };

    let death1 = sample_death(first, config.start_age, rng);
    let death2 = sample_death(second, config.start_age2, rng);
    Ok(VitalStats::joint(config, death1, death2, stats.time_periods))
}
