//! Discounted survival and decrement curves
//!
//! A `VitalStats` snapshot converts an annual death-probability table into
//! discretized, discounted alive/dying/suffix-sum arrays at a configurable
//! sub-year resolution. Snapshots are immutable once built: an ensemble
//! member that needs a different mortality multiplier gets a fresh snapshot
//! rather than mutating a shared one.

use std::sync::Arc;

use crate::config::Config;
use crate::mortality::le_vector;

use super::joint::couple_death;

/// Immutable survival-curve snapshot for one life or one couple
///
/// Arrays are indexed by period from the start age. `alive[i]` is the
/// discounted probability of surviving to period boundary `i`; `dying[i]`
/// the discounted mass of deaths within period `i` (one fewer entry than
/// `alive`); the `sum_avg_*` arrays are reverse-cumulative suffix sums of
/// the discounted alive mass. The `raw_*` arrays repeat the computation
/// without discounting. `upside_*` uses the alternate discount rate.
#[derive(Debug, Clone)]
pub struct VitalStats {
    /// Periods per year used to discretize the annual table
    pub time_periods: f64,
    /// Annual death probabilities, indexed by age from birth
    pub death: Vec<f64>,
    /// Life expectancy indexed by age from birth
    pub le: Vec<f64>,

    pub raw_alive: Vec<f64>,
    pub raw_dying: Vec<f64>,
    pub raw_sum_avg_alive: Vec<f64>,

    pub alive: Vec<f64>,
    pub dying: Vec<f64>,
    pub sum_avg_alive: Vec<f64>,
    pub bounded_sum_avg_alive: Vec<f64>,

    pub upside_alive: Vec<f64>,
    pub bounded_sum_avg_upside_alive: Vec<f64>,

    /// First life's individual snapshot when this is a couple snapshot
    pub first: Option<Arc<VitalStats>>,
    /// Second life's individual snapshot when this is a couple snapshot
    pub second: Option<Arc<VitalStats>>,
}

impl VitalStats {
    /// Build a single-life snapshot
    pub fn single(config: &Config, death: Vec<f64>, time_periods: f64) -> Self {
        let death_len = death.len();
        Self::from_death(config, death, death_len, time_periods)
    }

    /// Build a couple snapshot from two individual death-probability arrays
    ///
    /// The joint curve treats both-dead as the terminal event; the two
    /// individual snapshots are retained as children for diagnostics and for
    /// per-life realization sampling.
    pub fn joint(config: &Config, death1: Vec<f64>, death2: Vec<f64>, time_periods: f64) -> Self {
        let death_joint = couple_death(config, &death1, &death2);
        let death_len = death1.len().max(death2.len()).max(death_joint.len());

        let first = VitalStats::from_death(config, death1, death_len, time_periods);
        let second = VitalStats::from_death(config, death2, death_len, time_periods);
        let mut stats = VitalStats::from_death(config, death_joint, death_len, time_periods);
        stats.first = Some(Arc::new(first));
        stats.second = Some(Arc::new(second));
        stats
    }

    /// Whether this snapshot models a couple
    pub fn is_joint(&self) -> bool {
        self.first.is_some()
    }

    fn from_death(config: &Config, death: Vec<f64>, death_len: usize, time_periods: f64) -> Self {
        let vs_years = death_len - config.start_age;
        let actual_years = config.years.unwrap_or(death_len);
        let periods = (vs_years as f64 * time_periods).round() as usize;
        let bounded_periods =
            (actual_years.min(vs_years) as f64 * time_periods).round() as usize;

        let mut raw_alive = vec![0.0; periods + 1];
        let mut raw_dying = vec![0.0; periods];
        let mut raw_sum_avg_alive = vec![0.0; periods + 1];
        compute_alive_dying(
            config,
            &death,
            Some(&mut raw_alive),
            Some(&mut raw_dying),
            Some(&mut raw_sum_avg_alive),
            None,
            time_periods,
            0.0,
        );

        let mut alive = vec![0.0; periods + 1];
        let mut dying = vec![0.0; periods];
        let mut sum_avg_alive = vec![0.0; periods + 1];
        let mut bounded_sum_avg_alive = vec![0.0; bounded_periods + 1];
        compute_alive_dying(
            config,
            &death,
            Some(&mut alive),
            Some(&mut dying),
            Some(&mut sum_avg_alive),
            Some(&mut bounded_sum_avg_alive),
            time_periods,
            config.consume_discount_rate,
        );

        let mut upside_alive = vec![0.0; periods + 1];
        let mut bounded_sum_avg_upside_alive = vec![0.0; bounded_periods + 1];
        compute_alive_dying(
            config,
            &death,
            Some(&mut upside_alive),
            None,
            None,
            Some(&mut bounded_sum_avg_upside_alive),
            time_periods,
            config.upside_discount_rate,
        );

        let le = le_vector(config, &death);

        Self {
            time_periods,
            death,
            le,
            raw_alive,
            raw_dying,
            raw_sum_avg_alive,
            alive,
            dying,
            sum_avg_alive,
            bounded_sum_avg_alive,
            upside_alive,
            bounded_sum_avg_upside_alive,
            first: None,
            second: None,
        }
    }
}

/// Fill discounted alive/dying/suffix-sum arrays from an annual table
///
/// Annual probabilities convert to period probabilities two ways: at
/// resolutions of one period per year or coarser, consecutive years'
/// combined non-occurrence accumulates until a reporting boundary; at finer
/// resolutions the annual probability splits by a constant-hazard root.
/// Discounting is anchored so the value at the utility-reference age is
/// undiscounted; the dying mass is additionally discounted half a period.
/// Ages past the table end are treated as certain death.
#[allow(clippy::too_many_arguments)]
pub fn compute_alive_dying(
    config: &Config,
    death: &[f64],
    mut alive_array: Option<&mut [f64]>,
    mut dying_array: Option<&mut [f64]>,
    sum_avg_alive_array: Option<&mut [f64]>,
    bounded_sum_avg_alive: Option<&mut [f64]>,
    time_periods: f64,
    r: f64,
) {
    let mut alive = 1.0;
    let utility_age = config.utility_age() as f64;
    let start_age = config.start_age as f64;

    // Anchoring the discount at the utility age is not arbitrary: the upside
    // alive curve must match the floor curve there.
    let mut discount = (1.0 + r).powf(-(start_age - utility_age));

    if let Some(a) = alive_array.as_deref_mut() {
        a[0] = alive * discount;
    }

    let mut len = 0usize;
    if let Some(a) = alive_array.as_deref() {
        len = len.max(a.len() - 1);
    }
    if let Some(d) = dying_array.as_deref() {
        len = len.max(d.len());
    }
    if let Some(s) = sum_avg_alive_array.as_deref() {
        len = len.max(s.len() - 1);
    }
    if let Some(b) = bounded_sum_avg_alive.as_deref() {
        len = len.max(b.len() - 1);
    }

    let mut avg_alive = vec![0.0; len + 1];
    avg_alive[0] = alive * discount;

    let reps = if time_periods <= 1.0 {
        1
    } else {
        time_periods.round() as usize
    };
    let years_per_period = (1.0 / time_periods).round().max(1.0) as usize;

    let mut death_period = 0.0;
    let mut index = 0usize;
    'years: for y in 0.. {
        let q = death[(config.start_age + y).min(death.len() - 1)];
        if time_periods <= 1.0 {
            death_period = 1.0 - (1.0 - death_period) * (1.0 - q);
            if (y + 1) % years_per_period != 0 {
                continue;
            }
        } else {
            death_period = 1.0 - (1.0 - q).powf(1.0 / time_periods);
        }
        for _ in 0..reps {
            let dying = alive * death_period;
            alive -= dying;
            if let Some(d) = dying_array.as_deref_mut() {
                d[index] = dying * discount * (1.0 + r).powf(-0.5 / time_periods);
            }
            index += 1;
            discount =
                (1.0 + r).powf(-(start_age - utility_age + index as f64 / time_periods));
            if let Some(a) = alive_array.as_deref_mut() {
                a[index] = alive * discount;
            }
            avg_alive[index] = alive * discount;
            if index + 1 >= avg_alive.len() {
                break 'years;
            }
        }
        death_period = 0.0;
    }

    // Reverse pass: suffix sums of the discounted alive mass. The bounded
    // variant only accumulates at or after retirement (when restricted) and
    // skips the final element unless book_post counts it.
    let retire_boundary = ((config.retirement_age as f64 - config.start_age as f64)
        * time_periods)
        .round() as i64
        + if config.book_post { 1 } else { 0 };

    let mut sum_aa = 0.0;
    let mut bounded_sum_aa = 0.0;
    let bounded_len = bounded_sum_avg_alive.as_deref().map(|b| b.len());
    let mut sum_avg = sum_avg_alive_array;
    let mut bounded = bounded_sum_avg_alive;
    for i in (0..avg_alive.len()).rev() {
        sum_aa += avg_alive[i];
        if let (Some(b), Some(b_len)) = (bounded.as_deref_mut(), bounded_len) {
            if i < b_len {
                if (!config.utility_retire || i as i64 >= retire_boundary)
                    && (i < avg_alive.len() - 1 || config.book_post)
                {
                    bounded_sum_aa += avg_alive[i];
                }
                b[i] = bounded_sum_aa;
            }
        }
        if let Some(s) = sum_avg.as_deref_mut() {
            s[i] = sum_aa;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::{LifeTable, MortalityProjection, MortalityTableBuilder, Sex, TableData};
    use approx::assert_relative_eq;

    fn cdc_stats(config: &Config, time_periods: f64) -> VitalStats {
        let data = TableData::default();
        let builder = MortalityTableBuilder::new(config, &data);
        let death = builder
            .build(&LifeTable::CdcPeriod, Sex::Male, 1960.0, config.start_age, false, 1.0)
            .unwrap();
        VitalStats::single(config, death, time_periods)
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.mortality_projection = MortalityProjection::Rate(0.0);
        config
    }

    #[test]
    fn test_alive_starts_at_initial_discount() {
        let mut config = test_config();
        config.consume_discount_rate = 0.03;
        let stats = cdc_stats(&config, 1.0);

        // start_age 50, utility anchor 65: initial discount is (1.03)^15.
        let expected = 1.03_f64.powf(15.0);
        assert_relative_eq!(stats.alive[0], expected, max_relative = 1e-12);
        // Raw curve is undiscounted.
        assert_relative_eq!(stats.raw_alive[0], 1.0);
    }

    #[test]
    fn test_raw_alive_dying_recursion() {
        let config = test_config();
        let stats = cdc_stats(&config, 1.0);

        for i in 0..stats.raw_dying.len() {
            let q = stats.death[(config.start_age + i).min(stats.death.len() - 1)];
            assert_relative_eq!(
                stats.raw_alive[i + 1],
                stats.raw_alive[i] * (1.0 - q),
                max_relative = 1e-10
            );
            assert_relative_eq!(
                stats.raw_dying[i],
                stats.raw_alive[i] - stats.raw_alive[i + 1],
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn test_terminal_alive_is_zero() {
        let config = test_config();
        let stats = cdc_stats(&config, 1.0);

        // The appended terminal q of 1.0 kills the last survivors exactly.
        assert_eq!(*stats.raw_alive.last().unwrap(), 0.0);
        assert_eq!(*stats.alive.last().unwrap(), 0.0);
    }

    #[test]
    fn test_sum_avg_alive_non_increasing() {
        let mut config = test_config();
        config.consume_discount_rate = 0.02;
        let stats = cdc_stats(&config, 1.0);

        for i in 1..stats.sum_avg_alive.len() {
            assert!(stats.sum_avg_alive[i] <= stats.sum_avg_alive[i - 1]);
        }
        // Terminal suffix sum vanishes with the terminal alive mass.
        assert_eq!(*stats.sum_avg_alive.last().unwrap(), 0.0);
    }

    #[test]
    fn test_bounded_sum_constant_before_retirement() {
        let mut config = test_config();
        config.utility_retire = true;
        let stats = cdc_stats(&config, 1.0);

        let retire_period = config.retirement_age - config.start_age;
        for i in 0..retire_period {
            assert_eq!(
                stats.bounded_sum_avg_alive[i],
                stats.bounded_sum_avg_alive[0],
                "bounded sum moved before retirement at period {}",
                i
            );
        }
        assert!(
            stats.bounded_sum_avg_alive[retire_period + 1]
                < stats.bounded_sum_avg_alive[retire_period]
        );
    }

    #[test]
    fn test_dying_has_one_fewer_entry_than_alive() {
        let config = test_config();
        for tp in [0.5, 1.0, 2.0, 12.0] {
            let stats = cdc_stats(&config, tp);
            assert_eq!(stats.dying.len() + 1, stats.alive.len(), "tp {}", tp);
            assert_eq!(stats.raw_dying.len() + 1, stats.raw_alive.len());
        }
    }

    #[test]
    fn test_subyear_resolution_consistency() {
        let config = test_config();
        let annual = cdc_stats(&config, 1.0);
        let monthly = cdc_stats(&config, 12.0);

        // Survival to the same year boundary agrees between resolutions: the
        // constant-hazard split preserves the annual survival product.
        assert_eq!(monthly.raw_alive.len(), (annual.raw_alive.len() - 1) * 12 + 1);
        for year in [1usize, 10, 30] {
            assert_relative_eq!(
                monthly.raw_alive[year * 12],
                annual.raw_alive[year],
                max_relative = 1e-9
            );
        }
    }

    #[test]
    fn test_coarse_resolution_aggregates_years() {
        let config = test_config();
        let annual = cdc_stats(&config, 1.0);
        let biennial = cdc_stats(&config, 0.5);

        // One two-year period combines two years' non-occurrence.
        assert_relative_eq!(
            biennial.raw_alive[1],
            annual.raw_alive[2],
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_upside_matches_alive_at_same_rate() {
        let mut config = test_config();
        config.consume_discount_rate = 0.03;
        config.upside_discount_rate = 0.03;
        let stats = cdc_stats(&config, 1.0);

        for i in 0..stats.alive.len() {
            assert_relative_eq!(stats.alive[i], stats.upside_alive[i], max_relative = 1e-12);
        }
    }
}
