//! Run configuration
//!
//! A single `Config` drives mortality-table selection, survival-curve
//! discretization, and ensemble generation. Loaded from a JSON scenario file
//! with per-field defaults so a bare `Config::default()` is runnable.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::mortality::{LifeTable, MortalityProjection, Sex};

/// Annuitant actual-to-expected mortality experience adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnuityExperience {
    /// No experience adjustment
    None,
    /// Single aggregate "all durations" bucket
    Summary,
    /// Per-age duration buckets
    Full,
}

/// Complete scenario configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Age of the first (or only) life at the start of the projection
    pub start_age: usize,
    /// Age of the second life, when modeling a couple
    pub start_age2: usize,
    /// Retirement age used for bounded survival sums and the utility anchor
    pub retirement_age: usize,

    /// Sex of the first life
    pub sex: Sex,
    /// Sex of the second life; None for a single-life scenario
    pub sex2: Option<Sex>,

    /// Birth year of the first life; None derives it from the current date
    pub birth_year: Option<f64>,

    /// Life expectancy offset target for the first life (years)
    pub le_add: f64,
    /// Life expectancy offset target for the second life (years)
    pub le_add2: f64,

    /// Maximum projection years; None runs to the biological table end
    pub years: Option<usize>,

    /// Restrict bounded survival sums to post-retirement periods
    pub utility_retire: bool,
    /// Discount anchor age; must not exceed max(start_age, retirement_age)
    pub utility_age: Option<usize>,
    /// Count the final period in bounded sums
    pub book_post: bool,

    /// Annual discount rate applied to consumption-weighted survival
    pub consume_discount_rate: f64,
    /// Annual discount rate for the upside (alternate) survival variant
    pub upside_discount_rate: f64,

    /// Multiplicative load applied to every raw death probability
    pub mortality_load: f64,
    /// Mortality-improvement projection used for period tables
    pub mortality_projection: MortalityProjection,
    /// Annuitant experience adjustment for IAM tables
    pub annuity_mortality_experience: AnnuityExperience,

    /// Mortality table used when generating the policy surface
    pub generate_life_table: LifeTable,
    /// Mortality table used when validating the policy surface
    pub validate_life_table: LifeTable,

    /// Generation resolution in periods per year (values below 1 coarsen)
    pub generate_time_periods: f64,
    /// Validation resolution in periods per year
    pub validate_time_periods: f64,

    /// Asset classes carried through every scenario
    pub asset_classes: Vec<String>,
    /// Nominal equity risk premium estimate
    pub ret_equity_premium: f64,
    /// Sample the premium from its estimation uncertainty
    pub equity_premium_vol: bool,
    /// Log-normal volatility of the gamma market-price-of-risk adjustment
    pub gamma_vol: f64,
    /// Log-normal volatility of the mortality-rate multiplier
    pub q_vol: f64,

    /// Number of perturbed ensemble members; 0 disables the ensemble
    pub error_count: usize,
    /// RNG seed for ensemble parameter draws
    pub seed: u64,

    /// Worker threads for ensemble dispatch
    pub workers: usize,

    /// Portfolio-fraction grid steps per age in the band output
    pub band_steps: usize,
    /// Upper bound of the portfolio-fraction grid
    pub tp_max: f64,

    /// Skip the fixed two-asset comparison scenario
    pub skip_compare: bool,
    /// Include the all-assets-tradable reference scenario
    pub all_tradable: bool,

    /// Output file prefix
    pub prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_age: 50,
            start_age2: 50,
            retirement_age: 65,
            sex: Sex::Male,
            sex2: None,
            birth_year: None,
            le_add: 0.0,
            le_add2: 0.0,
            years: None,
            utility_retire: true,
            utility_age: None,
            book_post: false,
            consume_discount_rate: 0.0,
            upside_discount_rate: 0.0,
            mortality_load: 0.0,
            mortality_projection: MortalityProjection::Rate(0.005),
            annuity_mortality_experience: AnnuityExperience::None,
            generate_life_table: LifeTable::CdcPeriod,
            validate_life_table: LifeTable::CdcPeriod,
            generate_time_periods: 1.0,
            validate_time_periods: 1.0,
            asset_classes: vec!["stocks".to_string(), "bonds".to_string()],
            ret_equity_premium: 0.05,
            equity_premium_vol: true,
            gamma_vol: 0.0,
            q_vol: 0.0,
            error_count: 0,
            seed: 0,
            workers: 4,
            band_steps: 10,
            tp_max: 10.0,
            skip_compare: false,
            all_tradable: false,
            prefix: "plan".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON scenario file
    pub fn from_json_path(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        let config: Config = serde_json::from_reader(file)
            .map_err(|e| EngineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field consistency; fatal on violation
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(utility_age) = self.utility_age {
            let utility_age_max = if self.utility_retire {
                self.start_age.max(self.retirement_age)
            } else {
                self.start_age
            };
            if utility_age > utility_age_max {
                return Err(EngineError::Config(format!(
                    "utility_age {} exceeds maximum {}",
                    utility_age, utility_age_max
                )));
            }
        }
        if self.generate_time_periods <= 0.0 || self.validate_time_periods <= 0.0 {
            return Err(EngineError::Config(
                "time periods must be positive".to_string(),
            ));
        }
        if self.asset_classes.is_empty() {
            return Err(EngineError::Config(
                "at least one asset class is required".to_string(),
            ));
        }
        if self.band_steps == 0 {
            return Err(EngineError::Config("band_steps must be > 0".to_string()));
        }
        Ok(())
    }

    /// Discount anchor age for survival-curve construction
    pub fn utility_age(&self) -> usize {
        let utility_age_max = if self.utility_retire {
            self.start_age.max(self.retirement_age)
        } else {
            self.start_age
        };
        self.utility_age.unwrap_or(utility_age_max)
    }

    /// Birth year of a life currently `age` years old
    ///
    /// Month granularity only; anything finer would introduce run-to-run
    /// non-determinism.
    pub fn birth_year_for(&self, age: usize) -> f64 {
        match self.birth_year {
            Some(year) => year,
            None => {
                use chrono::Datelike;
                let now = chrono::Utc::now();
                now.year() as f64 + now.month0() as f64 / 12.0 - age as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_utility_age_bound() {
        let mut config = Config::default();
        config.utility_age = Some(80); // above max(start_age, retirement_age) = 65
        assert!(config.validate().is_err());

        config.utility_age = Some(60);
        assert!(config.validate().is_ok());
        assert_eq!(config.utility_age(), 60);
    }

    #[test]
    fn test_utility_age_default_anchor() {
        let config = Config::default();
        assert_eq!(config.utility_age(), 65);

        let mut config = Config::default();
        config.utility_retire = false;
        assert_eq!(config.utility_age(), 50);
    }

    #[test]
    fn test_fixed_birth_year() {
        let mut config = Config::default();
        config.birth_year = Some(1975.0);
        assert_eq!(config.birth_year_for(50), 1975.0);
    }
}
