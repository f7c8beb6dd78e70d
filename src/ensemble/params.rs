//! Scenario parameters and perturbed-ensemble sampling
//!
//! Parameter uncertainty model: the equity premium's estimated variance is
//! inflated by a chi-squared draw (the population variance given the sample
//! variance), the premium itself by a Gaussian draw from the
//! uncertainty-adjusted mean/variance, and the gamma and mortality
//! multipliers by log-normal draws. All draws come from one seeded ChaCha20
//! stream so a fixed seed reproduces the ensemble exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{ChiSquared, Distribution, LogNormal, StandardNormal};

use crate::config::Config;
use crate::error::EngineError;
use crate::returns::ReturnsSample;

/// Market and mortality parameters for one scenario
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioParameters {
    /// Equity risk premium estimate
    pub ret_equity_premium: f64,
    /// Multiplicative adjustment to the estimated equity volatility
    pub equity_vol_adjust: f64,
    /// Multiplicative adjustment to the gamma market-price-of-risk factor
    pub gamma_adjust: f64,
    /// Mortality-rate multiplier
    pub q_adjust: f64,
    /// Asset classes traded in this scenario
    pub asset_classes: Vec<String>,
}

impl ScenarioParameters {
    /// Nominal (unperturbed) parameters with the configured asset classes
    pub fn nominal(config: &Config) -> Self {
        Self {
            ret_equity_premium: config.ret_equity_premium,
            equity_vol_adjust: 1.0,
            gamma_adjust: 1.0,
            q_adjust: 1.0,
            asset_classes: config.asset_classes.clone(),
        }
    }

    /// Nominal parameters restricted to the fixed stocks/bonds pair
    pub fn two_asset(config: &Config) -> Self {
        Self {
            asset_classes: vec!["stocks".to_string(), "bonds".to_string()],
            ..Self::nominal(config)
        }
    }
}

/// One perturbed parameter set per ensemble member
#[derive(Debug, Clone)]
pub struct ErrorEnsemble {
    pub members: Vec<ScenarioParameters>,
}

impl ErrorEnsemble {
    /// Sample `config.error_count` perturbed parameter sets
    pub fn sample(config: &Config, returns: &ReturnsSample) -> Result<Self, EngineError> {
        let mut rng = ChaCha20Rng::seed_from_u64(config.seed);
        let n = returns.n as f64;

        let chi_squared = ChiSquared::new(n - 1.0)
            .map_err(|e| EngineError::Config(format!("chi-squared({}): {}", n - 1.0, e)))?;
        let gamma_distribution = positive_lognormal(config.gamma_vol)?;
        let q_distribution = positive_lognormal(config.q_vol)?;

        let mut members = Vec::with_capacity(config.error_count);
        for _ in 0..config.error_count {
            let (erp, equity_vol_adjust) = if config.equity_premium_vol {
                // Population sd given the sample sd, then the premium from
                // the sampling distribution of the mean.
                let vol_adjust = ((n - 1.0) / chi_squared.sample(&mut rng)).sqrt();
                let erp_sd = returns.sd * vol_adjust / n.sqrt();
                let z: f64 = rng.sample(StandardNormal);
                (returns.mean + erp_sd * z, vol_adjust)
            } else {
                (returns.mean, 1.0)
            };
            let gamma_adjust = match &gamma_distribution {
                Some(d) => d.sample(&mut rng),
                None => 1.0,
            };
            let q_adjust = match &q_distribution {
                Some(d) => d.sample(&mut rng),
                None => 1.0,
            };

            members.push(ScenarioParameters {
                ret_equity_premium: erp,
                equity_vol_adjust,
                gamma_adjust,
                q_adjust,
                asset_classes: config.asset_classes.clone(),
            });
        }

        Ok(Self { members })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

fn positive_lognormal(vol: f64) -> Result<Option<LogNormal<f64>>, EngineError> {
    if vol > 0.0 {
        LogNormal::new(0.0, vol)
            .map(Some)
            .map_err(|e| EngineError::Config(format!("log-normal(0, {}): {}", vol, e)))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensemble_config() -> Config {
        let mut config = Config::default();
        config.error_count = 64;
        config.gamma_vol = 0.2;
        config.q_vol = 0.1;
        config.seed = 17;
        config
    }

    fn sample() -> ReturnsSample {
        ReturnsSample {
            mean: 0.05,
            sd: 0.18,
            n: 50,
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let config = ensemble_config();
        let a = ErrorEnsemble::sample(&config, &sample()).unwrap();
        let b = ErrorEnsemble::sample(&config, &sample()).unwrap();
        assert_eq!(a.len(), 64);
        assert!(!a.is_empty());
        for (x, y) in a.members.iter().zip(&b.members) {
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut config = ensemble_config();
        let a = ErrorEnsemble::sample(&config, &sample()).unwrap();
        config.seed = 18;
        let b = ErrorEnsemble::sample(&config, &sample()).unwrap();
        assert_ne!(a.members[0], b.members[0]);
    }

    #[test]
    fn test_zero_volatility_fixes_multipliers_at_one() {
        let mut config = ensemble_config();
        config.gamma_vol = 0.0;
        config.q_vol = 0.0;
        let ensemble = ErrorEnsemble::sample(&config, &sample()).unwrap();
        for member in &ensemble.members {
            assert_eq!(member.gamma_adjust, 1.0);
            assert_eq!(member.q_adjust, 1.0);
            assert!(member.q_adjust > 0.0);
        }
    }

    #[test]
    fn test_premium_vol_disabled_uses_sample_mean() {
        let mut config = ensemble_config();
        config.equity_premium_vol = false;
        let ensemble = ErrorEnsemble::sample(&config, &sample()).unwrap();
        for member in &ensemble.members {
            assert_eq!(member.ret_equity_premium, 0.05);
            assert_eq!(member.equity_vol_adjust, 1.0);
        }
    }

    #[test]
    fn test_perturbed_premiums_center_on_sample_mean() {
        let mut config = ensemble_config();
        config.error_count = 2000;
        let ensemble = ErrorEnsemble::sample(&config, &sample()).unwrap();
        let mean: f64 = ensemble
            .members
            .iter()
            .map(|m| m.ret_equity_premium)
            .sum::<f64>()
            / ensemble.members.len() as f64;
        // erp_sd = 0.18/sqrt(50) ~ 0.025; standard error of this mean is
        // well under 0.002 at 2000 draws.
        assert!((mean - 0.05).abs() < 0.005, "mean {}", mean);
    }
}
