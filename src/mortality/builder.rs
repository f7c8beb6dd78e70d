//! Mortality table construction
//!
//! Resolves a table kind + sex + birth year into a terminal-adjusted array of
//! annual death probabilities. Period tables are converted to birth-year
//! cohort curves by a per-age mortality-improvement projection; annuitant
//! tables additionally carry an actual-to-expected experience adjustment.
//! Every finished table ends with an explicit probability of 1.0 so death is
//! certain by the table's maximum age.

use serde::{Deserialize, Serialize};

use super::data;
use super::loader::TableData;
use crate::config::{AnnuityExperience, Config};
use crate::error::EngineError;

/// Sex (or combined-population category) for table lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    /// Combined population; only the CDC table carries combined rates
    Person,
}

/// Mortality-improvement projection applied to period tables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MortalityProjection {
    /// SoA scale G2 per-age, per-sex factors (requires loaded data)
    G2,
    /// Flat annual mortality reduction rate
    Rate(f64),
}

/// Closed set of supported mortality models
///
/// Resolved once at configuration time; construction parameters travel with
/// the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LifeTable {
    /// All-zero death probabilities
    Immortal,
    /// All-one death probabilities
    Suicidal,
    /// Deterministic death at a configured age
    FixedMortality { deceased_age: usize },
    /// Parametric hazard: q = alpha + exp((age - m) / b) / b
    GompertzMakeham { alpha: f64, m: f64, b: f64 },
    /// SSA cohort tables, interpolated in birth year between decades
    SsaCohort,
    /// SSA 2010 period table
    SsaPeriod,
    /// CDC 2007 period table (embedded)
    CdcPeriod,
    /// SoA IAM 2000 basic annuitant table
    Iam2000Unloaded,
    /// SoA IAM 2000 loaded annuitant table
    Iam2000Loaded,
    /// SoA IAM 2012 basic annuitant table
    Iam2012Basic,
}

impl LifeTable {
    /// Stable cache key for this table kind and its parameters
    pub fn key(&self) -> String {
        format!("{:?}", self)
    }
}

/// Builds finished death-probability arrays from raw table data
pub struct MortalityTableBuilder<'a> {
    config: &'a Config,
    data: &'a TableData,
}

impl<'a> MortalityTableBuilder<'a> {
    pub fn new(config: &'a Config, data: &'a TableData) -> Self {
        Self { config, data }
    }

    /// Build the terminal-adjusted death-probability array
    ///
    /// `age_nearest_birthday` selects the age-nearest-birthday convention for
    /// experience-ratio blending; `q_adjust` is the mortality-rate multiplier.
    pub fn build(
        &self,
        table: &LifeTable,
        sex: Sex,
        birth_year: f64,
        age: usize,
        age_nearest_birthday: bool,
        q_adjust: f64,
    ) -> Result<Vec<f64>, EngineError> {
        let raw = self.raw_table(table, sex, birth_year)?;
        let mut cohort = raw.cohort;

        if raw.annuity_table && self.config.annuity_mortality_experience != AnnuityExperience::None
        {
            self.apply_experience_ratios(&mut cohort, sex, age, age_nearest_birthday)?;
        }

        let mut death = Vec::with_capacity(cohort.len() + 1);
        for q in &cohort {
            death.push((q * (1.0 + self.config.mortality_load) * q_adjust).min(1.0));
        }
        death.push(1.0);

        Ok(death)
    }

    fn raw_table(
        &self,
        table: &LifeTable,
        sex: Sex,
        birth_year: f64,
    ) -> Result<RawTable, EngineError> {
        match table {
            LifeTable::Immortal => Ok(RawTable::plain(vec![0.0; data::SYNTHETIC_TABLE_AGES])),
            LifeTable::Suicidal => Ok(RawTable::plain(vec![1.0; data::SYNTHETIC_TABLE_AGES])),
            LifeTable::FixedMortality { deceased_age } => {
                let deceased_age = (*deceased_age).max(1);
                let mut cohort = vec![0.0; deceased_age];
                cohort[deceased_age - 1] = 1.0;
                Ok(RawTable::plain(cohort))
            }
            LifeTable::GompertzMakeham { alpha, m, b } => {
                let cohort = (0..data::SYNTHETIC_TABLE_AGES)
                    .map(|i| (alpha + ((i as f64 - m) / b).exp() / b).max(0.0))
                    .collect();
                Ok(RawTable::plain(cohort))
            }
            LifeTable::SsaCohort => {
                let tables = match sex {
                    Sex::Male => &self.data.ssa_cohort_m,
                    Sex::Female => &self.data.ssa_cohort_f,
                    Sex::Person => return Err(unsupported(table, sex)),
                };
                if tables.is_empty() {
                    return Err(EngineError::MissingTableData("ssa-cohort".to_string()));
                }
                Ok(RawTable::plain(interpolate_cohort(tables, birth_year)))
            }
            LifeTable::SsaPeriod => {
                let period = match sex {
                    Sex::Male => &self.data.ssa_period_m,
                    Sex::Female => &self.data.ssa_period_f,
                    Sex::Person => return Err(unsupported(table, sex)),
                };
                if period.is_empty() {
                    return Err(EngineError::MissingTableData("ssa-period".to_string()));
                }
                let cohort = self.project_period(period, 2010, sex, birth_year, false)?;
                Ok(RawTable::plain(cohort))
            }
            LifeTable::CdcPeriod => {
                let period: &[f64] = match sex {
                    Sex::Person => &data::CDC_PERSON,
                    Sex::Male => &data::CDC_MALE,
                    Sex::Female => &data::CDC_FEMALE,
                };
                let cohort = self.project_period(period, 2007, sex, birth_year, false)?;
                Ok(RawTable::plain(cohort))
            }
            LifeTable::Iam2000Unloaded => self.annuitant_table(
                table,
                sex,
                birth_year,
                2000,
                &self.data.iam2000_unloaded_m,
                &self.data.iam2000_unloaded_f,
                "iam2000-unloaded",
            ),
            LifeTable::Iam2000Loaded => self.annuitant_table(
                table,
                sex,
                birth_year,
                2000,
                &self.data.iam2000_loaded_m,
                &self.data.iam2000_loaded_f,
                "iam2000-loaded",
            ),
            LifeTable::Iam2012Basic => self.annuitant_table(
                table,
                sex,
                birth_year,
                2012,
                &self.data.iam2012_basic_m,
                &self.data.iam2012_basic_f,
                "iam2012-basic",
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn annuitant_table(
        &self,
        table: &LifeTable,
        sex: Sex,
        birth_year: f64,
        base_year: i32,
        male: &[f64],
        female: &[f64],
        name: &str,
    ) -> Result<RawTable, EngineError> {
        let period = match sex {
            Sex::Male => male,
            Sex::Female => female,
            Sex::Person => return Err(unsupported(table, sex)),
        };
        if period.is_empty() {
            return Err(EngineError::MissingTableData(name.to_string()));
        }
        let cohort = self.project_period(period, base_year, sex, birth_year, true)?;
        Ok(RawTable {
            cohort,
            annuity_table: true,
        })
    }

    /// Convert a period table into a birth-year cohort curve
    fn project_period(
        &self,
        period: &[f64],
        base_year: i32,
        sex: Sex,
        birth_year: f64,
        age_nearest: bool,
    ) -> Result<Vec<f64>, EngineError> {
        let mut cohort = Vec::with_capacity(period.len());
        for (i, q) in period.iter().enumerate() {
            let mp = self.improvement_factor(sex, i, age_nearest)?;
            let years = i as f64 - (base_year as f64 - birth_year);
            cohort.push(q * (1.0 - mp).powf(years));
        }
        Ok(cohort)
    }

    /// Annual mortality-improvement factor for one age
    fn improvement_factor(
        &self,
        sex: Sex,
        age: usize,
        age_nearest: bool,
    ) -> Result<f64, EngineError> {
        match self.config.mortality_projection {
            MortalityProjection::Rate(rate) => Ok(rate),
            MortalityProjection::G2 => {
                let factors = match sex {
                    Sex::Male => &self.data.g2_projection_m,
                    Sex::Female => &self.data.g2_projection_f,
                    Sex::Person => {
                        return Err(EngineError::Config(
                            "G2 projection factors are not published for the combined population"
                                .to_string(),
                        ))
                    }
                };
                if factors.is_empty() {
                    return Err(EngineError::MissingTableData("soa-projection-g2".to_string()));
                }
                let at = |i: usize| factors.get(i).copied().unwrap_or(0.0);
                if age_nearest {
                    Ok(at(age))
                } else {
                    // Exact-age convention straddles two nearest-age factors.
                    Ok((at(age) + at(age + 1)) / 2.0)
                }
            }
        }
    }

    /// Apply actual-to-expected annuitant mortality ratios in place
    fn apply_experience_ratios(
        &self,
        cohort: &mut [f64],
        sex: Sex,
        age: usize,
        age_nearest: bool,
    ) -> Result<(), EngineError> {
        let aer = match sex {
            Sex::Male => &self.data.aer_m,
            Sex::Female => &self.data.aer_f,
            Sex::Person => {
                return Err(EngineError::Config(
                    "annuitant experience ratios are sex-specific".to_string(),
                ))
            }
        };
        if aer.is_empty() {
            return Err(EngineError::MissingTableData("soa-aer2005-08".to_string()));
        }

        for i in 0..cohort.len() {
            let key = match self.config.annuity_mortality_experience {
                AnnuityExperience::Summary => "all".to_string(),
                AnnuityExperience::Full => {
                    let by_age = i.to_string();
                    if aer.contains_key(&by_age) {
                        by_age
                    } else {
                        "high".to_string()
                    }
                }
                AnnuityExperience::None => unreachable!("checked by caller"),
            };
            let ratios = aer.get(&key).ok_or_else(|| {
                EngineError::MissingTableData(format!("soa-aer2005-08 bucket '{}'", key))
            })?;

            let contract_length =
                (i.saturating_sub(age)).min(ratios.len().saturating_sub(1));
            let mut ratio = ratios[contract_length];
            if !age_nearest && contract_length + 1 < ratios.len() {
                ratio = (ratio + ratios[contract_length + 1]) / 2.0;
            }
            cohort[i] *= ratio;
        }
        Ok(())
    }
}

struct RawTable {
    cohort: Vec<f64>,
    annuity_table: bool,
}

impl RawTable {
    fn plain(cohort: Vec<f64>) -> Self {
        Self {
            cohort,
            annuity_table: false,
        }
    }
}

fn unsupported(table: &LifeTable, sex: Sex) -> EngineError {
    EngineError::UnsupportedTable {
        table: table.key(),
        sex: format!("{:?}", sex).to_lowercase(),
    }
}

/// Interpolate decade cohort tables linearly in birth year
///
/// The cohort convention treats the population as born mid-year; birth year
/// is clamped so both bracketing decades exist.
fn interpolate_cohort(
    tables: &std::collections::BTreeMap<i32, Vec<f64>>,
    birth_year: f64,
) -> Vec<f64> {
    let (Some(&min_year), Some(&max_year)) = (tables.keys().next(), tables.keys().next_back())
    else {
        return Vec::new();
    };
    let birth_year =
        (birth_year - 0.5).clamp(min_year as f64, max_year as f64 - 10.0);

    let year_base = ((birth_year / 10.0).floor() * 10.0) as i32;
    let year_fract = (birth_year - year_base as f64) / 10.0;
    let base = &tables[&year_base];
    let ceil = &tables[&(year_base + 10)];

    base.iter()
        .zip(ceil.iter())
        .map(|(lo, hi)| lo * (1.0 - year_fract) + hi * year_fract)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn builder_fixture() -> (Config, TableData) {
        let mut config = Config::default();
        config.mortality_projection = MortalityProjection::Rate(0.0);
        (config, TableData::default())
    }

    #[test]
    fn test_terminal_entry_is_one() {
        let (config, data) = builder_fixture();
        let builder = MortalityTableBuilder::new(&config, &data);

        for table in [
            LifeTable::Immortal,
            LifeTable::Suicidal,
            LifeTable::FixedMortality { deceased_age: 80 },
            LifeTable::GompertzMakeham {
                alpha: 0.0,
                m: 82.3,
                b: 11.4,
            },
            LifeTable::CdcPeriod,
        ] {
            let death = builder
                .build(&table, Sex::Male, 1960.0, 50, false, 1.0)
                .unwrap();
            assert_eq!(*death.last().unwrap(), 1.0, "table {:?}", table);
        }
    }

    #[test]
    fn test_all_probabilities_in_range() {
        let (mut config, data) = builder_fixture();
        config.mortality_load = 0.2;
        let builder = MortalityTableBuilder::new(&config, &data);

        // A large multiplier must clamp to 1, never exceed it.
        let death = builder
            .build(&LifeTable::CdcPeriod, Sex::Female, 1955.0, 55, false, 10.0)
            .unwrap();
        for (i, q) in death.iter().enumerate() {
            assert!((0.0..=1.0).contains(q), "q[{}] = {}", i, q);
        }
        // Old-age CDC rates times 10 exceed 1 before clamping.
        assert_eq!(death[99], 1.0);
    }

    #[test]
    fn test_degenerate_tables() {
        let (config, data) = builder_fixture();
        let builder = MortalityTableBuilder::new(&config, &data);

        let immortal = builder
            .build(&LifeTable::Immortal, Sex::Person, 1960.0, 50, false, 1.0)
            .unwrap();
        assert!(immortal[..immortal.len() - 1].iter().all(|&q| q == 0.0));

        let suicidal = builder
            .build(&LifeTable::Suicidal, Sex::Person, 1960.0, 50, false, 1.0)
            .unwrap();
        assert!(suicidal.iter().all(|&q| q == 1.0));

        let fixed = builder
            .build(
                &LifeTable::FixedMortality { deceased_age: 90 },
                Sex::Male,
                1960.0,
                50,
                false,
                1.0,
            )
            .unwrap();
        assert_eq!(fixed.len(), 91);
        assert!(fixed[..89].iter().all(|&q| q == 0.0));
        assert_eq!(fixed[89], 1.0);
        assert_eq!(fixed[90], 1.0);
    }

    #[test]
    fn test_gompertz_makeham_increasing() {
        let (config, data) = builder_fixture();
        let builder = MortalityTableBuilder::new(&config, &data);

        let death = builder
            .build(
                &LifeTable::GompertzMakeham {
                    alpha: 0.0005,
                    m: 82.3,
                    b: 11.4,
                },
                Sex::Male,
                1960.0,
                50,
                false,
                1.0,
            )
            .unwrap();
        // Hazard grows with age until the clamp kicks in.
        assert!(death[70] > death[40]);
        assert!(death[100] > death[70]);
    }

    #[test]
    fn test_cohort_interpolation() {
        let (config, mut data) = builder_fixture();

        let mut tables: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        tables.insert(1950, vec![0.010; 5]);
        tables.insert(1960, vec![0.020; 5]);
        data.ssa_cohort_m = tables;
        let builder = MortalityTableBuilder::new(&config, &data);

        // Born 1955.5: cohort birth year 1955.0 sits halfway between decades.
        let death = builder
            .build(&LifeTable::SsaCohort, Sex::Male, 1955.5, 60, false, 1.0)
            .unwrap();
        assert!((death[0] - 0.015).abs() < 1e-12);

        // Clamped below the earliest decade.
        let death = builder
            .build(&LifeTable::SsaCohort, Sex::Male, 1900.0, 60, false, 1.0)
            .unwrap();
        assert!((death[0] - 0.010).abs() < 1e-12);
    }

    #[test]
    fn test_period_projection_direction() {
        let (mut config, data) = builder_fixture();
        config.mortality_projection = MortalityProjection::Rate(0.01);
        let builder = MortalityTableBuilder::new(&config, &data);

        // A later birth year gets more improvement at every age.
        let early = builder
            .build(&LifeTable::CdcPeriod, Sex::Male, 1940.0, 70, false, 1.0)
            .unwrap();
        let late = builder
            .build(&LifeTable::CdcPeriod, Sex::Male, 1960.0, 50, false, 1.0)
            .unwrap();
        assert!(late[80] < early[80]);
    }

    #[test]
    fn test_unsupported_combination_rejected() {
        let (config, data) = builder_fixture();
        let builder = MortalityTableBuilder::new(&config, &data);

        let err = builder
            .build(&LifeTable::SsaPeriod, Sex::Person, 1960.0, 50, false, 1.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedTable { .. }));
    }

    #[test]
    fn test_missing_table_data_rejected() {
        let (config, data) = builder_fixture();
        let builder = MortalityTableBuilder::new(&config, &data);

        let err = builder
            .build(&LifeTable::Iam2012Basic, Sex::Male, 1960.0, 50, false, 1.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingTableData(_)));
    }

    #[test]
    fn test_experience_ratio_summary_bucket() {
        let (mut config, mut data) = builder_fixture();
        config.annuity_mortality_experience = AnnuityExperience::Summary;

        data.iam2012_basic_m = vec![0.010; 20];
        data.aer_m.insert("all".to_string(), vec![0.5]);
        let builder = MortalityTableBuilder::new(&config, &data);

        let death = builder
            .build(&LifeTable::Iam2012Basic, Sex::Male, 1960.0, 5, false, 1.0)
            .unwrap();
        // Single-duration bucket: flat 0.5 ratio everywhere.
        assert!((death[0] - 0.005).abs() < 1e-12);
        assert!((death[10] - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_experience_ratio_blend_follows_age_convention() {
        let (mut config, mut data) = builder_fixture();
        config.annuity_mortality_experience = AnnuityExperience::Summary;

        data.iam2012_basic_m = vec![0.010; 20];
        data.aer_m.insert("all".to_string(), vec![0.5, 1.0]);
        let builder = MortalityTableBuilder::new(&config, &data);

        // Nearest-age convention applies the duration bucket directly.
        let nearest = builder
            .build(&LifeTable::Iam2012Basic, Sex::Male, 1960.0, 5, true, 1.0)
            .unwrap();
        assert!((nearest[5] - 0.010 * 0.5).abs() < 1e-12);

        // Exact-age convention straddles the next duration bucket.
        let exact = builder
            .build(&LifeTable::Iam2012Basic, Sex::Male, 1960.0, 5, false, 1.0)
            .unwrap();
        assert!((exact[5] - 0.010 * 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_mortality_load_and_q_adjust_scaling() {
        let (mut config, data) = builder_fixture();
        config.mortality_load = 0.1;
        let builder = MortalityTableBuilder::new(&config, &data);

        let base = builder
            .build(&LifeTable::CdcPeriod, Sex::Male, 1960.0, 50, false, 1.0)
            .unwrap();
        let scaled = builder
            .build(&LifeTable::CdcPeriod, Sex::Male, 1960.0, 50, false, 2.0)
            .unwrap();
        assert!((scaled[50] - 2.0 * base[50]).abs() < 1e-12);
        assert!((base[50] - data::CDC_MALE[50] * 1.1).abs() < 1e-12);
    }
}
