//! CSV-based mortality table loader
//!
//! Loads SSA cohort/period tables, SoA annuitant tables, mortality
//! improvement projection factors, and annuitant experience ratios from CSV
//! files in `data/mortality/`. The CDC 2007 period tables are embedded in
//! the binary, so a `TableData::default()` supports the degenerate,
//! Gompertz-Makeham, and CDC table kinds without any data files; requesting
//! an unloaded kind is a fatal configuration error at table construction.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use log::info;

use crate::error::EngineError;

/// Default path to the mortality data directory
pub const DEFAULT_MORTALITY_PATH: &str = "data/mortality";

/// Loaded mortality data shared by every table builder
#[derive(Debug, Clone, Default)]
pub struct TableData {
    /// SSA cohort tables keyed by decade of birth, male
    pub ssa_cohort_m: BTreeMap<i32, Vec<f64>>,
    /// SSA cohort tables keyed by decade of birth, female
    pub ssa_cohort_f: BTreeMap<i32, Vec<f64>>,

    /// SSA 2010 period table, male
    pub ssa_period_m: Vec<f64>,
    /// SSA 2010 period table, female
    pub ssa_period_f: Vec<f64>,

    /// SoA IAM 2000 basic (unloaded) period table
    pub iam2000_unloaded_m: Vec<f64>,
    pub iam2000_unloaded_f: Vec<f64>,
    /// SoA IAM 2000 loaded period table
    pub iam2000_loaded_m: Vec<f64>,
    pub iam2000_loaded_f: Vec<f64>,
    /// SoA IAM 2012 basic period table
    pub iam2012_basic_m: Vec<f64>,
    pub iam2012_basic_f: Vec<f64>,

    /// SoA scale G2 annual improvement factors by age
    pub g2_projection_m: Vec<f64>,
    pub g2_projection_f: Vec<f64>,

    /// Actual-to-expected annuitant mortality ratios by bucket then
    /// duration since issue ("all" and "high" are aggregate buckets)
    pub aer_m: HashMap<String, Vec<f64>>,
    pub aer_f: HashMap<String, Vec<f64>>,
}

impl TableData {
    /// Load all available mortality data files from a directory
    ///
    /// Files that do not exist are skipped; the corresponding table kinds
    /// simply remain unavailable.
    pub fn load_from(path: &Path) -> Result<Self, EngineError> {
        let mut data = TableData::default();

        if path.join("ssa_cohort.csv").exists() {
            let (male, female) = load_cohort_tables(&path.join("ssa_cohort.csv"))?;
            data.ssa_cohort_m = male;
            data.ssa_cohort_f = female;
        }
        if path.join("ssa_period.csv").exists() {
            let (male, female) = load_sexed_table(&path.join("ssa_period.csv"))?;
            data.ssa_period_m = male;
            data.ssa_period_f = female;
        }
        if path.join("iam2000_unloaded.csv").exists() {
            let (male, female) = load_sexed_table(&path.join("iam2000_unloaded.csv"))?;
            data.iam2000_unloaded_m = male;
            data.iam2000_unloaded_f = female;
        }
        if path.join("iam2000_loaded.csv").exists() {
            let (male, female) = load_sexed_table(&path.join("iam2000_loaded.csv"))?;
            data.iam2000_loaded_m = male;
            data.iam2000_loaded_f = female;
        }
        if path.join("iam2012_basic.csv").exists() {
            let (male, female) = load_sexed_table(&path.join("iam2012_basic.csv"))?;
            data.iam2012_basic_m = male;
            data.iam2012_basic_f = female;
        }
        if path.join("soa_projection_g2.csv").exists() {
            let (male, female) = load_sexed_table(&path.join("soa_projection_g2.csv"))?;
            data.g2_projection_m = male;
            data.g2_projection_f = female;
        }
        if path.join("soa_aer2005_08.csv").exists() {
            let (male, female) = load_aer_tables(&path.join("soa_aer2005_08.csv"))?;
            data.aer_m = male;
            data.aer_f = female;
        }

        info!(
            "mortality data loaded from {}: {} cohort decades (m), ssa period {}, g2 {}",
            path.display(),
            data.ssa_cohort_m.len(),
            !data.ssa_period_m.is_empty(),
            !data.g2_projection_m.is_empty(),
        );

        Ok(data)
    }
}

/// Load an age-indexed table with male and female columns
/// CSV columns: age, male, female
fn load_sexed_table(path: &Path) -> Result<(Vec<f64>, Vec<f64>), EngineError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut male = Vec::new();
    let mut female = Vec::new();

    for result in reader.records() {
        let record = result?;
        let age: usize = parse_field(&record[0], path)?;
        let m: f64 = parse_field(&record[1], path)?;
        let f: f64 = parse_field(&record[2], path)?;

        if age >= male.len() {
            male.resize(age + 1, 0.0);
            female.resize(age + 1, 0.0);
        }
        male[age] = m;
        female[age] = f;
    }

    Ok((male, female))
}

/// Load decade-keyed cohort tables
/// CSV columns: decade, age, male, female
#[allow(clippy::type_complexity)]
fn load_cohort_tables(
    path: &Path,
) -> Result<(BTreeMap<i32, Vec<f64>>, BTreeMap<i32, Vec<f64>>), EngineError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut male: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    let mut female: BTreeMap<i32, Vec<f64>> = BTreeMap::new();

    for result in reader.records() {
        let record = result?;
        let decade: i32 = parse_field(&record[0], path)?;
        let age: usize = parse_field(&record[1], path)?;
        let m: f64 = parse_field(&record[2], path)?;
        let f: f64 = parse_field(&record[3], path)?;

        let male_table = male.entry(decade).or_default();
        let female_table = female.entry(decade).or_default();
        if age >= male_table.len() {
            male_table.resize(age + 1, 0.0);
            female_table.resize(age + 1, 0.0);
        }
        male_table[age] = m;
        female_table[age] = f;
    }

    Ok((male, female))
}

/// Load actual-to-expected experience ratios
/// CSV columns: sex, bucket, duration, ratio
#[allow(clippy::type_complexity)]
fn load_aer_tables(
    path: &Path,
) -> Result<(HashMap<String, Vec<f64>>, HashMap<String, Vec<f64>>), EngineError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut male: HashMap<String, Vec<f64>> = HashMap::new();
    let mut female: HashMap<String, Vec<f64>> = HashMap::new();

    for result in reader.records() {
        let record = result?;
        let sex = record[0].trim().to_lowercase();
        let bucket = record[1].trim().to_string();
        let duration: usize = parse_field(&record[2], path)?;
        let ratio: f64 = parse_field(&record[3], path)?;

        let target = match sex.as_str() {
            "male" => &mut male,
            "female" => &mut female,
            other => {
                return Err(EngineError::Config(format!(
                    "{}: unknown sex column value '{}'",
                    path.display(),
                    other
                )))
            }
        };
        let bucket_ratios = target.entry(bucket).or_default();
        if duration >= bucket_ratios.len() {
            bucket_ratios.resize(duration + 1, 1.0);
        }
        bucket_ratios[duration] = ratio;
    }

    Ok((male, female))
}

fn parse_field<T: std::str::FromStr>(field: &str, path: &Path) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    field.trim().parse().map_err(|e| {
        EngineError::Config(format!("{}: bad field '{}': {}", path.display(), field, e))
    })
}
