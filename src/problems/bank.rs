use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use lazy_static::lazy_static;

use crate::error::CoachError;
use crate::problems::problem::Problem;

/// Embedded question banks, one JSON file per exam module. Each file maps
/// a year key ("2025", "2024_B", "2024_Winter") to that sitting's problems.
const MODULE_BANKS: &[(&str, &str)] = &[
    ("801", include_str!("../../problems/801.json")),
    ("802", include_str!("../../problems/802.json")),
    ("803", include_str!("../../problems/803.json")),
];

pub struct ProblemBank {
    modules: BTreeMap<String, HashMap<String, Vec<Problem>>>,
}

impl ProblemBank {
    fn load() -> anyhow::Result<ProblemBank> {
        let mut modules = BTreeMap::new();
        for (module, raw) in MODULE_BANKS {
            let years: HashMap<String, Vec<Problem>> = serde_json::from_str(raw)
                .with_context(|| format!("parsing embedded bank for module {}", module))?;
            modules.insert(module.to_string(), years);
        }
        Ok(ProblemBank { modules })
    }

    /// Module keys in ascending order.
    pub fn module_keys(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Year keys for a module in display order: newest year first, and
    /// within a year winter sitting, then alternate sitting, then plain.
    pub fn year_keys(&self, module: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .modules
            .get(module)
            .map(|years| years.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort_by(|a, b| year_display_order(a, b));
        keys
    }

    /// Look up a problem by module, year and one-based position.
    pub fn get(&self, module: &str, year: &str, one_based_index: usize) -> Result<&Problem, CoachError> {
        let not_found = || {
            CoachError::NotFound(format!(
                "module {}, year {}, question {}",
                module, year, one_based_index
            ))
        };
        let problems = self
            .modules
            .get(module)
            .and_then(|years| years.get(year))
            .ok_or_else(not_found)?;
        one_based_index
            .checked_sub(1)
            .and_then(|i| problems.get(i))
            .ok_or_else(not_found)
    }

    /// Number of problems in one year of one module.
    pub fn question_count(&self, module: &str, year: &str) -> usize {
        self.modules
            .get(module)
            .and_then(|years| years.get(year))
            .map(|problems| problems.len())
            .unwrap_or(0)
    }
}

fn year_number(key: &str) -> i32 {
    key.split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0)
}

fn suffix_rank(key: &str) -> u8 {
    match key.find('_') {
        None => 3,
        Some(at) => match &key[at..] {
            "_Winter" => 1,
            "_B" => 2,
            _ => 99,
        },
    }
}

/// Display ordering for year keys: descending year, then winter sitting
/// before alternate sitting before the plain summer sitting.
pub fn year_display_order(a: &str, b: &str) -> Ordering {
    let (year_a, year_b) = (year_number(a), year_number(b));
    if year_a != year_b {
        return year_b.cmp(&year_a);
    }
    suffix_rank(a).cmp(&suffix_rank(b))
}

/// Human-facing label for a year key.
pub fn year_display_name(key: &str) -> String {
    key.replace("_B", " (מועד ב)").replace("_Winter", " (חורף)")
}

fn load_bank_internal() -> ProblemBank {
    match ProblemBank::load() {
        Ok(bank) => bank,
        Err(e) => {
            eprintln!("[Bank] Failed to parse embedded problem bank: {:#}", e);
            ProblemBank {
                modules: BTreeMap::new(),
            }
        }
    }
}

lazy_static! {
    static ref BANK: ProblemBank = load_bank_internal();
}

/// Get the embedded problem bank (parsed once on first use)
pub fn bank() -> &'static ProblemBank {
    &BANK
}
