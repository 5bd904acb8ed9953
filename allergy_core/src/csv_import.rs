//! Risk tables from a directory of CSV sheets.
//!
//! Expected files, each with a header row (Korean headers also accepted):
//! - `allergens.csv`: `name`, `synonyms` (split on `; | , ，、`)
//! - `symptom_weights.csv`: `symptom_system`, `base_score`
//! - `risk_rules.csv`: `risk_level`, `label`, `pattern`, `condition`, `priority`
//!
//! Pattern rows sharing a risk level are grouped into one keyword rule.
//! Rows with a `condition` become score threshold rules. A blank `risk_level`
//! means `very_low`, as in the TOML bundle. Unusable rows are skipped with a
//! warning.

use crate::rules::{RawCondition, RawKeywordCondition, RawKeywordPattern, RawRiskRule};
use crate::source::RiskDataSource;
use crate::{AllergenCatalog, AllergenEntry, Result, RiskLevel, SymptomWeights};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const ALLERGENS_FILE: &str = "allergens.csv";
pub const WEIGHTS_FILE: &str = "symptom_weights.csv";
pub const RULES_FILE: &str = "risk_rules.csv";

const SYNONYM_SEPARATORS: [char; 5] = [';', '|', ',', '，', '、'];

#[derive(Debug, Deserialize)]
struct AllergenRow {
    #[serde(default, alias = "표준명", alias = "표시명")]
    name: String,
    #[serde(default, alias = "동의어")]
    synonyms: String,
}

#[derive(Debug, Deserialize)]
struct WeightRow {
    #[serde(default, alias = "증상계통")]
    symptom_system: String,
    #[serde(default, alias = "기본점수", alias = "가중치")]
    base_score: String,
}

#[derive(Debug, Deserialize)]
struct RuleRow {
    #[serde(default, alias = "위험도")]
    risk_level: String,
    #[serde(default, alias = "구분")]
    label: String,
    #[serde(default, alias = "패턴", alias = "한글 키워드(정규식)")]
    pattern: String,
    #[serde(default, alias = "조건")]
    condition: String,
    #[serde(default, alias = "우선순위")]
    priority: Option<i64>,
}

/// Risk tables read from CSV sheets in one directory
#[derive(Clone, Debug)]
pub struct CsvTablesSource {
    dir: PathBuf,
}

impl CsvTablesSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_rows<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for (line, record) in reader.deserialize().enumerate() {
            match record {
                Ok(row) => rows.push(row),
                // Header is line 1
                Err(e) => tracing::warn!("Skipping {} row {}: {}", file, line + 2, e),
            }
        }
        Ok(rows)
    }
}

impl RiskDataSource for CsvTablesSource {
    fn load_allergen_catalog(&self) -> Result<AllergenCatalog> {
        let mut catalog = AllergenCatalog::new();
        for row in self.read_rows::<AllergenRow>(ALLERGENS_FILE)? {
            if row.name.is_empty() {
                continue;
            }
            catalog.insert(AllergenEntry::new(row.name, split_synonyms(&row.synonyms)));
        }
        Ok(catalog)
    }

    fn load_symptom_weights(&self) -> Result<SymptomWeights> {
        let mut weights = SymptomWeights::new();
        for row in self.read_rows::<WeightRow>(WEIGHTS_FILE)? {
            if row.symptom_system.is_empty() {
                continue;
            }
            match parse_base_score(&row.base_score) {
                Some(score) => weights.insert(row.symptom_system, score),
                None => tracing::warn!(
                    "Skipping weight for {:?}: unusable base score {:?}",
                    row.symptom_system,
                    row.base_score
                ),
            }
        }
        Ok(weights)
    }

    fn load_raw_rules(&self) -> Result<Vec<RawRiskRule>> {
        Ok(group_rule_rows(self.read_rows::<RuleRow>(RULES_FILE)?))
    }
}

/// Split a synonym cell on any of the accepted separators
pub fn split_synonyms(cell: &str) -> Vec<String> {
    cell.split(&SYNONYM_SEPARATORS[..])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Read a score cell leniently: non-numeric decoration such as "4점" is
/// ignored, an empty cell counts as zero, fractions are truncated.
/// Negative values are rejected.
pub fn parse_base_score(cell: &str) -> Option<u32> {
    let numeric: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if numeric.is_empty() {
        return Some(0);
    }

    let value: f64 = numeric.parse().ok()?;
    if !value.is_finite() || value < 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value.trunc() as u32)
}

fn group_rule_rows(rows: Vec<RuleRow>) -> Vec<RawRiskRule> {
    let mut rules: Vec<RawRiskRule> = Vec::new();
    let mut keyword_slots: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let level = match row.risk_level.to_lowercase() {
            blank if blank.is_empty() => RiskLevel::VeryLow.as_str().to_string(),
            level => level,
        };

        if !row.condition.is_empty() {
            rules.push(RawRiskRule {
                condition: RawCondition::Expression(row.condition),
                risk_level: level,
                priority: row.priority,
            });
            continue;
        }

        if row.pattern.is_empty() && row.label.is_empty() {
            continue;
        }

        let slot = *keyword_slots.entry(level.clone()).or_insert_with(|| {
            rules.push(RawRiskRule {
                condition: RawCondition::Keywords(RawKeywordCondition::default()),
                risk_level: level,
                priority: None,
            });
            rules.len() - 1
        });

        let rule = &mut rules[slot];
        if rule.priority.is_none() {
            rule.priority = row.priority;
        }
        if let RawCondition::Keywords(keywords) = &mut rule.condition {
            keywords.keyword_rules.push(RawKeywordPattern {
                label: row.label,
                pattern: row.pattern,
            });
        }
    }

    rules
}
