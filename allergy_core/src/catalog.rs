//! Allergen catalog, symptom weights, and the built-in default tables.
//!
//! The defaults are only a fallback for callers without their own data
//! source. Production deployments load tables through [`crate::source`].

use crate::rules::{compile_rules, RawCondition, RawRiskRule};
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Cached default tables - built once and reused across all operations
static DEFAULT_TABLES: Lazy<RiskTables> = Lazy::new(build_default_tables);

/// Get a reference to the cached default tables
pub fn get_default_tables() -> &'static RiskTables {
    &DEFAULT_TABLES
}

impl AllergenEntry {
    /// Build an entry, adding the canonical name to its own synonym list and
    /// dropping blank or case-insensitively duplicated synonyms.
    pub fn new<I, S>(name: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into().trim().to_string();
        let mut seen = HashSet::new();
        let mut list = Vec::new();

        for synonym in std::iter::once(name.clone()).chain(synonyms.into_iter().map(Into::into)) {
            let synonym = synonym.trim().to_string();
            if synonym.is_empty() {
                continue;
            }
            if seen.insert(synonym.to_lowercase()) {
                list.push(synonym);
            }
        }

        Self {
            name,
            synonyms: list,
        }
    }

    /// Return the first synonym contained in `lowered_text`.
    ///
    /// The caller lowercases the text once; synonyms are lowercased here.
    pub fn first_match(&self, lowered_text: &str) -> Option<&str> {
        self.synonyms
            .iter()
            .find(|s| lowered_text.contains(&s.to_lowercase()))
            .map(String::as_str)
    }
}

impl AllergenCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a name → synonyms map
    pub fn from_map<I, S>(map: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<S>)>,
        S: Into<String>,
    {
        let mut catalog = Self::new();
        for (name, synonyms) in map {
            catalog.insert(AllergenEntry::new(name, synonyms));
        }
        catalog
    }

    /// Insert an entry, merging synonyms if the name already exists
    pub fn insert(&mut self, entry: AllergenEntry) {
        match self.entries.remove(&entry.name) {
            Some(existing) => {
                let merged = AllergenEntry::new(
                    existing.name,
                    existing.synonyms.into_iter().chain(entry.synonyms),
                );
                self.entries.insert(merged.name.clone(), merged);
            }
            None => {
                self.entries.insert(entry.name.clone(), entry);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&AllergenEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate catalog integrity
    ///
    /// Returns a list of validation errors (empty if valid)
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (key, entry) in &self.entries {
            if entry.name.is_empty() {
                errors.push("Allergen with empty name".to_string());
                continue;
            }
            if key != &entry.name {
                errors.push(format!(
                    "Allergen '{}' stored under mismatched key '{}'",
                    entry.name, key
                ));
            }
            let lowered = entry.name.to_lowercase();
            if !entry.synonyms.iter().any(|s| s.to_lowercase() == lowered) {
                errors.push(format!(
                    "Allergen '{}' does not list itself as a synonym",
                    entry.name
                ));
            }
        }

        errors
    }
}

impl SymptomWeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight of a symptom system, 0 when unknown
    pub fn weight(&self, system: &str) -> u32 {
        self.0.get(system).copied().unwrap_or(0)
    }

    pub fn insert(&mut self, system: impl Into<String>, base_score: u32) {
        self.0.insert(system.into(), base_score);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for SymptomWeights {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect::<HashMap<_, _>>())
    }
}

/// Builds the default tables: a small allergen catalog, the standard symptom
/// weights, and two score threshold rules
///
/// **Note**: For production use, prefer `get_default_tables()` which returns a
/// cached reference. This function is retained for testing.
pub fn build_default_tables() -> RiskTables {
    RiskTables {
        catalog: build_default_catalog(),
        weights: build_default_weights(),
        rules: compile_rules(&default_raw_rules()),
    }
}

/// Built-in allergen catalog covering common labelled allergens
pub fn build_default_catalog() -> AllergenCatalog {
    let mut map: BTreeMap<String, Vec<&str>> = BTreeMap::new();

    map.insert("땅콩".into(), vec!["peanut", "groundnut", "피넛"]);
    map.insert("우유".into(), vec!["milk", "유청", "whey", "카제인", "casein", "버터", "butter"]);
    map.insert("계란".into(), vec!["egg", "달걀", "난백", "난황", "albumin"]);
    map.insert("밀".into(), vec!["wheat", "밀가루", "소맥", "gluten", "글루텐"]);
    map.insert("대두".into(), vec!["soy", "soybean", "두유", "대두단백"]);
    map.insert("새우".into(), vec!["shrimp", "prawn"]);
    map.insert("고등어".into(), vec!["mackerel"]);
    map.insert("호두".into(), vec!["walnut"]);
    map.insert("메밀".into(), vec!["buckwheat"]);
    map.insert("복숭아".into(), vec!["peach"]);
    map.insert("토마토".into(), vec!["tomato"]);

    AllergenCatalog::from_map(map)
}

/// Built-in symptom system weights
pub fn build_default_weights() -> SymptomWeights {
    [
        ("respiratory", 4),
        ("cardiovascular", 5),
        ("gi", 2),
        ("skin", 1),
        ("oas", 1),
    ]
    .into_iter()
    .collect()
}

fn default_raw_rules() -> Vec<RawRiskRule> {
    vec![
        RawRiskRule {
            condition: RawCondition::Expression("score>=9".into()),
            risk_level: "very_high".into(),
            priority: Some(10),
        },
        RawRiskRule {
            condition: RawCondition::Expression("score>=7".into()),
            risk_level: "high".into(),
            priority: Some(20),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_includes_itself() {
        let entry = AllergenEntry::new("땅콩", vec!["peanut"]);
        assert!(entry.synonyms.contains(&"땅콩".to_string()));
        assert!(entry.synonyms.contains(&"peanut".to_string()));
    }

    #[test]
    fn test_entry_dedupes_case_insensitively() {
        let entry = AllergenEntry::new("Milk", vec!["milk", "MILK", " ", "whey"]);
        assert_eq!(entry.synonyms, vec!["Milk".to_string(), "whey".to_string()]);
        assert_eq!(entry.first_match("skim milk powder"), Some("Milk"));
    }

    #[test]
    fn test_insert_merges_synonyms() {
        let mut catalog = AllergenCatalog::new();
        catalog.insert(AllergenEntry::new("새우", vec!["shrimp"]));
        catalog.insert(AllergenEntry::new("새우", vec!["prawn"]));

        let entry = catalog.get("새우").unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(entry.synonyms.contains(&"shrimp".to_string()));
        assert!(entry.synonyms.contains(&"prawn".to_string()));
    }

    #[test]
    fn test_unknown_symptom_weighs_zero() {
        let weights = build_default_weights();
        assert_eq!(weights.weight("respiratory"), 4);
        assert_eq!(weights.weight("telepathic"), 0);
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_validate_flags_missing_self_synonym() {
        let mut catalog = AllergenCatalog::new();
        catalog.entries.insert(
            "호두".into(),
            AllergenEntry {
                name: "호두".into(),
                synonyms: vec!["walnut".into()],
            },
        );
        assert_eq!(catalog.validate().len(), 1);
    }

    #[test]
    fn test_default_tables_have_rules() {
        let tables = get_default_tables();
        assert_eq!(tables.rules.len(), 2);
        assert!(!tables.catalog.is_empty());
        assert_eq!(tables.weights.len(), 5);
    }
}
