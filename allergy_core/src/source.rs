//! Risk table sources.
//!
//! The classifier never reaches for configuration on its own: a source loads
//! an immutable [`RiskTables`] snapshot and the caller passes it in.
//! Sources provided here:
//! - [`TomlTablesSource`]: a single TOML bundle
//! - [`crate::csv_import::CsvTablesSource`]: a directory of CSV sheets
//! - [`CachedSource`]: memoizes another source's first successful load

use crate::config::{TablesConfig, TablesFormat};
use crate::csv_import::CsvTablesSource;
use crate::rules::{compile_rules, lint_rules, RawRiskRule};
use crate::{AllergenCatalog, Error, Result, RiskRule, RiskTables, SymptomWeights};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Provider of allergen catalog, symptom weights, and risk rules
pub trait RiskDataSource {
    fn load_allergen_catalog(&self) -> Result<AllergenCatalog>;

    fn load_symptom_weights(&self) -> Result<SymptomWeights>;

    /// Rules exactly as configured, before compilation
    fn load_raw_rules(&self) -> Result<Vec<RawRiskRule>>;

    /// Compiled rules; unusable rules are dropped with a warning
    fn load_risk_rules(&self) -> Result<Vec<RiskRule>> {
        Ok(compile_rules(&self.load_raw_rules()?))
    }

    /// Load everything into one snapshot
    fn load_tables(&self) -> Result<RiskTables> {
        let tables = RiskTables {
            catalog: self.load_allergen_catalog()?,
            weights: self.load_symptom_weights()?,
            rules: self.load_risk_rules()?,
        };
        log_loaded(&tables);
        Ok(tables)
    }

    /// Every problem a load would silently work around
    fn lint(&self) -> Result<Vec<String>> {
        let mut issues = self.load_allergen_catalog()?.validate();
        issues.extend(lint_rules(&self.load_raw_rules()?));
        Ok(issues)
    }
}

pub(crate) fn log_loaded(tables: &RiskTables) {
    tracing::info!(
        "Loaded risk tables: {} allergen(s), {} symptom weight(s), {} rule(s)",
        tables.catalog.len(),
        tables.weights.len(),
        tables.rules.len()
    );
}

// ============================================================================
// TOML bundle
// ============================================================================

/// On-disk shape of a TOML risk table bundle
///
/// ```toml
/// [allergens]
/// "땅콩" = ["peanut"]
///
/// [symptom_weights]
/// respiratory = 4
///
/// [[rules]]
/// condition = "score>=9"
/// risk_level = "very_high"
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawTables {
    #[serde(default)]
    pub allergens: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub symptom_weights: BTreeMap<String, u32>,

    #[serde(default)]
    pub rules: Vec<RawRiskRule>,
}

impl RawTables {
    pub fn catalog(&self) -> AllergenCatalog {
        AllergenCatalog::from_map(
            self.allergens
                .iter()
                .map(|(name, synonyms)| (name.clone(), synonyms.clone())),
        )
    }

    pub fn weights(&self) -> SymptomWeights {
        self.symptom_weights
            .iter()
            .map(|(system, score)| (system.clone(), *score))
            .collect()
    }
}

/// Risk tables read from a single TOML file
#[derive(Clone, Debug)]
pub struct TomlTablesSource {
    path: PathBuf,
}

impl TomlTablesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RawTables> {
        let contents = std::fs::read_to_string(&self.path)?;
        let raw: RawTables = toml::from_str(&contents)?;
        tracing::debug!("Read risk table bundle {:?}", self.path);
        Ok(raw)
    }
}

impl RiskDataSource for TomlTablesSource {
    fn load_allergen_catalog(&self) -> Result<AllergenCatalog> {
        Ok(self.read()?.catalog())
    }

    fn load_symptom_weights(&self) -> Result<SymptomWeights> {
        Ok(self.read()?.weights())
    }

    fn load_raw_rules(&self) -> Result<Vec<RawRiskRule>> {
        Ok(self.read()?.rules)
    }

    fn load_tables(&self) -> Result<RiskTables> {
        let raw = self.read()?;
        let tables = RiskTables {
            catalog: raw.catalog(),
            weights: raw.weights(),
            rules: compile_rules(&raw.rules),
        };
        log_loaded(&tables);
        Ok(tables)
    }
}

// ============================================================================
// Caching
// ============================================================================

/// Loads from the wrapped source once and hands out the same snapshot after
///
/// A failed load is not cached; the next call tries again.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cell: OnceCell<RiskTables>,
}

impl<S: RiskDataSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cell: OnceCell::new(),
        }
    }

    /// The cached snapshot, loading it on first use
    pub fn tables(&self) -> Result<&RiskTables> {
        self.cell.get_or_try_init(|| self.inner.load_tables())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Drop the cached snapshot so the next call reloads
    pub fn invalidate(&mut self) {
        self.cell.take();
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

// ============================================================================
// Configured source selection
// ============================================================================

/// Open the source described by `config`, or `None` when no path is set
pub fn open_source(config: &TablesConfig) -> Result<Option<Box<dyn RiskDataSource>>> {
    let Some(path) = &config.path else {
        return Ok(None);
    };

    if !path.exists() {
        return Err(Error::Tables(format!("{} does not exist", path.display())));
    }

    let format = config.format.unwrap_or_else(|| TablesFormat::infer(path));
    let source: Box<dyn RiskDataSource> = match format {
        TablesFormat::Toml => Box::new(TomlTablesSource::new(path)),
        TablesFormat::Csv => Box::new(CsvTablesSource::new(path)),
    };
    Ok(Some(source))
}

/// Load the configured tables, falling back to the built-in defaults
pub fn load_configured_tables(config: &TablesConfig) -> Result<RiskTables> {
    match open_source(config)? {
        Some(source) => source.load_tables(),
        None => {
            tracing::info!("No risk table path configured, using built-in defaults");
            Ok(crate::build_default_tables())
        }
    }
}
