#![forbid(unsafe_code)]

//! Core domain model and classification engine for food allergy risk.
//!
//! This crate provides:
//! - Domain types (risk levels, rules, catalog, verdicts)
//! - Allergen detection in label text
//! - Symptom-weighted scoring
//! - Rule evaluation and the risk classifier
//! - Risk table sources (TOML bundle, CSV sheets, cached handle)

pub mod types;
pub mod error;
pub mod catalog;
pub mod rules;
pub mod config;
pub mod logging;
pub mod detector;
pub mod scoring;
pub mod evaluator;
pub mod classifier;
pub mod source;
pub mod csv_import;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result, RuleError};
pub use types::*;
pub use catalog::{build_default_tables, get_default_tables};
pub use config::Config;
pub use detector::detect;
pub use scoring::score;
pub use evaluator::{evaluate, evaluate_detailed, RuleMatch, RuleOutcome};
pub use classifier::{classify, classify_detailed, Classification};
pub use source::{load_configured_tables, CachedSource, RiskDataSource, TomlTablesSource};
pub use csv_import::CsvTablesSource;
pub use report::AnalysisReport;
