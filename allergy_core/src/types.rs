//! Core domain types for the allergy risk engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Risk levels and their ordering
//! - Risk rules with typed conditions
//! - Allergen catalog and symptom weight tables
//! - Analysis requests and verdicts

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

// ============================================================================
// Risk Levels
// ============================================================================

/// Discrete risk classification, ordered from least to most severe
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    /// All levels in ascending order
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very_low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    /// Parse a configured level name, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for names outside the known scale.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|level| level.as_str() == name)
    }

    /// Default score-to-level mapping used when no configured rule fires
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 9 => RiskLevel::VeryHigh,
            s if s >= 7 => RiskLevel::High,
            s if s >= 5 => RiskLevel::Medium,
            s if s >= 3 => RiskLevel::Low,
            _ => RiskLevel::VeryLow,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Rule Types
// ============================================================================

/// Comparison operator of a score threshold condition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThresholdOp {
    Ge,
    Le,
    Gt,
    Lt,
    Eq,
}

impl ThresholdOp {
    /// Operators in the order they are searched for in a condition string.
    /// Two-character operators come first so `>=` is never read as `>`.
    pub const SEARCH_ORDER: [ThresholdOp; 5] = [
        ThresholdOp::Ge,
        ThresholdOp::Le,
        ThresholdOp::Gt,
        ThresholdOp::Lt,
        ThresholdOp::Eq,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            ThresholdOp::Ge => ">=",
            ThresholdOp::Le => "<=",
            ThresholdOp::Gt => ">",
            ThresholdOp::Lt => "<",
            ThresholdOp::Eq => "==",
        }
    }

    pub fn apply(&self, score: i64, threshold: i64) -> bool {
        match self {
            ThresholdOp::Ge => score >= threshold,
            ThresholdOp::Le => score <= threshold,
            ThresholdOp::Gt => score > threshold,
            ThresholdOp::Lt => score < threshold,
            ThresholdOp::Eq => score == threshold,
        }
    }
}

/// One compiled keyword pattern (always case-insensitive)
#[derive(Clone, Debug)]
pub struct KeywordPattern {
    /// Free-form grouping label, e.g. "포함" or "유래/추출"
    pub label: String,
    pub regex: Regex,
}

/// Keyword condition: matches if any pattern matches the label text
#[derive(Clone, Debug, Default)]
pub struct KeywordRule {
    pub patterns: Vec<KeywordPattern>,
}

impl KeywordRule {
    /// Return the first pattern that matches `text`, if any
    pub fn first_hit(&self, text: &str) -> Option<&KeywordPattern> {
        self.patterns.iter().find(|p| p.regex.is_match(text))
    }
}

/// Typed rule condition, resolved once when rules are loaded
#[derive(Clone, Debug)]
pub enum Condition {
    ScoreThreshold { op: ThresholdOp, threshold: i64 },
    Keyword(KeywordRule),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::ScoreThreshold { op, threshold } => {
                write!(f, "score{}{}", op.symbol(), threshold)
            }
            Condition::Keyword(rule) => {
                let patterns: Vec<&str> = rule.patterns.iter().map(|p| p.regex.as_str()).collect();
                write!(f, "keywords[{}]", patterns.join(", "))
            }
        }
    }
}

/// A compiled risk rule
#[derive(Clone, Debug)]
pub struct RiskRule {
    pub condition: Condition,
    pub risk_level: RiskLevel,
    /// Lower evaluates first; rules without a priority go last
    pub priority: Option<i64>,
}

// ============================================================================
// Catalog and Weight Tables
// ============================================================================

/// A canonical allergen and the strings that identify it in label text
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllergenEntry {
    pub name: String,
    /// Always contains `name`; deduplicated case-insensitively
    pub synonyms: Vec<String>,
}

/// Allergen catalog keyed by canonical name
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AllergenCatalog {
    pub entries: BTreeMap<String, AllergenEntry>,
}

/// Base severity weight per symptom system; unknown systems weigh 0
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SymptomWeights(pub HashMap<String, u32>);

/// Immutable snapshot of everything the classifier consults
#[derive(Clone, Debug, Default)]
pub struct RiskTables {
    pub catalog: AllergenCatalog,
    pub weights: SymptomWeights,
    pub rules: Vec<RiskRule>,
}

// ============================================================================
// Analysis Input and Output
// ============================================================================

/// Flags that adjust the symptom score
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Symptoms appeared quickly after exposure
    #[serde(default)]
    pub fast_onset: bool,
    /// Label carries an allergen-free claim
    #[serde(default)]
    pub free_label: bool,
}

/// Everything a single classification call needs besides the tables
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    pub user_allergens: Vec<String>,
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub options: AnalysisOptions,
}

/// Result of one classification call
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskVerdict {
    pub detected_allergens: BTreeSet<String>,
    pub score: u32,
    pub level: RiskLevel,
}
