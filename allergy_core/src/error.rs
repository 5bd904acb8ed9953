//! Error types for the allergy_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for allergy_core operations
///
/// Only the loading side can fail. Classification itself is infallible.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Risk table source error (missing file, unknown format)
    #[error("Risk table error: {0}")]
    Tables(String),
}

/// Reason a single configured rule could not be turned into a typed rule.
///
/// These never reach the classifier: the loader drops the rule and logs it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("malformed score condition {0:?}")]
    MalformedThreshold(String),

    #[error("keyword rule has no usable pattern")]
    NoUsablePatterns,

    #[error("unknown risk level {0:?}")]
    UnknownRiskLevel(String),

    #[error("rule has no condition")]
    MissingCondition,

    #[error("unsupported condition {0}")]
    UnsupportedCondition(String),
}
