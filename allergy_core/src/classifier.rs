//! Risk classifier: composes detection, scoring, and rule evaluation.
//!
//! Detected allergens are reported alongside the level but do not feed the
//! score. Severity comes from reported symptoms and keyword rules only.

use crate::evaluator::{evaluate_detailed, RuleOutcome};
use crate::{detector, scoring, AnalysisRequest, RiskTables, RiskVerdict};

/// A verdict together with the rule trace that produced its level
#[derive(Clone, Debug)]
pub struct Classification {
    pub verdict: RiskVerdict,
    pub outcome: RuleOutcome,
}

/// Classify one analysis request against a snapshot of the risk tables
///
/// ## Steps
///
/// 1. **Detection**: user's registered allergens matched against the text
/// 2. **Scoring**: symptom weights plus onset/label adjustments
/// 3. **Rules**: thresholds and keywords escalate the level, with the
///    default score table as fallback
///
/// Pure and deterministic; safe to call from many threads over one shared
/// `RiskTables`.
pub fn classify(tables: &RiskTables, request: &AnalysisRequest) -> RiskVerdict {
    classify_detailed(tables, request).verdict
}

/// Same as [`classify`], also returning which rules fired
pub fn classify_detailed(tables: &RiskTables, request: &AnalysisRequest) -> Classification {
    let detected_allergens =
        detector::detect(&request.text, &request.user_allergens, &tables.catalog);
    let score = scoring::score(&request.symptoms, &request.options, &tables.weights);
    let outcome = evaluate_detailed(score, &request.text, &tables.rules);

    tracing::info!(
        "Classified: {} allergen(s) detected, score {}, level {}",
        detected_allergens.len(),
        score,
        outcome.level
    );

    Classification {
        verdict: RiskVerdict {
            detected_allergens,
            score,
            level: outcome.level,
        },
        outcome,
    }
}
