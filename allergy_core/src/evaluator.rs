//! Rule evaluation: score thresholds and keyword rules escalate the level.
//!
//! Every rule is checked; matches accumulate through a max-level reducer
//! rather than stopping at the first hit. When nothing fires, the default
//! score-to-level table decides.

use crate::{Condition, RiskLevel, RiskRule};
use serde::Serialize;

/// Why a single rule fired
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RuleMatch {
    /// Position of the rule in the compiled rule list
    pub index: usize,
    pub condition: String,
    pub risk_level: RiskLevel,
    /// Label of the keyword pattern that hit, for keyword rules
    pub keyword_label: Option<String>,
}

/// Full result of evaluating a rule set
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct RuleOutcome {
    pub level: RiskLevel,
    pub matched: Vec<RuleMatch>,
    pub fallback_applied: bool,
}

/// Evaluate the rules and return only the resulting level
pub fn evaluate(score: u32, text: &str, rules: &[RiskRule]) -> RiskLevel {
    evaluate_detailed(score, text, rules).level
}

/// Evaluate the rules, keeping a record of which ones fired
pub fn evaluate_detailed(score: u32, text: &str, rules: &[RiskRule]) -> RuleOutcome {
    let mut ordered: Vec<(usize, &RiskRule)> = rules.iter().enumerate().collect();
    // Stable: equal priorities keep declaration order, unprioritized go last
    ordered.sort_by_key(|(_, rule)| match rule.priority {
        Some(p) => (0, p),
        None => (1, 0),
    });

    let mut level = RiskLevel::VeryLow;
    let mut matched = Vec::new();

    for (index, rule) in ordered {
        let hit = match &rule.condition {
            Condition::ScoreThreshold { op, threshold } => {
                op.apply(i64::from(score), *threshold).then_some(None)
            }
            Condition::Keyword(keywords) => keywords
                .first_hit(text)
                .map(|pattern| Some(pattern.label.clone())),
        };

        let Some(keyword_label) = hit else {
            continue;
        };

        tracing::debug!(
            "Rule #{} ({}) fired -> {}",
            index,
            rule.condition,
            rule.risk_level
        );

        level = level.max(rule.risk_level);

        matched.push(RuleMatch {
            index,
            condition: rule.condition.to_string(),
            risk_level: rule.risk_level,
            keyword_label,
        });
    }

    let fallback_applied = matched.is_empty();
    if fallback_applied {
        level = RiskLevel::from_score(score);
        tracing::debug!("No rule fired, score {} maps to {}", score, level);
    }

    RuleOutcome {
        level,
        matched,
        fallback_applied,
    }
}
