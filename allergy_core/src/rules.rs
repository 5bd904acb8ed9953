//! Configured risk rules and their compilation into typed rules.
//!
//! Rule sheets describe conditions either as a score expression
//! (`"score>=9"`) or as a table of keyword patterns. Both are resolved here,
//! once, so evaluation only ever sees [`Condition`] values. A rule that cannot
//! be resolved is dropped with a warning; it must never block assessment.

use crate::error::RuleError;
use crate::types::{Condition, KeywordPattern, KeywordRule, RiskLevel, RiskRule, ThresholdOp};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;

/// A rule as written in a rule sheet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RawRiskRule {
    #[serde(default, skip_serializing_if = "RawCondition::is_missing")]
    pub condition: RawCondition,

    #[serde(default = "default_risk_level")]
    pub risk_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

/// Either a score expression or a keyword table
///
/// Anything else still deserializes, so one odd entry cannot fail the whole
/// sheet; such rules are rejected when compiled.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawCondition {
    Expression(String),
    Keywords(RawKeywordCondition),
    Unsupported(toml::Value),
    #[default]
    Missing,
}

impl RawCondition {
    pub fn is_missing(&self) -> bool {
        matches!(self, RawCondition::Missing)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawKeywordCondition {
    #[serde(default, alias = "키워드규칙")]
    pub keyword_rules: Vec<RawKeywordPattern>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct RawKeywordPattern {
    #[serde(default, alias = "구분")]
    pub label: String,

    #[serde(default, alias = "패턴")]
    pub pattern: String,
}

fn default_risk_level() -> String {
    RiskLevel::VeryLow.as_str().to_string()
}

/// Parse a score expression such as `score >= 9`.
///
/// Whitespace is ignored. The first operator found in the order
/// `>=`, `<=`, `>`, `<`, `==` decides the split; the left side must be the
/// literal `score` and the right side an integer. Integers beyond the `i64`
/// range saturate, which keeps the comparison outcome for any `u32` score.
pub fn parse_threshold(expr: &str) -> Result<(ThresholdOp, i64), RuleError> {
    let compact: String = expr.chars().filter(|c| !c.is_whitespace()).collect();
    let malformed = || RuleError::MalformedThreshold(expr.to_string());

    let (op, left, right) = ThresholdOp::SEARCH_ORDER
        .iter()
        .find_map(|op| {
            compact
                .split_once(op.symbol())
                .map(|(left, right)| (*op, left, right))
        })
        .ok_or_else(malformed)?;

    if left != "score" {
        return Err(malformed());
    }
    let threshold = match right.parse::<i64>() {
        Ok(value) => value,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return Err(malformed()),
        },
    };

    Ok((op, threshold))
}

/// Compile one keyword pattern, case-insensitively
pub fn build_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

/// Compile every usable pattern of a keyword condition.
///
/// Blank and invalid patterns are skipped one by one; the rule only fails
/// when nothing usable remains.
pub fn compile_keywords(raw: &RawKeywordCondition) -> Result<KeywordRule, RuleError> {
    let mut patterns = Vec::new();

    for entry in &raw.keyword_rules {
        if entry.pattern.is_empty() {
            continue;
        }
        match build_pattern(&entry.pattern) {
            Ok(regex) => patterns.push(KeywordPattern {
                label: entry.label.clone(),
                regex,
            }),
            Err(e) => {
                tracing::warn!("Skipping invalid keyword pattern {:?}: {}", entry.pattern, e);
            }
        }
    }

    if patterns.is_empty() {
        return Err(RuleError::NoUsablePatterns);
    }
    Ok(KeywordRule { patterns })
}

impl RawRiskRule {
    /// Resolve this rule into its typed form
    pub fn compile(&self) -> Result<RiskRule, RuleError> {
        let condition = match &self.condition {
            RawCondition::Expression(expr) => {
                let (op, threshold) = parse_threshold(expr)?;
                Condition::ScoreThreshold { op, threshold }
            }
            RawCondition::Keywords(keywords) => Condition::Keyword(compile_keywords(keywords)?),
            RawCondition::Unsupported(value) => {
                return Err(RuleError::UnsupportedCondition(value.to_string()))
            }
            RawCondition::Missing => return Err(RuleError::MissingCondition),
        };

        let risk_level = RiskLevel::parse(&self.risk_level)
            .ok_or_else(|| RuleError::UnknownRiskLevel(self.risk_level.clone()))?;

        Ok(RiskRule {
            condition,
            risk_level,
            priority: self.priority,
        })
    }
}

/// Compile a rule sheet, dropping rules that cannot be resolved.
///
/// Declaration order is preserved; it breaks priority ties at evaluation.
pub fn compile_rules(raw: &[RawRiskRule]) -> Vec<RiskRule> {
    raw.iter()
        .enumerate()
        .filter_map(|(index, rule)| match rule.compile() {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!("Skipping risk rule #{}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Describe every problem in a rule sheet without compiling it for use.
///
/// Reports dropped rules and individually skipped patterns.
pub fn lint_rules(raw: &[RawRiskRule]) -> Vec<String> {
    let mut issues = Vec::new();

    for (index, rule) in raw.iter().enumerate() {
        if let RawCondition::Keywords(keywords) = &rule.condition {
            for entry in keywords.keyword_rules.iter().filter(|k| !k.pattern.is_empty()) {
                if let Err(e) = build_pattern(&entry.pattern) {
                    issues.push(format!(
                        "rule #{}: invalid pattern {:?} skipped ({})",
                        index,
                        entry.pattern,
                        e.to_string().lines().last().unwrap_or_default()
                    ));
                }
            }
        }

        if let Err(e) = rule.compile() {
            issues.push(format!("rule #{}: dropped, {}", index, e));
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword_rule(patterns: &[&str], level: &str) -> RawRiskRule {
        RawRiskRule {
            condition: RawCondition::Keywords(RawKeywordCondition {
                keyword_rules: patterns
                    .iter()
                    .map(|p| RawKeywordPattern {
                        label: "포함".into(),
                        pattern: p.to_string(),
                    })
                    .collect(),
            }),
            risk_level: level.into(),
            priority: None,
        }
    }

    #[test]
    fn test_parse_threshold_operators() {
        assert_eq!(parse_threshold("score>=9").unwrap(), (ThresholdOp::Ge, 9));
        assert_eq!(parse_threshold("score <= 2").unwrap(), (ThresholdOp::Le, 2));
        assert_eq!(parse_threshold("score>4").unwrap(), (ThresholdOp::Gt, 4));
        assert_eq!(parse_threshold("score<1").unwrap(), (ThresholdOp::Lt, 1));
        assert_eq!(parse_threshold("score==0").unwrap(), (ThresholdOp::Eq, 0));
        assert_eq!(parse_threshold("score>=-1").unwrap(), (ThresholdOp::Ge, -1));
    }

    #[test]
    fn test_parse_threshold_rejects_malformed() {
        for expr in [
            "score=9",
            "score=>9",
            "points>=9",
            "score>=nine",
            "score>=9.5",
            "9<=score",
            "",
        ] {
            assert!(
                matches!(parse_threshold(expr), Err(RuleError::MalformedThreshold(_))),
                "{expr:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_parse_threshold_saturates_huge_literals() {
        assert_eq!(
            parse_threshold("score<99999999999999999999").unwrap(),
            (ThresholdOp::Lt, i64::MAX)
        );
        assert_eq!(
            parse_threshold("score>=-99999999999999999999").unwrap(),
            (ThresholdOp::Ge, i64::MIN)
        );

        let rules = compile_rules(&[RawRiskRule {
            condition: RawCondition::Expression("score<99999999999999999999".into()),
            risk_level: "low".into(),
            priority: None,
        }]);
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_skipped_not_whole_rule() {
        let rule = keyword_rule(&["(unclosed", "함유"], "high").compile().unwrap();
        match rule.condition {
            Condition::Keyword(keywords) => {
                assert_eq!(keywords.patterns.len(), 1);
                assert!(keywords.first_hit("땅콩 함유").is_some());
            }
            other => panic!("expected keyword condition, got {other}"),
        }
    }

    #[test]
    fn test_keyword_rule_without_usable_patterns_is_dropped() {
        let raw = vec![
            keyword_rule(&["(unclosed", ""], "high"),
            keyword_rule(&["첨가"], "medium"),
        ];
        let compiled = compile_rules(&raw);
        assert_eq!(compiled.len(), 1);
        assert_eq!(compiled[0].risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let rule = keyword_rule(&["contains"], "high").compile().unwrap();
        let Condition::Keyword(keywords) = rule.condition else {
            panic!("expected keyword condition");
        };
        assert!(keywords.first_hit("CONTAINS: milk").is_some());
    }

    #[test]
    fn test_unknown_level_drops_rule() {
        let raw = RawRiskRule {
            condition: RawCondition::Expression("score>=1".into()),
            risk_level: "catastrophic".into(),
            priority: None,
        };
        assert_eq!(
            raw.compile().unwrap_err(),
            RuleError::UnknownRiskLevel("catastrophic".into())
        );
    }

    #[test]
    fn test_level_names_are_case_insensitive() {
        let raw = RawRiskRule {
            condition: RawCondition::Expression("score>=1".into()),
            risk_level: "Very_High".into(),
            priority: None,
        };
        assert_eq!(raw.compile().unwrap().risk_level, RiskLevel::VeryHigh);
    }

    #[test]
    fn test_deserialize_korean_keys() {
        let toml_str = r#"
risk_level = "high"
condition = { "키워드규칙" = [{ "구분" = "포함", "패턴" = "함유|포함" }] }
"#;
        let raw: RawRiskRule = toml::from_str(toml_str).unwrap();
        let RawCondition::Keywords(keywords) = &raw.condition else {
            panic!("expected keyword condition");
        };
        assert_eq!(keywords.keyword_rules[0].label, "포함");
        assert_eq!(keywords.keyword_rules[0].pattern, "함유|포함");
    }

    #[test]
    fn test_deserialize_odd_conditions_then_drop() {
        let missing: RawRiskRule = toml::from_str(r#"risk_level = "low""#).unwrap();
        assert!(missing.condition.is_missing());
        assert_eq!(missing.compile().unwrap_err(), RuleError::MissingCondition);

        let numeric: RawRiskRule = toml::from_str("condition = 9\nrisk_level = \"low\"").unwrap();
        assert_eq!(
            numeric.compile().unwrap_err(),
            RuleError::UnsupportedCondition("9".into())
        );
    }

    #[test]
    fn test_deserialize_defaults_level() {
        let raw: RawRiskRule = toml::from_str(r#"condition = "score>=3""#).unwrap();
        assert_eq!(raw.risk_level, "very_low");
        assert_eq!(raw.priority, None);
    }

    #[test]
    fn test_lint_reports_each_problem() {
        let raw = vec![
            RawRiskRule {
                condition: RawCondition::Expression("score=>9".into()),
                risk_level: "high".into(),
                priority: None,
            },
            keyword_rule(&["(bad", "ok"], "severe"),
        ];
        let issues = lint_rules(&raw);
        assert_eq!(issues.len(), 3, "{issues:?}");
        assert!(issues[0].contains("rule #0: dropped"));
        assert!(issues[1].contains("invalid pattern"));
        assert!(issues[2].contains("rule #1: dropped, unknown risk level"));
    }
}
