//! Serializable analysis record for callers that keep a history.
//!
//! Storage is the caller's concern; this only shapes the record.

use crate::{RiskLevel, RiskVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One completed analysis, ready to persist or print
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub food_name: Option<String>,
    pub detected_allergens: BTreeSet<String>,
    pub symptom_check: Vec<String>,
    pub total_score: u32,
    pub final_risk: RiskLevel,
}

impl AnalysisReport {
    pub fn new(verdict: &RiskVerdict, symptoms: &[String], food_name: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            food_name,
            detected_allergens: verdict.detected_allergens.clone(),
            symptom_check: symptoms.to_vec(),
            total_score: verdict.score,
            final_risk: verdict.level,
        }
    }

    /// Whether this report should count toward a user's "danger" tally
    pub fn is_dangerous(&self) -> bool {
        self.final_risk >= RiskLevel::Medium
    }
}

/// Number of reports at medium risk or above
pub fn count_dangerous(reports: &[AnalysisReport]) -> usize {
    reports.iter().filter(|r| r.is_dangerous()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(level: RiskLevel) -> RiskVerdict {
        RiskVerdict {
            detected_allergens: BTreeSet::from(["땅콩".to_string()]),
            score: 6,
            level,
        }
    }

    #[test]
    fn test_report_copies_verdict() {
        let symptoms = vec!["skin".to_string()];
        let report = AnalysisReport::new(&verdict(RiskLevel::Medium), &symptoms, Some("과자".into()));
        assert_eq!(report.total_score, 6);
        assert_eq!(report.final_risk, RiskLevel::Medium);
        assert_eq!(report.symptom_check, symptoms);
        assert!(report.detected_allergens.contains("땅콩"));
    }

    #[test]
    fn test_report_serializes_level_snake_case() {
        let report = AnalysisReport::new(&verdict(RiskLevel::VeryHigh), &[], None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["final_risk"], "very_high");
        assert!(json["food_name"].is_null());
    }

    #[test]
    fn test_danger_count() {
        let reports: Vec<_> = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::VeryHigh]
            .into_iter()
            .map(|level| AnalysisReport::new(&verdict(level), &[], None))
            .collect();
        assert_eq!(count_dangerous(&reports), 2);
    }
}
