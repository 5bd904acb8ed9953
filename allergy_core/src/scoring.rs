//! Symptom-weighted severity scoring.
//!
//! Score pipeline, always applied in this order:
//! 1. Sum of base weights over every reported symptom entry
//! 2. Multi-system bonus: +4 for three or more distinct systems, +2 for two
//! 3. Fast onset: +2 when respiratory or cardiovascular is reported, else +1
//! 4. Free-label claim: -3, floored at zero
//!
//! Every step saturates, so huge weights pin the score at `u32::MAX`.

use crate::{AnalysisOptions, SymptomWeights};
use std::collections::HashSet;

/// Symptom systems whose rapid onset counts as severe
pub const SEVERE_SYSTEMS: [&str; 2] = ["respiratory", "cardiovascular"];

/// Compute the severity score for a set of reported symptom systems
pub fn score<S: AsRef<str>>(
    symptoms: &[S],
    options: &AnalysisOptions,
    weights: &SymptomWeights,
) -> u32 {
    let base = symptoms
        .iter()
        .map(|s| weights.weight(s.as_ref()))
        .fold(0u32, u32::saturating_add);
    let adjusted = apply_adjustments(base, symptoms, options);

    tracing::debug!(
        "Scored {} symptom(s): base {}, adjusted {}",
        symptoms.len(),
        base,
        adjusted
    );

    adjusted
}

/// Apply the multi-system, fast-onset, and free-label adjustments to a base score
pub fn apply_adjustments<S: AsRef<str>>(
    base: u32,
    symptoms: &[S],
    options: &AnalysisOptions,
) -> u32 {
    let mut score = base;

    let distinct: HashSet<&str> = symptoms.iter().map(AsRef::as_ref).collect();
    score = score.saturating_add(match distinct.len() {
        n if n >= 3 => 4,
        2 => 2,
        _ => 0,
    });

    if options.fast_onset {
        let severe = SEVERE_SYSTEMS.iter().any(|s| distinct.contains(s));
        score = score.saturating_add(if severe { 2 } else { 1 });
    }

    if options.free_label {
        score = score.saturating_sub(3);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> SymptomWeights {
        [("respiratory", 4), ("skin", 1), ("gi", 2), ("cardiovascular", 5)]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_two_systems_with_fast_onset() {
        let options = AnalysisOptions {
            fast_onset: true,
            free_label: false,
        };
        assert_eq!(score(&["respiratory", "skin"], &options, &weights()), 9);
    }

    #[test]
    fn test_free_label_discount() {
        let options = AnalysisOptions {
            fast_onset: true,
            free_label: true,
        };
        assert_eq!(score(&["respiratory", "skin"], &options, &weights()), 6);
    }

    #[test]
    fn test_free_label_clamps_at_zero() {
        let options = AnalysisOptions {
            fast_onset: false,
            free_label: true,
        };
        let none: [&str; 0] = [];
        assert_eq!(score(&none, &options, &weights()), 0);
        assert_eq!(score(&["skin"], &options, &weights()), 0);
    }

    #[test]
    fn test_three_systems_bonus() {
        let options = AnalysisOptions::default();
        // 1 + 2 + 5 + 4
        assert_eq!(score(&["skin", "gi", "cardiovascular"], &options, &weights()), 12);
    }

    #[test]
    fn test_duplicates_add_weight_but_not_bonus() {
        let options = AnalysisOptions::default();
        assert_eq!(score(&["respiratory", "respiratory"], &options, &weights()), 8);
    }

    #[test]
    fn test_fast_onset_without_severe_system() {
        let options = AnalysisOptions {
            fast_onset: true,
            free_label: false,
        };
        assert_eq!(score(&["skin"], &options, &weights()), 2);

        let none: [&str; 0] = [];
        assert_eq!(score(&none, &options, &weights()), 1);
    }

    #[test]
    fn test_huge_weights_saturate() {
        let heavy: SymptomWeights = [("respiratory", 3_000_000_000u32), ("skin", u32::MAX)]
            .into_iter()
            .collect();
        let options = AnalysisOptions {
            fast_onset: true,
            free_label: false,
        };

        assert_eq!(score(&["respiratory", "respiratory"], &options, &heavy), u32::MAX);
        assert_eq!(score(&["skin", "respiratory"], &options, &heavy), u32::MAX);

        let discounted = AnalysisOptions {
            fast_onset: true,
            free_label: true,
        };
        assert_eq!(score(&["skin"], &discounted, &heavy), u32::MAX - 3);
    }

    #[test]
    fn test_unknown_systems_weigh_zero_but_count_as_distinct() {
        let options = AnalysisOptions::default();
        assert_eq!(score(&["skin", "mystery"], &options, &weights()), 3);
    }
}
