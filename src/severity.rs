//! Severity scoring
//!
//! Turns reported symptom ids into a 1–10 urgency score. Weights are fixed
//! per triage symptom; the symptom catalog only carries display data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Score used when no symptoms are reported
pub const DEFAULT_SEVERITY: u8 = 5;

/// Weight for ids outside the triage table
pub const UNKNOWN_SYMPTOM_WEIGHT: u8 = 5;

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

pub const CHEST_PAIN: &str = "s1";
pub const DIFFICULTY_BREATHING: &str = "s2";
pub const UNCONSCIOUS: &str = "s3";

/// Triage weight of a single symptom id
pub fn symptom_weight(id: &str) -> u8 {
    match id {
        "s3" => 10,
        "s1" | "s2" | "s8" => 9,
        "s4" | "s5" | "s10" => 8,
        "s7" | "s9" => 7,
        "s6" => 6,
        _ => UNKNOWN_SYMPTOM_WEIGHT,
    }
}

/// Score the symptom ids reported for one emergency.
///
/// Ids are de-duplicated first, so repeating a symptom does not pull the
/// mean toward its weight: `["s6", "s6", "s6", "s3"]` scores 8 like
/// `["s6", "s3"]`, not 7. Unconscious together with chest pain or breathing
/// difficulty forces the maximum score; otherwise the rounded mean weight
/// is used.
pub fn severity_score<S: AsRef<str>>(symptom_ids: &[S]) -> u8 {
    let distinct: BTreeSet<&str> = symptom_ids.iter().map(AsRef::as_ref).collect();
    if distinct.is_empty() {
        return DEFAULT_SEVERITY;
    }

    if distinct.contains(UNCONSCIOUS)
        && (distinct.contains(CHEST_PAIN) || distinct.contains(DIFFICULTY_BREATHING))
    {
        return MAX_SEVERITY;
    }

    let total: u32 = distinct.iter().map(|id| u32::from(symptom_weight(id))).sum();
    let mean = f64::from(total) / distinct.len() as f64;

    (mean.round() as u8).clamp(MIN_SEVERITY, MAX_SEVERITY)
}

/// Display band for a severity score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            9.. => SeverityLevel::Critical,
            7..=8 => SeverityLevel::High,
            5..=6 => SeverityLevel::Medium,
            _ => SeverityLevel::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_default() {
        let empty: [&str; 0] = [];
        assert_eq!(severity_score(&empty), 5);
    }

    #[test]
    fn test_escalation_forces_maximum() {
        assert_eq!(severity_score(&["s3", "s1"]), 10);
        assert_eq!(severity_score(&["s3", "s2"]), 10);
        // Mean would be round((10 + 9 + 6) / 3) = 8 without escalation
        assert_eq!(severity_score(&["s6", "s1", "s3"]), 10);
    }

    #[test]
    fn test_unconscious_alone() {
        assert_eq!(severity_score(&["s3"]), 10);
    }

    #[test]
    fn test_mean_of_weights() {
        assert_eq!(severity_score(&["s1", "s2"]), 9);
        // (6 + 7) / 2 = 6.5 rounds up
        assert_eq!(severity_score(&["s6", "s7"]), 7);
        // (8 + 6 + 5) / 3 = 6.33
        assert_eq!(severity_score(&["s4", "s6", "unknown"]), 6);
    }

    #[test]
    fn test_triage_weights() {
        let expected = [
            ("s1", 9),
            ("s2", 9),
            ("s3", 10),
            ("s4", 8),
            ("s5", 8),
            ("s6", 6),
            ("s7", 7),
            ("s8", 9),
            ("s9", 7),
            ("s10", 8),
        ];
        for (id, weight) in expected {
            assert_eq!(symptom_weight(id), weight, "weight of {}", id);
        }
    }

    #[test]
    fn test_unknown_symptom_weight() {
        assert_eq!(severity_score(&["x-rash"]), UNKNOWN_SYMPTOM_WEIGHT);
    }

    #[test]
    fn test_catalog_only_symptoms_use_default_weight() {
        // Abdominal pain and palpitations are listed in the demo catalog
        // but have no triage weight of their own
        assert_eq!(severity_score(&["s11"]), 5);
        assert_eq!(severity_score(&["s12"]), 5);
        assert_eq!(severity_score(&["s11", "s12"]), 5);
    }

    #[test]
    fn test_order_independent() {
        let forward = severity_score(&["s4", "s6", "s9", "s12"]);
        let reverse = severity_score(&["s12", "s9", "s6", "s4"]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_duplicates_do_not_skew() {
        let once = severity_score(&["s3", "s6"]);
        let repeated = severity_score(&["s6", "s6", "s6", "s3"]);
        assert_eq!(once, repeated);
        assert_eq!(once, 8);
    }

    #[test]
    fn test_score_always_in_range() {
        let ids: Vec<String> = (1..=14).map(|n| format!("s{}", n)).collect();
        for start in 0..ids.len() {
            for end in start..=ids.len() {
                let score = severity_score(&ids[start..end]);
                assert!((MIN_SEVERITY..=MAX_SEVERITY).contains(&score));
            }
        }
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SeverityLevel::from_score(10), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_score(9), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::from_score(7), SeverityLevel::High);
        assert_eq!(SeverityLevel::from_score(5), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::from_score(3), SeverityLevel::Low);
    }
}
