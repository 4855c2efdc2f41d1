//! Scoring and compliance levels.
//!
//! The score starts at 100. Every rule subtracts its penalty once per
//! occurrence, counting at most `max_occurrences` occurrences, and the result
//! is clamped to 0..=100.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::detect::Violation;
use crate::rules::RuleRegistry;

/// Starting score for a unit with no violations.
pub const MAX_SCORE: u32 = 100;

/// Default cap on counted occurrences per rule.
pub const DEFAULT_MAX_OCCURRENCES: u32 = 3;

/// Lower bounds of each compliance level. Fixed for cross-run comparability.
pub mod levels {
    pub const FULLY_COMPLIANT_MIN: u32 = 90;
    pub const MINOR_ISSUES_MIN: u32 = 75;
    pub const MODERATE_ISSUES_MIN: u32 = 60;
    pub const MAJOR_ISSUES_MIN: u32 = 40;
}

/// Compliance classification derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceLevel {
    NonCompliant,
    MajorIssues,
    ModerateIssues,
    MinorIssues,
    FullyCompliant,
}

impl ComplianceLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= levels::FULLY_COMPLIANT_MIN => ComplianceLevel::FullyCompliant,
            s if s >= levels::MINOR_ISSUES_MIN => ComplianceLevel::MinorIssues,
            s if s >= levels::MODERATE_ISSUES_MIN => ComplianceLevel::ModerateIssues,
            s if s >= levels::MAJOR_ISSUES_MIN => ComplianceLevel::MajorIssues,
            _ => ComplianceLevel::NonCompliant,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceLevel::FullyCompliant => "fully_compliant",
            ComplianceLevel::MinorIssues => "minor_issues",
            ComplianceLevel::ModerateIssues => "moderate_issues",
            ComplianceLevel::MajorIssues => "major_issues",
            ComplianceLevel::NonCompliant => "non_compliant",
        }
    }

    /// Human-readable label for text reports.
    pub fn label(&self) -> &'static str {
        match self {
            ComplianceLevel::FullyCompliant => "Fully compliant",
            ComplianceLevel::MinorIssues => "Minor issues",
            ComplianceLevel::ModerateIssues => "Moderate issues",
            ComplianceLevel::MajorIssues => "Major issues",
            ComplianceLevel::NonCompliant => "Non-compliant",
        }
    }
}

impl std::fmt::Display for ComplianceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Global scoring knobs. Per-rule caps live on the rules themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub max_occurrences: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

/// Points actually subtracted for one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDeduction {
    pub rule_id: String,
    pub occurrences: u32,
    pub points: u32,
}

/// Result of scoring one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceScore {
    pub score: u32,
    pub level: ComplianceLevel,
    /// Sorted by rule id.
    pub deductions: Vec<RuleDeduction>,
}

impl ComplianceScore {
    /// Sum of deductions before clamping.
    pub fn total_points(&self) -> u32 {
        self.deductions.iter().map(|d| d.points).sum()
    }
}

/// Score a set of violations. Violations of unknown rules deduct nothing.
pub fn calculate(violations: &[Violation], registry: &RuleRegistry, policy: &ScoringPolicy) -> ComplianceScore {
    let mut occurrences: BTreeMap<&str, u32> = BTreeMap::new();
    for v in violations {
        *occurrences.entry(v.rule_id.as_str()).or_insert(0) += 1;
    }

    let deductions: Vec<RuleDeduction> = occurrences
        .into_iter()
        .filter_map(|(rule_id, count)| {
            let rule = registry.get(rule_id)?;
            let cap = rule.max_occurrences.unwrap_or(policy.max_occurrences);
            Some(RuleDeduction {
                rule_id: rule_id.to_string(),
                occurrences: count,
                points: count.min(cap).saturating_mul(rule.penalty),
            })
        })
        .collect();

    let total: u32 = deductions.iter().fold(0u32, |acc, d| acc.saturating_add(d.points));
    let score = MAX_SCORE.saturating_sub(total);

    ComplianceScore {
        score,
        level: ComplianceLevel::from_score(score),
        deductions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ids, RuleOverride};

    fn violations(rule: &str, n: usize) -> Vec<Violation> {
        (1..=n).map(|line| Violation::new(rule, line, "x", "")).collect()
    }

    #[test]
    fn test_level_boundaries() {
        assert_eq!(ComplianceLevel::from_score(100), ComplianceLevel::FullyCompliant);
        assert_eq!(ComplianceLevel::from_score(90), ComplianceLevel::FullyCompliant);
        assert_eq!(ComplianceLevel::from_score(89), ComplianceLevel::MinorIssues);
        assert_eq!(ComplianceLevel::from_score(75), ComplianceLevel::MinorIssues);
        assert_eq!(ComplianceLevel::from_score(74), ComplianceLevel::ModerateIssues);
        assert_eq!(ComplianceLevel::from_score(60), ComplianceLevel::ModerateIssues);
        assert_eq!(ComplianceLevel::from_score(59), ComplianceLevel::MajorIssues);
        assert_eq!(ComplianceLevel::from_score(40), ComplianceLevel::MajorIssues);
        assert_eq!(ComplianceLevel::from_score(39), ComplianceLevel::NonCompliant);
        assert_eq!(ComplianceLevel::from_score(0), ComplianceLevel::NonCompliant);
    }

    #[test]
    fn test_empty_scores_100() {
        let registry = RuleRegistry::builtin().unwrap();
        let score = calculate(&[], &registry, &ScoringPolicy::default());
        assert_eq!(score.score, 100);
        assert_eq!(score.level, ComplianceLevel::FullyCompliant);
        assert!(score.deductions.is_empty());
    }

    #[test]
    fn test_cap_per_rule() {
        let registry = RuleRegistry::builtin().unwrap();
        let policy = ScoringPolicy::default();

        let one = calculate(&violations(ids::CHAINED_ASSIGNMENT, 1), &registry, &policy);
        let three = calculate(&violations(ids::CHAINED_ASSIGNMENT, 3), &registry, &policy);
        let ten = calculate(&violations(ids::CHAINED_ASSIGNMENT, 10), &registry, &policy);
        assert_eq!(one.score, 98);
        assert_eq!(three.score, 94);
        assert_eq!(ten.score, 94);
        assert_eq!(ten.deductions[0].occurrences, 10);
        assert_eq!(ten.deductions[0].points, 6);
    }

    #[test]
    fn test_clamped_at_zero() {
        let registry = RuleRegistry::builtin().unwrap();
        let mut all = violations(ids::GOTO, 3);
        all.extend(violations(ids::RECURSION, 3));
        all.extend(violations(ids::DYNAMIC_MEMORY, 3));
        let score = calculate(&all, &registry, &ScoringPolicy::default());
        assert_eq!(score.total_points(), 135);
        assert_eq!(score.score, 0);
        assert_eq!(score.level, ComplianceLevel::NonCompliant);
    }

    #[test]
    fn test_monotonic_in_occurrences() {
        let registry = RuleRegistry::builtin().unwrap();
        let policy = ScoringPolicy::default();
        let mut previous = MAX_SCORE;
        for n in 0..8 {
            let score = calculate(&violations(ids::LOOP_BOUND, n), &registry, &policy).score;
            assert!(score <= previous);
            assert!(score >= MAX_SCORE - 3 * 10);
            previous = score;
        }
    }

    #[test]
    fn test_per_rule_cap_and_global_policy() {
        let registry = RuleRegistry::builtin()
            .unwrap()
            .with_overrides(&[RuleOverride {
                id: ids::GOTO.to_string(),
                max_occurrences: Some(1),
                ..Default::default()
            }])
            .unwrap();
        let score = calculate(&violations(ids::GOTO, 4), &registry, &ScoringPolicy::default());
        assert_eq!(score.score, 85);

        let strict = ScoringPolicy { max_occurrences: 5 };
        let score = calculate(&violations(ids::LOOP_BOUND, 4), &registry, &strict);
        assert_eq!(score.score, 60);
    }

    #[test]
    fn test_unknown_rules_ignored_and_deductions_sorted() {
        let registry = RuleRegistry::builtin().unwrap();
        let mut all = violations("NOT-A-RULE", 2);
        all.extend(violations(ids::SINGLE_EXIT, 1));
        all.extend(violations(ids::GOTO, 1));
        let score = calculate(&all, &registry, &ScoringPolicy::default());
        let rule_ids: Vec<_> = score.deductions.iter().map(|d| d.rule_id.as_str()).collect();
        assert_eq!(rule_ids, vec!["MISRA-SINGLE-EXIT", "NASA-GOTO"]);
        assert_eq!(score.score, 80);
    }
}
