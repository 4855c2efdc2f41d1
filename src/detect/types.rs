//! Core types for detection results.

use serde::{Deserialize, Serialize};

/// A single detected rule violation.
///
/// Severity and penalty are not stored here; they are looked up in the
/// registry by `rule_id` when the report is scored or rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    /// Line number (1-indexed).
    pub line: usize,
    pub message: String,
    /// Trimmed raw text of the offending line.
    pub snippet: String,
}

impl Violation {
    pub fn new(rule_id: &str, line: usize, message: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            line,
            message: message.into(),
            snippet: snippet.into(),
        }
    }

    /// Ordering key used to make reports deterministic.
    pub fn sort_key(&self) -> (usize, &str, &str, &str) {
        (self.line, &self.rule_id, &self.message, &self.snippet)
    }
}

/// Kinds of non-fatal analysis irregularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnterminatedFunction,
    UnbalancedBrace,
    StringHeavyLine,
    PossibleIndirectRecursion,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::UnterminatedFunction => "unterminated_function",
            WarningKind::UnbalancedBrace => "unbalanced_brace",
            WarningKind::StringHeavyLine => "string_heavy_line",
            WarningKind::PossibleIndirectRecursion => "possible_indirect_recursion",
        }
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Informational entry carried in the report. Never affects the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWarning {
    pub kind: WarningKind,
    pub line: usize,
    pub message: String,
}

impl AnalysisWarning {
    pub fn new(kind: WarningKind, line: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }
}

/// Results of running one or more detectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub warnings: Vec<AnalysisWarning>,
}

impl DetectionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another result into this one.
    pub fn merge(&mut self, other: DetectionResult) {
        self.violations.extend(other.violations);
        self.warnings.extend(other.warnings);
    }

    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn add_warning(&mut self, warning: AnalysisWarning) {
        self.warnings.push(warning);
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.warnings.is_empty()
    }
}
