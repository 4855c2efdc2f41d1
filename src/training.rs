//! Training-record projection of a compliance report.
//!
//! The record shape is consumed by downstream model-training tooling, so
//! field names and types here are a stable contract.

use serde::{Deserialize, Serialize};

use crate::analysis::UnitSummary;
use crate::engine::ComplianceReport;
use crate::rules::{RuleRegistry, Severity};

/// One labelled violation in a training record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingViolation {
    pub rule_id: String,
    pub description: String,
    pub severity: Severity,
    pub line: usize,
}

/// A code sample labelled with its compliance assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub code_sample: String,
    pub compliance_score: u32,
    pub compliance_level: String,
    pub violations: Vec<TrainingViolation>,
    pub annotations: UnitSummary,
}

impl TrainingRecord {
    /// Project a report one-to-one into the training schema.
    ///
    /// Severity is resolved through `registry`; violations of rules the
    /// registry does not know are labelled advisory.
    pub fn from_report(report: &ComplianceReport, code: &str, registry: &RuleRegistry) -> Self {
        let violations = report
            .violations
            .iter()
            .map(|v| TrainingViolation {
                rule_id: v.rule_id.clone(),
                description: v.message.clone(),
                severity: registry
                    .get(&v.rule_id)
                    .map(|r| r.severity)
                    .unwrap_or(Severity::Advisory),
                line: v.line,
            })
            .collect();

        Self {
            code_sample: code.to_string(),
            compliance_score: report.score,
            compliance_level: report.level.as_str().to_string(),
            violations,
            annotations: report.summary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::analyze;
    use crate::rules::ids;

    #[test]
    fn test_projection() {
        let registry = RuleRegistry::builtin().unwrap();
        let code = "void f(void) {\n    goto end;\nend:\n    ;\n}\n";
        let report = analyze(code, &registry).unwrap();
        let record = TrainingRecord::from_report(&report, code, &registry);

        assert_eq!(record.code_sample, code);
        assert_eq!(record.compliance_score, 85);
        assert_eq!(record.compliance_level, "minor_issues");
        assert_eq!(record.violations.len(), 1);
        assert_eq!(record.violations[0].rule_id, ids::GOTO);
        assert_eq!(record.violations[0].severity, Severity::Critical);
        assert_eq!(record.violations[0].line, 2);
        assert_eq!(record.annotations.function_count, 1);
    }

    #[test]
    fn test_record_reads_back() {
        let registry = RuleRegistry::builtin().unwrap();
        let code = "int main(void) {\n    return 0;\n}\n";
        let report = analyze(code, &registry).unwrap();
        let record = TrainingRecord::from_report(&report, code, &registry);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"compliance_level\":\"fully_compliant\""));
        let back: TrainingRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
