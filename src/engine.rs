//! Analysis engine: scan, index, detect, suppress, score.
//!
//! An [`Engine`] owns an immutable registry, the detector list and the
//! scoring policy. It holds no per-call state, so one engine can be shared
//! across threads and analyze any number of units concurrently.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{analyze_functions, index_functions, scan, summarize, ComplexityMetrics, UnitSummary};
use crate::detect::{
    filter_suppressed, parse_suppressions, sort_result, AnalysisWarning, DetectionResult, DetectorLimits,
    Runner, SuppressedViolation, Violation,
};
use crate::rules::{RuleRegistry, Severity};
use crate::score::{self, ComplianceLevel, RuleDeduction, ScoringPolicy};

/// Errors returned by a single analysis call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("input is not valid UTF-8: {0}")]
    MalformedInput(#[from] std::str::Utf8Error),
}

/// Whether every heuristic precondition held during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    BestEffort,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::BestEffort => "best_effort",
        }
    }
}

/// The outcome of analyzing one translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Active violations sorted by (line, rule id, message).
    pub violations: Vec<Violation>,
    pub score: u32,
    pub level: ComplianceLevel,
    pub metrics: Vec<ComplexityMetrics>,
    pub status: AnalysisStatus,
    pub warnings: Vec<AnalysisWarning>,
    pub suppressed: Vec<SuppressedViolation>,
    pub deductions: Vec<RuleDeduction>,
    pub summary: UnitSummary,
}

impl ComplianceReport {
    pub fn is_complete(&self) -> bool {
        self.status == AnalysisStatus::Complete
    }

    /// Number of violations whose rule has the given severity.
    pub fn count_by_severity(&self, registry: &RuleRegistry, severity: Severity) -> usize {
        self.violations
            .iter()
            .filter(|v| registry.get(&v.rule_id).map(|r| r.severity) == Some(severity))
            .count()
    }

    /// True when the score meets `threshold`.
    pub fn passes(&self, threshold: u32) -> bool {
        self.score >= threshold
    }
}

/// Tunables that are fixed for the lifetime of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub limits: DetectorLimits,
    pub scoring: ScoringPolicy,
    /// Honour `powercheck:ignore` comments.
    pub suppressions: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            limits: DetectorLimits::default(),
            scoring: ScoringPolicy::default(),
            suppressions: true,
        }
    }
}

/// Configured analysis entry point.
pub struct Engine {
    registry: RuleRegistry,
    runner: Runner,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(registry: RuleRegistry, settings: EngineSettings) -> Self {
        Self {
            runner: Runner::new(settings.limits),
            registry,
            settings,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Analyze one translation unit.
    pub fn analyze(&self, source: impl AsRef<[u8]>) -> Result<ComplianceReport, AnalysisError> {
        run_pipeline(source.as_ref(), &self.registry, &self.runner, &self.settings)
    }
}

/// Analyze one translation unit with the default detector limits and
/// scoring policy.
pub fn analyze(source: impl AsRef<[u8]>, registry: &RuleRegistry) -> Result<ComplianceReport, AnalysisError> {
    let settings = EngineSettings::default();
    let runner = Runner::new(settings.limits);
    run_pipeline(source.as_ref(), registry, &runner, &settings)
}

fn run_pipeline(
    source: &[u8],
    registry: &RuleRegistry,
    runner: &Runner,
    settings: &EngineSettings,
) -> Result<ComplianceReport, AnalysisError> {
    let text = std::str::from_utf8(source).map_err(|e| {
        tracing::warn!(valid_up_to = e.valid_up_to(), "rejecting input that is not valid UTF-8");
        AnalysisError::from(e)
    })?;

    let lines = scan(text);
    let index = index_functions(&lines);
    let found = runner.run(&lines, &index.functions, registry);

    let (violations, suppressed) = if settings.suppressions {
        let suppressions = parse_suppressions(&lines);
        filter_suppressed(found.violations, &suppressions)
    } else {
        (found.violations, Vec::new())
    };

    let mut detection = DetectionResult {
        violations,
        warnings: found.warnings,
    };
    detection.warnings.extend(index.warnings);
    sort_result(&mut detection);

    let scored = score::calculate(&detection.violations, registry, &settings.scoring);
    let metrics = analyze_functions(&lines, &index.functions);
    let summary = summarize(&lines, &index.functions);
    let status = if detection.warnings.is_empty() {
        AnalysisStatus::Complete
    } else {
        AnalysisStatus::BestEffort
    };

    tracing::debug!(
        lines = lines.len(),
        functions = index.functions.len(),
        violations = detection.violations.len(),
        suppressed = suppressed.len(),
        warnings = detection.warnings.len(),
        score = scored.score,
        "analysis finished"
    );

    Ok(ComplianceReport {
        violations: detection.violations,
        score: scored.score,
        level: scored.level,
        metrics,
        status,
        warnings: detection.warnings,
        suppressed,
        deductions: scored.deductions,
        summary,
    })
}
