//! Detection runner that orchestrates all detectors.

use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::RuleRegistry;

use super::{
    AssignmentDetector, DeclarationDetector, DetectionResult, FunctionDetector, GotoDetector,
    LoopBoundDetector, MemoryDetector, PointerDepthDetector, PreprocessorDetector,
    RecursionDetector, StyleDetector,
};

/// A single, independent rule check.
///
/// Detectors are pure: they see only the scanned lines and the function
/// boundaries, and report the ids of the rules they implement. Severity and
/// penalty are never decided here.
pub trait Detector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Rule ids this detector can emit.
    fn rules(&self) -> &'static [&'static str];

    fn detect(&self, lines: &[SourceLine], functions: &[FunctionBoundary]) -> DetectionResult;
}

/// Numeric limits used by the function-level detectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorLimits {
    pub max_parameters: usize,
    pub max_function_lines: usize,
}

impl Default for DetectorLimits {
    fn default() -> Self {
        Self {
            max_parameters: 2,
            max_function_lines: 50,
        }
    }
}

/// The built-in detector set.
pub fn default_detectors(limits: DetectorLimits) -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(GotoDetector),
        Box::new(RecursionDetector),
        Box::new(LoopBoundDetector),
        Box::new(MemoryDetector),
        Box::new(FunctionDetector::new(limits)),
        Box::new(PointerDepthDetector),
        Box::new(DeclarationDetector),
        Box::new(PreprocessorDetector),
        Box::new(AssignmentDetector),
        Box::new(StyleDetector),
    ]
}

/// Executes every detector against one translation unit.
pub struct Runner {
    detectors: Vec<Box<dyn Detector>>,
}

impl Runner {
    /// Create a runner with the built-in detectors.
    pub fn new(limits: DetectorLimits) -> Self {
        Self::with_detectors(default_detectors(limits))
    }

    /// Create a runner with an explicit detector list.
    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// Names of the registered detectors, in run order.
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector that has at least one enabled rule.
    ///
    /// Violations for disabled or unregistered rules are dropped. The merged
    /// result is sorted so that the output does not depend on detector order.
    pub fn run(
        &self,
        lines: &[SourceLine],
        functions: &[FunctionBoundary],
        registry: &RuleRegistry,
    ) -> DetectionResult {
        let mut result = DetectionResult::new();

        for detector in &self.detectors {
            if !detector.rules().iter().any(|id| registry.is_enabled(id)) {
                tracing::trace!(detector = detector.name(), "skipped, no enabled rules");
                continue;
            }

            let mut found = detector.detect(lines, functions);
            found.violations.retain(|v| registry.is_enabled(&v.rule_id));
            tracing::trace!(
                detector = detector.name(),
                violations = found.violations.len(),
                warnings = found.warnings.len(),
                "detector finished"
            );
            result.merge(found);
        }

        sort_result(&mut result);
        result
    }
}

/// Sort violations by (line, rule id, message, snippet) and warnings by
/// (line, kind, message).
pub fn sort_result(result: &mut DetectionResult) {
    result.violations.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    result
        .warnings
        .sort_by(|a, b| (a.line, a.kind, &a.message).cmp(&(b.line, b.kind, &b.message)));
}
