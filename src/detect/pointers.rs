//! Pointer indirection detector.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{AnalysisWarning, DetectionResult, Violation, WarningKind};
use crate::analysis::text::visible_chars;
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref TRIPLE_STAR: Regex = Regex::new(r"\*{3,}[A-Za-z_]\w*").unwrap();
    static ref MEMBER_CHAIN: Regex =
        Regex::new(r"[A-Za-z_]\w*(?:\s*(?:->|\.)\s*[A-Za-z_]\w*){3,}").unwrap();
}

/// Flags more than two levels of indirection on a line.
pub struct PointerDepthDetector;

impl Detector for PointerDepthDetector {
    fn name(&self) -> &'static str {
        "pointer-depth"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::POINTER_DEPTH]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for line in lines.iter().filter(|l| !l.is_preprocessor()) {
            let text = line.masked_text.as_str();

            if is_string_heavy(line) {
                if text.contains('*') || text.contains("->") {
                    result.add_warning(AnalysisWarning::new(
                        WarningKind::StringHeavyLine,
                        line.index,
                        "pointer-depth check skipped on a line dominated by literals",
                    ));
                }
                continue;
            }

            let message = if let Some(m) = TRIPLE_STAR.find(text) {
                Some(format!("`{}` dereferences more than two levels", m.as_str()))
            } else {
                MEMBER_CHAIN
                    .find(text)
                    .map(|m| format!("`{}` chains more than two member accesses", m.as_str()))
            };

            if let Some(message) = message {
                result.add_violation(Violation::new(ids::POINTER_DEPTH, line.index, message, line.snippet()));
            }
        }

        result
    }
}

/// More than half of the visible characters are string or char literal content.
fn is_string_heavy(line: &SourceLine) -> bool {
    line.literal_chars > 0 && line.literal_chars * 2 > visible_chars(&line.raw_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scan;

    fn detect(source: &str) -> DetectionResult {
        PointerDepthDetector.detect(&scan(source), &[])
    }

    #[test]
    fn test_triple_pointer() {
        let result = detect("char ***table;\nx = ***p;\ny = **q;\nz = a *** b;\n");
        let lines: Vec<_> = result.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn test_member_chain() {
        let result = detect("v = a->b->c->d;\nw = a->b.c;\nz = cfg.limits.max.value;\n");
        let lines: Vec<_> = result.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![1, 3]);
    }

    #[test]
    fn test_multiplication_and_floats_not_flagged() {
        assert!(detect("area = w * h * d;\nf = 1.5 * 2.25;\n").violations.is_empty());
    }

    #[test]
    fn test_string_heavy_line_skipped_with_warning() {
        let result = detect("x = p->q; puts(\"a->b->c->d and ***ptr everywhere in this text\");\n");
        assert!(result.violations.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].kind, WarningKind::StringHeavyLine);
    }

    #[test]
    fn test_string_heavy_line_without_pointers_is_silent() {
        let result = detect("puts(\"a very long message with no code around it\");\n");
        assert!(result.is_clean());
    }
}
