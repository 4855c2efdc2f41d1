//! Dynamic memory detector.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::text::is_member_access;
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref ALLOCATOR_CALL: Regex = Regex::new(r"\b(malloc|calloc|realloc|free)\s*\(").unwrap();
}

/// Flags calls to the heap allocator.
pub struct MemoryDetector;

impl Detector for MemoryDetector {
    fn name(&self) -> &'static str {
        "dynamic-memory"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::DYNAMIC_MEMORY]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for line in lines {
            let text = line.masked_text.as_str();
            for caps in ALLOCATOR_CALL.captures_iter(text) {
                let Some(name) = caps.get(1) else { continue };
                if is_member_access(text, name.start()) {
                    continue;
                }
                result.add_violation(Violation::new(
                    ids::DYNAMIC_MEMORY,
                    line.index,
                    format!("call to `{}`", name.as_str()),
                    line.snippet(),
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scan;

    #[test]
    fn test_allocator_calls() {
        let source = "void f(void) {\n    char *p = malloc(16);\n    p = realloc(p, 32);\n    free(p);\n}\n";
        let result = MemoryDetector.detect(&scan(source), &[]);
        let lines: Vec<_> = result.violations.iter().map(|v| v.line).collect();
        assert_eq!(lines, vec![2, 3, 4]);
        assert_eq!(result.violations[0].message, "call to `malloc`");
    }

    #[test]
    fn test_non_calls_ignored() {
        let source = "int free_slots = 0;\nsize_t mallocs;\npool->free(p);\nputs(\"malloc(1)\");\n// free(p);\n";
        assert!(MemoryDetector.detect(&scan(source), &[]).violations.is_empty());
    }
}
