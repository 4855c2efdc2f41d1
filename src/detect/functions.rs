//! Function-level detectors: parameter count, exit points and length.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::{Detector, DetectorLimits};
use super::{DetectionResult, Violation};
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref RETURN: Regex = Regex::new(r"\breturn\b").unwrap();
}

pub struct FunctionDetector {
    limits: DetectorLimits,
}

impl FunctionDetector {
    pub fn new(limits: DetectorLimits) -> Self {
        Self { limits }
    }
}

impl Detector for FunctionDetector {
    fn name(&self) -> &'static str {
        "functions"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::PARAMETER_COUNT, ids::SINGLE_EXIT, ids::FUNCTION_LENGTH]
    }

    fn detect(&self, lines: &[SourceLine], functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for f in functions {
            let snippet = f.signature_snippet(lines);

            if f.parameter_count > self.limits.max_parameters {
                result.add_violation(Violation::new(
                    ids::PARAMETER_COUNT,
                    f.start_line,
                    format!(
                        "function `{}` has {} parameters (limit {})",
                        f.name, f.parameter_count, self.limits.max_parameters
                    ),
                    snippet.clone(),
                ));
            }

            let returns: usize = f.body(lines).map(|(_, text)| RETURN.find_iter(text).count()).sum();
            if returns > 1 {
                result.add_violation(Violation::new(
                    ids::SINGLE_EXIT,
                    f.start_line,
                    format!("function `{}` has {} return statements", f.name, returns),
                    snippet.clone(),
                ));
            }

            let length = f.end_line - f.start_line;
            if length > self.limits.max_function_lines {
                result.add_violation(Violation::new(
                    ids::FUNCTION_LENGTH,
                    f.start_line,
                    format!(
                        "function `{}` spans {} lines (limit {})",
                        f.name, length, self.limits.max_function_lines
                    ),
                    snippet,
                ));
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{index_functions, scan};

    fn detect(source: &str, limits: DetectorLimits) -> Vec<Violation> {
        let lines = scan(source);
        let index = index_functions(&lines);
        FunctionDetector::new(limits).detect(&lines, &index.functions).violations
    }

    #[test]
    fn test_parameter_limit() {
        let found = detect("int add3(int a, int b, int c) {\n    return a + b + c;\n}\n", DetectorLimits::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, ids::PARAMETER_COUNT);
        assert_eq!(found[0].message, "function `add3` has 3 parameters (limit 2)");

        let relaxed = DetectorLimits {
            max_parameters: 4,
            ..Default::default()
        };
        assert!(detect("int add3(int a, int b, int c) {\n    return a;\n}\n", relaxed).is_empty());
    }

    #[test]
    fn test_multiple_returns() {
        let source = "int sign(int x) {\n    if (x < 0) {\n        return -1;\n    }\n    return 1;\n}\n";
        let found = detect(source, DetectorLimits::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, ids::SINGLE_EXIT);
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn test_return_in_comment_or_identifier_not_counted() {
        let source = "int f(void) {\n    int return_code = 0; // return early\n    return return_code;\n}\n";
        assert!(detect(source, DetectorLimits::default()).is_empty());
    }

    #[test]
    fn test_function_length() {
        let body: String = (0..60).map(|i| format!("    x += {};\n", i)).collect();
        let source = format!("void long_one(void) {{\n{}}}\n", body);
        let found = detect(&source, DetectorLimits::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rule_id, ids::FUNCTION_LENGTH);
        assert!(found[0].message.contains("61 lines"));
    }
}
