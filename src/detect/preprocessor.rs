//! `#define` detector.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref DEFINE: Regex = Regex::new(r"^#\s*define\s+([A-Za-z_]\w*)(\()?(.*)$").unwrap();
}

/// Flags object-like macros with a value and every function-like macro.
pub struct PreprocessorDetector;

impl Detector for PreprocessorDetector {
    fn name(&self) -> &'static str {
        "preprocessor"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::DEFINE_CONSTANT, ids::FUNCTION_MACRO]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for line in lines.iter().filter(|l| l.is_preprocessor()) {
            let Some(caps) = DEFINE.captures(line.code()) else { continue };
            let name = &caps[1];

            if caps.get(2).is_some() {
                result.add_violation(Violation::new(
                    ids::FUNCTION_MACRO,
                    line.index,
                    format!("function-like macro `{}`", name),
                    line.snippet(),
                ));
            } else if !caps[3].trim().is_empty() {
                result.add_violation(Violation::new(
                    ids::DEFINE_CONSTANT,
                    line.index,
                    format!("macro constant `{}`", name),
                    line.snippet(),
                ));
            }
        }

        result
    }
}
