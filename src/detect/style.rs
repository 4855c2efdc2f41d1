//! Opt-in style detectors: short identifiers, undocumented functions, void
//! functions without error reporting and native `int` declarations without
//! `<stdint.h>`.
//!
//! These rules are registered disabled and only run when enabled in the
//! configuration.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

/// Lines above a function searched for a header comment.
const HEADER_COMMENT_WINDOW: usize = 3;

/// Lines from the signature searched for a `return` or an error reference.
const ERROR_HANDLING_WINDOW: usize = 20;

lazy_static! {
    static ref SHORT_NAME: Regex = Regex::new(r"\b(?:int|char|float|double)\s+([a-z]{1,2})\b").unwrap();
    static ref NATIVE_INT: Regex = Regex::new(r"\bint\s+[A-Za-z_]\w*").unwrap();
    static ref RETURN: Regex = Regex::new(r"\breturn\b").unwrap();
    static ref STDINT_INCLUDE: Regex = Regex::new(r#"^\s*#\s*include\s*[<"](?:stdint|inttypes)\.h[>"]"#).unwrap();
}

pub struct StyleDetector;

impl Detector for StyleDetector {
    fn name(&self) -> &'static str {
        "style"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::SHORT_IDENTIFIER, ids::HEADER_COMMENT, ids::ERROR_HANDLING, ids::BASIC_TYPES]
    }

    fn detect(&self, lines: &[SourceLine], functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();
        let mut has_stdint = false;

        for line in lines {
            if line.is_preprocessor() {
                has_stdint |= STDINT_INCLUDE.is_match(&line.raw_text);
                continue;
            }
            let text = line.masked_text.as_str();

            if let Some(caps) = SHORT_NAME.captures(text) {
                result.add_violation(Violation::new(
                    ids::SHORT_IDENTIFIER,
                    line.index,
                    format!("variable name `{}` is too short", &caps[1]),
                    line.snippet(),
                ));
            }

            if !has_stdint && NATIVE_INT.is_match(text) {
                result.add_violation(Violation::new(
                    ids::BASIC_TYPES,
                    line.index,
                    "native `int` used without <stdint.h>",
                    line.snippet(),
                ));
            }
        }

        for f in functions {
            if !has_header_comment(lines, f.start_line) {
                result.add_violation(Violation::new(
                    ids::HEADER_COMMENT,
                    f.start_line,
                    format!("function `{}` has no header comment", f.name),
                    f.signature_snippet(lines),
                ));
            }

            if f.returns_void() && !reports_errors(f, lines) {
                result.add_violation(Violation::new(
                    ids::ERROR_HANDLING,
                    f.start_line,
                    format!("void function `{}` has no apparent error handling", f.name),
                    f.signature_snippet(lines),
                ));
            }
        }

        result
    }
}

/// True when one of the lines just above `start_line` holds a comment.
fn has_header_comment(lines: &[SourceLine], start_line: usize) -> bool {
    let end = start_line.saturating_sub(1);
    let begin = end.saturating_sub(HEADER_COMMENT_WINDOW);
    lines[begin..end.min(lines.len())]
        .iter()
        .any(|l| l.is_blank() && !l.raw_text.trim().is_empty())
}

/// True when the start of the body returns or mentions an error.
fn reports_errors(f: &FunctionBoundary, lines: &[SourceLine]) -> bool {
    f.body(lines)
        .take_while(|(index, _)| *index < f.start_line + ERROR_HANDLING_WINDOW)
        .any(|(_, text)| RETURN.is_match(text) || text.to_ascii_lowercase().contains("error"))
}
