//! Loop-bound detector.
//!
//! A `for` loop is bounded only when its condition clause compares against
//! a numeric literal, or against a name `#define`d to digits on an earlier
//! line, with `<` or `<=`. Constant-true `while` loops and condition-less
//! `for` loops are always flagged.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::text::{parenthesized, split_top_level};
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

/// How many lines a loop header may span.
pub const MAX_HEADER_LINES: usize = 5;

lazy_static! {
    static ref LOOP_HEADER: Regex = Regex::new(r"\b(for|while)\s*\(").unwrap();
    static ref NUMERIC_DEFINE: Regex =
        Regex::new(r"^#\s*define\s+([A-Za-z_]\w*)\s+\(?\s*\d+[uUlL]*\s*\)?\s*$").unwrap();
}

pub struct LoopBoundDetector;

impl Detector for LoopBoundDetector {
    fn name(&self) -> &'static str {
        "loop-bound"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::LOOP_BOUND]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();
        let mut constants: HashSet<String> = HashSet::new();

        for (pos, line) in lines.iter().enumerate() {
            if line.is_preprocessor() {
                if let Some(caps) = NUMERIC_DEFINE.captures(line.code()) {
                    constants.insert(caps[1].to_string());
                }
                continue;
            }

            for caps in LOOP_HEADER.captures_iter(&line.masked_text) {
                let Some(whole) = caps.get(0) else { continue };
                let open = whole.end() - 1;
                let Some(inner) = parenthesized(lines, pos, open, MAX_HEADER_LINES) else {
                    continue;
                };

                let message = match &caps[1] {
                    "while" => constant_true(&inner).then(|| "infinite `while` loop".to_string()),
                    _ => unbounded_for(&inner, &constants),
                };

                if let Some(message) = message {
                    result.add_violation(Violation::new(ids::LOOP_BOUND, line.index, message, line.snippet()));
                }
            }
        }

        result
    }
}

/// `while (1)`, `while (true)` and `while (!0)`, whitespace-insensitive.
fn constant_true(condition: &str) -> bool {
    let compact: String = condition.chars().filter(|c| !c.is_whitespace()).collect();
    matches!(compact.as_str(), "1" | "true" | "TRUE" | "!0" | "(1)")
}

/// Returns a message when the `for` header has no recognizable bound.
fn unbounded_for(header: &str, constants: &HashSet<String>) -> Option<String> {
    let clauses = split_top_level(header, b';');
    if clauses.len() < 2 {
        // Not a classic three-clause header.
        return None;
    }

    let condition = clauses[1].trim();
    if condition.is_empty() {
        return Some("`for` loop without a condition".to_string());
    }

    let bounded = upper_bounds(condition)
        .into_iter()
        .any(|operand| is_numeric(operand) || constants.contains(operand));

    if bounded {
        None
    } else {
        Some(format!("`for` loop condition `{}` has no fixed upper bound", condition))
    }
}

/// Right-hand operands of every `<` and `<=` in the condition.
fn upper_bounds(condition: &str) -> Vec<&str> {
    let bytes = condition.as_bytes();
    let mut operands = Vec::new();

    for (i, &b) in bytes.iter().enumerate() {
        if b != b'<' {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { 0 };
        let next = bytes.get(i + 1).copied().unwrap_or(0);
        if prev == b'<' || next == b'<' {
            continue;
        }

        let skip = if next == b'=' { 2 } else { 1 };
        let rest = condition[i + skip..].trim_start().trim_start_matches('(').trim_start();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if end > 0 {
            operands.push(&rest[..end]);
        }
    }

    operands
}

fn is_numeric(operand: &str) -> bool {
    operand.as_bytes().first().map_or(false, |b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scan;

    fn violations(source: &str) -> Vec<Violation> {
        LoopBoundDetector.detect(&scan(source), &[]).violations
    }

    #[test]
    fn test_literal_bound() {
        assert!(violations("for (i = 0; i < 100; i++) { }").is_empty());
        assert!(violations("for (i = 0; i <= 10u; i++) { }").is_empty());
    }

    #[test]
    fn test_define_bound_must_come_first() {
        assert_eq!(violations("for (i = 0; i < LIMIT; i++) { }").len(), 1);
        assert!(violations("#define LIMIT 64\nfor (i = 0; i < LIMIT; i++) { }").is_empty());
        assert!(violations("#define LIMIT (64U)\nfor (i = 0; i < LIMIT; i++) { }").is_empty());
        assert_eq!(violations("for (i = 0; i < LIMIT; i++) { }\n#define LIMIT 64").len(), 1);
        assert_eq!(violations("#define LIMIT other\nfor (i = 0; i < LIMIT; i++) { }").len(), 1);
    }

    #[test]
    fn test_infinite_loops() {
        assert_eq!(violations("while (1) { }").len(), 1);
        assert_eq!(violations("while(true) { }").len(), 1);
        assert_eq!(violations("while ( ! 0 ) { }").len(), 1);
        assert_eq!(violations("for(;;) { }").len(), 1);
        assert_eq!(violations("for ( ; ; ) { }").len(), 1);
    }

    #[test]
    fn test_bounded_while_not_flagged() {
        assert!(violations("while (count < 10) { }").is_empty());
        assert!(violations("do { } while (x != 0);").is_empty());
    }

    #[test]
    fn test_shift_and_other_comparisons() {
        assert_eq!(violations("for (i = 0; i != (1 << 4); i++) { }").len(), 1);
        assert_eq!(violations("for (i = 10; i > 0; i--) { }").len(), 1);
        assert_eq!(violations("for (p = head; p; p = p->next) { }").len(), 1);
    }

    #[test]
    fn test_multiline_header() {
        let source = "for (i = 0;\n     i < n;\n     i++)\n{\n}\n";
        let found = violations(source);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].line, 1);
    }

    #[test]
    fn test_loops_in_comments_ignored() {
        assert!(violations("/* while (1) */\n// for (;;)\n").is_empty());
    }
}
