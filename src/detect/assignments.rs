//! Assignment detectors: assignments inside controlling expressions and
//! statement lines that assign more than once.

use lazy_static::lazy_static;
use regex::Regex;

use super::loops::MAX_HEADER_LINES;
use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::text::{assignment_positions, matching_paren, parenthesized, split_top_level};
use crate::analysis::{FunctionBoundary, SourceLine, FILLER};
use crate::rules::ids;

lazy_static! {
    static ref CONTROL_HEADER: Regex = Regex::new(r"\b(if|while|for)\s*\(").unwrap();
    static ref FOR_HEADER: Regex = Regex::new(r"\bfor\s*\(").unwrap();
}

pub struct AssignmentDetector;

impl Detector for AssignmentDetector {
    fn name(&self) -> &'static str {
        "assignments"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::ASSIGN_IN_CONDITION, ids::CHAINED_ASSIGNMENT]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for (pos, line) in lines.iter().enumerate() {
            if line.is_preprocessor() {
                continue;
            }

            for keyword in assigning_conditions(lines, pos) {
                result.add_violation(Violation::new(
                    ids::ASSIGN_IN_CONDITION,
                    line.index,
                    format!("assignment inside `{}` condition", keyword),
                    line.snippet(),
                ));
            }

            if has_chained_assignment(&line.masked_text) {
                result.add_violation(Violation::new(
                    ids::CHAINED_ASSIGNMENT,
                    line.index,
                    "more than one assignment on a single statement line",
                    line.snippet(),
                ));
            }
        }

        result
    }
}

/// Keywords on line `pos` whose controlling expression assigns.
///
/// For `for` headers only the condition clause counts; the init and step
/// clauses are expected to assign.
fn assigning_conditions(lines: &[SourceLine], pos: usize) -> Vec<&'static str> {
    let text = lines[pos].masked_text.as_str();
    let mut found = Vec::new();

    for caps in CONTROL_HEADER.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(inner) = parenthesized(lines, pos, whole.end() - 1, MAX_HEADER_LINES) else {
            continue;
        };

        let (keyword, condition) = match &caps[1] {
            "if" => ("if", inner.as_str()),
            "while" => ("while", inner.as_str()),
            _ => match split_top_level(&inner, b';').get(1) {
                Some(clause) => ("for", *clause),
                None => continue,
            },
        };

        if !assignment_positions(condition).is_empty() {
            found.push(keyword);
        }
    }

    found
}

/// True when the line, outside `for (...)` headers, holds two or more
/// assignment operators.
fn has_chained_assignment(masked: &str) -> bool {
    assignment_positions(&blank_for_headers(masked)).len() >= 2
}

/// Replace every `for (...)` header with filler.
fn blank_for_headers(masked: &str) -> String {
    let mut bytes: Vec<u8> = masked.as_bytes().to_vec();

    for m in FOR_HEADER.find_iter(masked) {
        let open = m.end() - 1;
        let close = matching_paren(masked, open).unwrap_or(masked.len() - 1);
        for b in &mut bytes[m.start()..=close] {
            *b = FILLER as u8;
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
