//! Flow-control detectors: non-local jumps and recursion.
//!
//! Recursion is detected by name: a function whose own body contains a call
//! to itself. Cycles through two or more functions of the same unit are only
//! reported as warnings, since name matching cannot tell a real call from a
//! same-named macro or a shadowing declaration.

use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{AnalysisWarning, DetectionResult, Violation, WarningKind};
use crate::analysis::text::call_sites;
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref JUMP: Regex = Regex::new(r"\b(goto|setjmp|longjmp)\b").unwrap();
    static ref INCLUDE: Regex = Regex::new(r"^#\s*include\b").unwrap();
}

/// Flags every `goto`, `setjmp` and `longjmp`, including those in macro
/// bodies. `#include` lines are skipped so `<setjmp.h>` stays clean.
pub struct GotoDetector;

impl Detector for GotoDetector {
    fn name(&self) -> &'static str {
        "goto"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::GOTO]
    }

    fn detect(&self, lines: &[SourceLine], _functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for line in lines.iter().filter(|l| !INCLUDE.is_match(l.code())) {
            for caps in JUMP.captures_iter(&line.masked_text) {
                let keyword = &caps[1];
                result.add_violation(Violation::new(
                    ids::GOTO,
                    line.index,
                    format!("use of `{}`", keyword),
                    line.snippet(),
                ));
            }
        }

        result
    }
}

/// Flags functions that call themselves, and warns about call cycles.
pub struct RecursionDetector;

impl Detector for RecursionDetector {
    fn name(&self) -> &'static str {
        "recursion"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::RECURSION]
    }

    fn detect(&self, lines: &[SourceLine], functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for f in functions {
            let first_call = f
                .body(lines)
                .find(|(_, text)| !call_sites(text, &f.name).is_empty())
                .map(|(index, _)| index);

            if let Some(line) = first_call {
                let snippet = lines.get(line - 1).map(|l| l.snippet()).unwrap_or_default();
                result.add_violation(Violation::new(
                    ids::RECURSION,
                    line,
                    format!("function `{}` calls itself", f.name),
                    snippet,
                ));
            }
        }

        for warning in indirect_cycles(lines, functions) {
            result.add_warning(warning);
        }

        result
    }
}

/// Find cycles through two or more unit-local functions.
fn indirect_cycles(lines: &[SourceLine], functions: &[FunctionBoundary]) -> Vec<AnalysisWarning> {
    let names: BTreeSet<&str> = functions.iter().map(|f| f.name.as_str()).collect();
    let mut first_line: BTreeMap<&str, usize> = BTreeMap::new();
    let mut calls: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for f in functions {
        first_line.entry(f.name.as_str()).or_insert(f.start_line);
        let callees = calls.entry(f.name.as_str()).or_default();
        for (_, text) in f.body(lines) {
            for &callee in &names {
                if callee != f.name && !call_sites(text, callee).is_empty() {
                    callees.insert(callee);
                }
            }
        }
    }

    let reach: BTreeMap<&str, BTreeSet<&str>> =
        names.iter().map(|&name| (name, reachable(name, &calls))).collect();

    let mut cycles: BTreeSet<Vec<&str>> = BTreeSet::new();
    for &name in &names {
        if !reach[name].contains(name) {
            continue;
        }
        let members: Vec<&str> = names
            .iter()
            .copied()
            .filter(|&other| other == name || (reach[name].contains(other) && reach[other].contains(name)))
            .collect();
        if members.len() >= 2 {
            cycles.insert(members);
        }
    }

    cycles
        .into_iter()
        .map(|members| {
            let line = members.iter().filter_map(|m| first_line.get(m)).min().copied().unwrap_or(1);
            AnalysisWarning::new(
                WarningKind::PossibleIndirectRecursion,
                line,
                format!("possible indirect recursion between {}", members.join(", ")),
            )
        })
        .collect()
}

/// Functions reachable from `start` through at least one call, ignoring
/// self-calls.
fn reachable<'a>(start: &'a str, calls: &BTreeMap<&'a str, BTreeSet<&'a str>>) -> BTreeSet<&'a str> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<&str> = calls.get(start).into_iter().flatten().copied().collect();

    while let Some(name) = stack.pop() {
        if seen.insert(name) {
            stack.extend(calls.get(name).into_iter().flatten().copied());
        }
    }

    seen
}
