//! Per-function complexity metrics and unit-level annotations.
//!
//! Cyclomatic complexity is estimated as:
//! - Start at 1
//! - Add 1 for each: if, for, while, case, &&, ||
//!
//! `else if` is counted once, through its `if`.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FunctionBoundary, SourceLine};

lazy_static! {
    static ref DECISION_POINT: Regex = Regex::new(r"\b(?:if|for|while|case)\b|&&|\|\|").unwrap();
    static ref VARIABLE_DECL: Regex =
        Regex::new(r"\b(?:int|char|float|double|long|short|unsigned|signed)\s+\w+").unwrap();
    static ref POINTER_USE: Regex = Regex::new(r"\*+\w+|\w+\s*\*+\s*\w+").unwrap();
    static ref LOOP_KEYWORD: Regex = Regex::new(r"\b(?:for|while|do)\b").unwrap();
    static ref CONDITIONAL_KEYWORD: Regex = Regex::new(r"\b(?:if|else|switch|case)\b").unwrap();
}

/// Structural metrics for one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityMetrics {
    pub function_name: String,
    pub start_line: usize,
    pub cyclomatic_estimate: usize,
    pub nesting_depth: usize,
    pub line_count: usize,
    pub parameter_count: usize,
}

/// Whole-unit annotations, shaped for the training-record schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSummary {
    pub function_count: usize,
    pub line_count: usize,
    pub complexity_score: usize,
    pub nesting_depth: usize,
    pub variable_count: usize,
    pub pointer_count: usize,
    pub loop_count: usize,
    pub conditional_count: usize,
}

/// Count decision points in a piece of masked text.
pub fn decision_points(text: &str) -> usize {
    DECISION_POINT.find_iter(text).count()
}

/// Compute metrics for each function, in boundary order.
pub fn analyze_functions(lines: &[SourceLine], functions: &[FunctionBoundary]) -> Vec<ComplexityMetrics> {
    functions
        .iter()
        .map(|f| {
            let decisions: usize = f.body(lines).map(|(_, text)| decision_points(text)).sum();
            ComplexityMetrics {
                function_name: f.name.clone(),
                start_line: f.start_line,
                cyclomatic_estimate: 1 + decisions,
                nesting_depth: f.nesting_max,
                line_count: f.end_line - f.start_line,
                parameter_count: f.parameter_count,
            }
        })
        .collect()
}

/// Compute unit-level annotations over every masked line.
pub fn summarize(lines: &[SourceLine], functions: &[FunctionBoundary]) -> UnitSummary {
    let mut summary = UnitSummary {
        function_count: functions.len(),
        line_count: lines.len(),
        complexity_score: 1,
        ..Default::default()
    };

    for line in lines {
        let text = line.masked_text.as_str();
        summary.complexity_score += decision_points(text);
        summary.nesting_depth = summary.nesting_depth.max(peak_depth(line));

        if line.is_preprocessor() {
            continue;
        }
        summary.variable_count += VARIABLE_DECL.find_iter(text).count();
        summary.pointer_count += POINTER_USE.find_iter(text).count();
        summary.loop_count += LOOP_KEYWORD.find_iter(text).count();
        summary.conditional_count += CONDITIONAL_KEYWORD.find_iter(text).count();
    }

    summary
}

/// Highest brace depth reached anywhere on the line.
fn peak_depth(line: &SourceLine) -> usize {
    let mut depth = line.brace_depth;
    let mut peak = depth;
    for b in line.masked_text.bytes() {
        match b {
            b'{' => {
                depth += 1;
                peak = peak.max(depth);
            }
            b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    peak
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{index_functions, scan};

    #[test]
    fn test_cyclomatic_estimate() {
        let source = r#"int classify(int x) {
    if (x < 0 && x > -10) {
        return -1;
    } else if (x == 0 || x == 1) {
        return 0;
    }
    for (int i = 0; i < 3; i++) { }
    while (x > 5) { x--; }
    switch (x) {
    case 1: break;
    case 2: break;
    }
    return 1;
}
"#;
        let lines = scan(source);
        let index = index_functions(&lines);
        let metrics = analyze_functions(&lines, &index.functions);
        assert_eq!(metrics.len(), 1);
        // if, &&, else if, ||, for, while, case, case
        assert_eq!(metrics[0].cyclomatic_estimate, 9);
        assert_eq!(metrics[0].line_count, 13);
        assert_eq!(metrics[0].nesting_depth, 1);
        assert_eq!(metrics[0].parameter_count, 1);
    }

    #[test]
    fn test_keywords_in_comments_and_strings_ignored() {
        let source = "void f(void) {\n    // if while for\n    puts(\"if && ||\");\n}\n";
        let lines = scan(source);
        let index = index_functions(&lines);
        let metrics = analyze_functions(&lines, &index.functions);
        assert_eq!(metrics[0].cyclomatic_estimate, 1);
    }

    #[test]
    fn test_empty_function_list() {
        assert!(analyze_functions(&[], &[]).is_empty());
    }

    #[test]
    fn test_unit_summary() {
        let source = "#include <stdint.h>\n\nint main(void) {\n    int count = 0;\n    while (count < 10) {\n        if (count == 5) { break; }\n        count++;\n    }\n    return count;\n}\n";
        let lines = scan(source);
        let index = index_functions(&lines);
        let summary = summarize(&lines, &index.functions);
        assert_eq!(summary.function_count, 1);
        assert_eq!(summary.line_count, 10);
        assert_eq!(summary.loop_count, 1);
        assert_eq!(summary.conditional_count, 1);
        assert_eq!(summary.variable_count, 2);
        assert_eq!(summary.nesting_depth, 3);
        assert_eq!(summary.complexity_score, 3);
    }
}
