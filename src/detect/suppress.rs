//! Inline suppression of violations via comments.
//!
//! Supports suppression comments like:
//! - `// powercheck:ignore <rule> - <reason>`
//! - `// powercheck:ignore-next-line <rule> - <reason>`
//! - `/* powercheck:ignore-file <rule> - <reason> */`
//!
//! `<rule>` is a rule id (case-insensitive) or `*` for every rule. A plain
//! `ignore` on a line with code applies to that line; alone on a line it
//! applies to the next one. `ignore-file` is honoured only in the comment
//! block before the first line of code.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::Violation;
use crate::analysis::{SourceLine, FILLER};

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire unit
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule to suppress or "*" for all
    pub rule: String,
    pub reason: String,
    /// Line holding the directive
    pub line: usize,
    pub suppression_type: SuppressionType,
}

impl Suppression {
    /// Check if a violation matches this suppression.
    pub fn matches(&self, violation: &Violation) -> bool {
        if self.rule != "*" && !self.rule.eq_ignore_ascii_case(&violation.rule_id) {
            return false;
        }

        match self.suppression_type {
            SuppressionType::File => true,
            SuppressionType::Line => violation.line == self.line,
            SuppressionType::NextLine => violation.line == self.line + 1,
        }
    }
}

/// A violation that was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedViolation {
    pub violation: Violation,
    pub suppression: Suppression,
}

lazy_static! {
    static ref DIRECTIVE: Regex =
        Regex::new(r"powercheck:(ignore(?:-file|-next-line)?)\s+(\S+)(?:\s+-\s*(.*?))?\s*(?:\*/.*)?$").unwrap();
}

/// Parse suppression directives from scanned lines.
///
/// A directive only counts when it sits inside a comment, so the same text
/// in a string literal is ignored.
pub fn parse_suppressions(lines: &[SourceLine]) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut in_header = true;

    for line in lines {
        let has_code = !line.is_blank();

        if let Some(caps) = DIRECTIVE.captures(&line.raw_text) {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if in_comment(line, start) {
                let rule = caps[2].to_string();
                let reason = caps.get(3).map(|m| m.as_str().trim().to_string()).unwrap_or_default();

                let suppression_type = match &caps[1] {
                    "ignore-file" if in_header && !has_code => Some(SuppressionType::File),
                    "ignore-file" => {
                        tracing::debug!(line = line.index, "ignore-file after code, skipped");
                        None
                    }
                    "ignore-next-line" => Some(SuppressionType::NextLine),
                    _ if has_code => Some(SuppressionType::Line),
                    _ => Some(SuppressionType::NextLine),
                };

                if let Some(suppression_type) = suppression_type {
                    suppressions.push(Suppression {
                        rule,
                        reason,
                        line: line.index,
                        suppression_type,
                    });
                }
            }
        }

        if has_code {
            in_header = false;
        }
    }

    suppressions
}

/// True when byte offset `start` of the raw text falls in masked comment text.
fn in_comment(line: &SourceLine, start: usize) -> bool {
    let column = line.raw_text[..start].chars().count();
    line.masked_text.chars().nth(column) == Some(FILLER) && !inside_literal(line, column)
}

/// True when `column` lies between a pair of quote delimiters in masked text.
fn inside_literal(line: &SourceLine, column: usize) -> bool {
    let quotes = line
        .masked_text
        .chars()
        .take(column)
        .filter(|&c| c == '"')
        .count();
    quotes % 2 == 1
}

/// Separate violations into active and suppressed based on suppressions.
pub fn filter_suppressed(
    violations: Vec<Violation>,
    suppressions: &[Suppression],
) -> (Vec<Violation>, Vec<SuppressedViolation>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for violation in violations {
        match suppressions.iter().find(|s| s.matches(&violation)) {
            Some(suppression) => suppressed.push(SuppressedViolation {
                violation,
                suppression: suppression.clone(),
            }),
            None => active.push(violation),
        }
    }

    (active, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scan;
    use crate::rules::ids;

    #[test]
    fn test_parse_line_and_next_line() {
        let source = "void f(void) {\n    goto out; // powercheck:ignore NASA-GOTO - cleanup path\n    // powercheck:ignore *\n    free(p);\n    /* powercheck:ignore-next-line NASA-DYNAMIC-MEMORY - pool */ g();\n}\n";
        let suppressions = parse_suppressions(&scan(source));
        assert_eq!(suppressions.len(), 3);

        assert_eq!(suppressions[0].suppression_type, SuppressionType::Line);
        assert_eq!(suppressions[0].rule, "NASA-GOTO");
        assert_eq!(suppressions[0].reason, "cleanup path");
        assert_eq!(suppressions[0].line, 2);

        assert_eq!(suppressions[1].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[1].rule, "*");

        assert_eq!(suppressions[2].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[2].reason, "pool");
    }

    #[test]
    fn test_file_suppression_only_in_header() {
        let source = "/* powercheck:ignore-file NASA-DEFINE-CONSTANT - generated */\n#define A 1\n// powercheck:ignore-file NASA-GOTO\n";
        let suppressions = parse_suppressions(&scan(source));
        assert_eq!(suppressions.len(), 1);
        assert_eq!(suppressions[0].suppression_type, SuppressionType::File);
    }

    #[test]
    fn test_directive_in_string_ignored() {
        let source = "puts(\"powercheck:ignore *\");\n";
        assert!(parse_suppressions(&scan(source)).is_empty());
    }

    #[test]
    fn test_matches_and_filter() {
        let goto = Violation::new(ids::GOTO, 5, "use of `goto`", "goto out;");
        let other = Violation::new(ids::DYNAMIC_MEMORY, 5, "call to `free`", "free(p);");

        let next_line = Suppression {
            rule: "nasa-goto".to_string(),
            reason: String::new(),
            line: 4,
            suppression_type: SuppressionType::NextLine,
        };
        assert!(next_line.matches(&goto));
        assert!(!next_line.matches(&other));

        let wildcard = Suppression {
            rule: "*".to_string(),
            reason: String::new(),
            line: 0,
            suppression_type: SuppressionType::File,
        };
        assert!(wildcard.matches(&other));

        let (active, suppressed) = filter_suppressed(vec![goto, other], &[next_line]);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].rule_id, ids::DYNAMIC_MEMORY);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].suppression.line, 4);
    }
}
