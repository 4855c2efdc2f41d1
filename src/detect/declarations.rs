//! Declaration placement detector.
//!
//! Every declaration of a function body must come before its first
//! statement line. Nested blocks do not start over: once the function has
//! executed a statement, any later declaration is flagged, wherever it sits.

use lazy_static::lazy_static;
use regex::Regex;

use super::runner::Detector;
use super::{DetectionResult, Violation};
use crate::analysis::{FunctionBoundary, SourceLine};
use crate::rules::ids;

lazy_static! {
    static ref DECLARATION: Regex = Regex::new(
        r"^(?:(?:static|const|volatile|register|extern|signed|unsigned|short|long)\s+)*(?:int|char|float|double|long|short|unsigned|signed|bool|_Bool|[A-Za-z_]\w*_t|(?:struct|enum|union)\s+[A-Za-z_]\w*)\b[\s*]*(?:const\s+)?(?P<name>[A-Za-z_]\w*)\s*(?:\[[^\]]*\]\s*)*(?:[=;,]|$)"
    )
    .unwrap();
}

/// How a body segment affects declaration placement.
#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    /// Braces, `else`, `do`, a lone `;` or nothing at all.
    Structural,
    Declaration(&'a str),
    Statement,
}

pub struct DeclarationDetector;

impl Detector for DeclarationDetector {
    fn name(&self) -> &'static str {
        "declaration-scope"
    }

    fn rules(&self) -> &'static [&'static str] {
        &[ids::DECLARATION_SCOPE]
    }

    fn detect(&self, lines: &[SourceLine], functions: &[FunctionBoundary]) -> DetectionResult {
        let mut result = DetectionResult::new();

        for f in functions.iter().filter(|f| f.well_formed) {
            let mut statement_seen = false;

            for (index, text) in f.body(lines) {
                let Some(line) = lines.get(index - 1) else { continue };
                if line.is_preprocessor() {
                    continue;
                }

                match classify(text) {
                    LineKind::Structural => {}
                    LineKind::Statement => statement_seen = true,
                    LineKind::Declaration(name) => {
                        if statement_seen {
                            result.add_violation(Violation::new(
                                ids::DECLARATION_SCOPE,
                                index,
                                format!("declaration of `{}` after the first statement in `{}`", name, f.name),
                                line.snippet(),
                            ));
                        }
                    }
                }
            }
        }

        result
    }
}

fn classify(text: &str) -> LineKind<'_> {
    let code = text.trim().trim_start_matches(|c: char| c == '}' || c.is_whitespace());
    let stripped: String = code
        .chars()
        .filter(|c| !matches!(c, '{' | '}' | ';') && !c.is_whitespace())
        .collect();
    if matches!(stripped.as_str(), "" | "else" | "do") {
        return LineKind::Structural;
    }

    match DECLARATION.captures(code).and_then(|caps| caps.name("name")) {
        Some(name) if !matches!(name.as_str(), "return" | "sizeof") => LineKind::Declaration(name.as_str()),
        _ => LineKind::Statement,
    }
}
