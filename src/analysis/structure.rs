//! Function boundary indexing by brace matching.
//!
//! A function is recognized heuristically: a short run of depth-0 lines that
//! reads `<return-type> <name>(<params>)` followed by a `{` that raises the
//! depth from 0 to 1, either at the end of the signature or alone on the next
//! line. The body is then walked character by character on the masked text
//! until the depth returns to zero.

use serde::{Deserialize, Serialize};

use super::text::{is_ident_byte, is_identifier, is_keyword, matching_paren, split_top_level};
use super::SourceLine;
use crate::detect::{AnalysisWarning, WarningKind};

/// Maximum number of lines a signature may span.
pub const MAX_SIGNATURE_LINES: usize = 4;

/// A function definition located in the translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionBoundary {
    pub name: String,
    /// Return type as written, e.g. `static uint16_t` or `void (*)(int)`.
    pub return_type: String,
    /// First line of the signature (1-indexed).
    pub start_line: usize,
    /// Line holding the closing brace, or the last line when unterminated.
    pub end_line: usize,
    pub parameter_count: usize,
    /// Deepest brace nesting inside the body, relative to the body itself.
    pub nesting_max: usize,
    /// Line holding the opening brace.
    pub open_line: usize,
    /// Byte offset of the opening brace within `open_line`'s masked text.
    pub open_offset: usize,
    /// Byte offset of the closing brace within `end_line`'s masked text.
    pub close_offset: Option<usize>,
    /// False when the body never closed before end of input.
    pub well_formed: bool,
}

impl FunctionBoundary {
    /// Whether `line` falls inside this function's line range.
    pub fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }

    /// Masked body text line by line, excluding the braces themselves.
    ///
    /// The first item is whatever follows the opening brace on `open_line`,
    /// the last item stops before the closing brace.
    pub fn body<'a>(&self, lines: &'a [SourceLine]) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let open_line = self.open_line;
        let open_offset = self.open_offset;
        let end_line = self.end_line;
        let close_offset = self.close_offset;

        lines
            .iter()
            .skip(open_line.saturating_sub(1))
            .take(end_line + 1 - open_line)
            .map(move |line| {
                let text = line.masked_text.as_str();
                let end = match close_offset {
                    Some(offset) if line.index == end_line => offset,
                    _ => text.len(),
                };
                let start = if line.index == open_line { open_offset + 1 } else { 0 };
                (line.index, text.get(start..end).unwrap_or(""))
            })
    }

    /// True for plain `void` functions; `void *` and function pointers are not.
    pub fn returns_void(&self) -> bool {
        let mut words = self
            .return_type
            .split_whitespace()
            .filter(|w| !matches!(*w, "static" | "inline" | "extern"));
        words.next() == Some("void") && words.next().is_none()
    }

    /// Trimmed raw text of the signature's first line.
    pub fn signature_snippet(&self, lines: &[SourceLine]) -> String {
        lines
            .get(self.start_line.saturating_sub(1))
            .map(|l| l.snippet())
            .unwrap_or_default()
    }
}

/// Name and parameter list recovered from a header candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Signature {
    name: String,
    return_type: String,
    parameter_count: usize,
}

/// Result of indexing one translation unit.
#[derive(Debug, Clone, Default)]
pub struct StructureIndex {
    pub functions: Vec<FunctionBoundary>,
    pub warnings: Vec<AnalysisWarning>,
}

/// Locate every function definition in the scanned lines.
pub fn index_functions(lines: &[SourceLine]) -> StructureIndex {
    let mut index = StructureIndex::default();
    let mut header: Vec<usize> = Vec::new();
    let mut pos = 0;

    while pos < lines.len() {
        let line = &lines[pos];

        if line.stray_closers > 0 {
            index.warnings.push(AnalysisWarning::new(
                WarningKind::UnbalancedBrace,
                line.index,
                format!("{} closing brace(s) without a matching opener", line.stray_closers),
            ));
        }

        if line.brace_depth > 0 {
            header.clear();
            pos += 1;
            continue;
        }
        if line.is_blank() {
            pos += 1;
            continue;
        }
        if line.is_preprocessor() {
            header.clear();
            pos += 1;
            continue;
        }

        let text = line.masked_text.as_str();
        let Some(brace) = text.find('{') else {
            let code = line.code();
            if code.ends_with(';') || code.ends_with('}') {
                header.clear();
            } else {
                header.push(pos);
                if header.len() > MAX_SIGNATURE_LINES {
                    header.remove(0);
                }
            }
            pos += 1;
            continue;
        };

        // Longest header run first, so a signature split over several lines
        // wins over its last fragment.
        let before_brace = &text[..brace];
        let found = (0..=header.len()).find_map(|k| {
            let mut candidate = header[k..]
                .iter()
                .map(|&i| lines[i].masked_text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            candidate.push(' ');
            candidate.push_str(before_brace);
            parse_signature(&candidate).map(|signature| (header.get(k).copied().unwrap_or(pos), signature))
        });
        header.clear();

        match found {
            Some((start, signature)) => {
                let boundary = close_function(lines, start, pos, brace, signature);
                if !boundary.well_formed {
                    tracing::warn!(function = %boundary.name, line = boundary.start_line, "function body never closes");
                    index.warnings.push(AnalysisWarning::new(
                        WarningKind::UnterminatedFunction,
                        boundary.start_line,
                        format!(
                            "function `{}` has no closing brace before end of input",
                            boundary.name
                        ),
                    ));
                }
                pos = boundary.end_line;
                index.functions.push(boundary);
            }
            None => pos += 1,
        }
    }

    index
}

/// Walk the body from the opening brace until the depth returns to zero.
fn close_function(
    lines: &[SourceLine],
    start: usize,
    open: usize,
    brace: usize,
    signature: Signature,
) -> FunctionBoundary {
    let mut depth = 0usize;
    let mut peak = 0usize;

    for (pos, line) in lines.iter().enumerate().skip(open) {
        let from = if pos == open { brace } else { 0 };
        for (offset, &b) in line.masked_text.as_bytes().iter().enumerate().skip(from) {
            match b {
                b'{' => {
                    depth += 1;
                    peak = peak.max(depth);
                }
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return FunctionBoundary {
                            name: signature.name,
                            return_type: signature.return_type,
                            start_line: start + 1,
                            end_line: pos + 1,
                            parameter_count: signature.parameter_count,
                            nesting_max: peak.saturating_sub(1),
                            open_line: open + 1,
                            open_offset: brace,
                            close_offset: Some(offset),
                            well_formed: true,
                        };
                    }
                }
                _ => {}
            }
        }
    }

    FunctionBoundary {
        name: signature.name,
        return_type: signature.return_type,
        start_line: start + 1,
        end_line: lines.len(),
        parameter_count: signature.parameter_count,
        nesting_max: peak.saturating_sub(1),
        open_line: open + 1,
        open_offset: brace,
        close_offset: None,
        well_formed: false,
    }
}

/// Recognize `<return-type> <name>(<params>)` in a header candidate.
///
/// The parameter list is the last top-level parenthesized group, so leading
/// `__attribute__((...))` groups and functions returning function pointers,
/// `<type> (*<name>(<params>))(<args>)`, are recognized too.
fn parse_signature(candidate: &str) -> Option<Signature> {
    // Only the text after the last statement terminator can be a signature.
    let stripped = strip_attributes(candidate.rsplit(';').next()?);
    let text = stripped.trim();
    if text.is_empty() || text.contains('=') || !text.ends_with(')') {
        return None;
    }

    let close = text.len() - 1;
    let open = opening_paren(text, close)?;
    let head = text[..open].trim_end();

    if head.ends_with(')') {
        return parse_pointer_returning(head, &text[open..]);
    }

    let (name, return_type) = split_name(head)?;
    Some(Signature {
        name: name.to_string(),
        return_type: return_type.to_string(),
        parameter_count: count_parameters(&text[open + 1..close]),
    })
}

/// `<type> (*<name>(<params>))` followed by the pointed-to function's
/// argument list `tail`.
fn parse_pointer_returning(head: &str, tail: &str) -> Option<Signature> {
    let inner_close = head.len() - 1;
    let inner_open = opening_paren(head, inner_close)?;
    let declarator = head[inner_open + 1..inner_close].trim();
    let declarator = declarator.strip_prefix('*')?.trim_start_matches(|c: char| c == '*' || c.is_whitespace());
    if !declarator.ends_with(')') {
        return None;
    }

    let params_close = declarator.len() - 1;
    let params_open = opening_paren(declarator, params_close)?;
    let name = declarator[..params_open].trim_end();
    if !is_identifier(name) || is_keyword(name) {
        return None;
    }

    let pointee = head[..inner_open].trim();
    if !is_return_type(pointee) {
        return None;
    }

    Some(Signature {
        name: name.to_string(),
        return_type: format!("{} (*){}", pointee, tail),
        parameter_count: count_parameters(&declarator[params_open + 1..params_close]),
    })
}

/// Split `<return-type> <name>` into the name and the return type.
fn split_name(head: &str) -> Option<(&str, &str)> {
    let name_start = head
        .bytes()
        .rposition(|b| !is_ident_byte(b))
        .map(|i| i + 1)
        .unwrap_or(0);
    let name = &head[name_start..];
    if !is_identifier(name) || is_keyword(name) {
        return None;
    }

    let return_type = head[..name_start].trim();
    if !is_return_type(return_type) {
        return None;
    }
    Some((name, return_type))
}

/// Remove every `__attribute__((...))` group.
fn strip_attributes(text: &str) -> String {
    let mut out = text.to_string();
    while let Some(at) = out.find("__attribute__") {
        let after = at + "__attribute__".len();
        let open = out[after..].find(|c: char| !c.is_whitespace()).map(|i| after + i);
        let end = match open {
            Some(open) if out.as_bytes()[open] == b'(' => match matching_paren(&out, open) {
                Some(close) => close + 1,
                None => out.len(),
            },
            _ => after,
        };
        out.replace_range(at..end, " ");
    }
    out
}

/// Find the `(` matching the `)` at byte offset `close`.
fn opening_paren(text: &str, close: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(close) != Some(&b')') {
        return None;
    }
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        match bytes[i] {
            b')' => depth += 1,
            b'(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// A return type is one or more identifier tokens, optionally with `*`.
fn is_return_type(text: &str) -> bool {
    if !text.bytes().all(|b| is_ident_byte(b) || b == b'*' || b.is_ascii_whitespace()) {
        return false;
    }
    let mut words = text
        .split(|c: char| c == '*' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|w| is_identifier(w) && !matches!(w, "return" | "else" | "case" | "goto" | "typedef"))
}

/// Count parameters by splitting on top-level commas.
pub fn count_parameters(params: &str) -> usize {
    let trimmed = params.trim();
    if trimmed.is_empty() || trimmed == "void" {
        return 0;
    }
    split_top_level(trimmed, b',')
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .count()
}
