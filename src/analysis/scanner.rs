//! Line scanner with comment/literal masking and brace-depth tracking.
//!
//! The scanner walks the translation unit once with a small state machine.
//! Comment text (including its `//`, `/*`, `*/` markers) and the contents of
//! string and char literals are replaced by [`FILLER`], one filler per
//! character, so columns in the masked text line up with the raw text. Literal
//! delimiters are kept so detectors can still see that a literal is there.

use serde::{Deserialize, Serialize};

/// Character used to blank out comments and literal contents.
pub const FILLER: char = ' ';

/// One physical line of the translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// Line number (1-indexed).
    pub index: usize,
    /// Original text without the line terminator.
    pub raw_text: String,
    /// Text with comments and literal contents blanked out.
    pub masked_text: String,
    /// Brace depth at the start of the line.
    pub brace_depth: usize,
    /// Brace depth at the end of the line.
    pub end_depth: usize,
    /// Number of characters masked as string or char literal content.
    pub literal_chars: usize,
    /// Closing braces seen while the depth was already zero.
    pub stray_closers: usize,
}

impl SourceLine {
    /// Masked text without surrounding whitespace.
    pub fn code(&self) -> &str {
        self.masked_text.trim()
    }

    /// True when the line has no code (empty, whitespace or comment only).
    pub fn is_blank(&self) -> bool {
        self.code().is_empty()
    }

    /// True for preprocessor directives.
    pub fn is_preprocessor(&self) -> bool {
        self.code().starts_with('#')
    }

    /// Trimmed raw text, used as the snippet attached to violations.
    pub fn snippet(&self) -> String {
        self.raw_text.trim().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Code,
    LineComment,
    BlockComment,
    Str,
    Char,
}

/// Scan a translation unit into masked line records.
///
/// Never fails: unterminated literals end at the line break and unterminated
/// block comments run to the end of the unit. Empty input yields no lines.
pub fn scan(source: &str) -> Vec<SourceLine> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut state = ScanState::Code;
    let mut depth = 0usize;
    let mut lines = Vec::new();

    for (i, raw) in source.lines().enumerate() {
        if state != ScanState::BlockComment {
            state = ScanState::Code;
        }

        let start_depth = depth;
        let mut masked = String::with_capacity(raw.len());
        let mut literal_chars = 0;
        let mut stray_closers = 0;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match state {
                ScanState::Code => match c {
                    '/' if chars.peek() == Some(&'/') => {
                        chars.next();
                        masked.push(FILLER);
                        masked.push(FILLER);
                        state = ScanState::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        masked.push(FILLER);
                        masked.push(FILLER);
                        state = ScanState::BlockComment;
                    }
                    '"' => {
                        masked.push(c);
                        state = ScanState::Str;
                    }
                    '\'' => {
                        masked.push(c);
                        state = ScanState::Char;
                    }
                    '{' => {
                        depth += 1;
                        masked.push(c);
                    }
                    '}' => {
                        if depth == 0 {
                            stray_closers += 1;
                        } else {
                            depth -= 1;
                        }
                        masked.push(c);
                    }
                    _ => masked.push(c),
                },
                ScanState::LineComment => masked.push(FILLER),
                ScanState::BlockComment => {
                    if c == '*' && chars.peek() == Some(&'/') {
                        chars.next();
                        masked.push(FILLER);
                        masked.push(FILLER);
                        state = ScanState::Code;
                    } else {
                        masked.push(FILLER);
                    }
                }
                ScanState::Str | ScanState::Char => {
                    let delimiter = if state == ScanState::Str { '"' } else { '\'' };
                    if c == '\\' {
                        masked.push(FILLER);
                        literal_chars += 1;
                        if chars.next().is_some() {
                            masked.push(FILLER);
                            literal_chars += 1;
                        }
                    } else if c == delimiter {
                        masked.push(c);
                        state = ScanState::Code;
                    } else {
                        masked.push(FILLER);
                        literal_chars += 1;
                    }
                }
            }
        }

        lines.push(SourceLine {
            index: i + 1,
            raw_text: raw.to_string(),
            masked_text: masked,
            brace_depth: start_depth,
            end_depth: depth,
            literal_chars,
            stray_closers,
        });
    }

    lines
}
