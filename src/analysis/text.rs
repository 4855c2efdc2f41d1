//! Small byte-level helpers shared by the indexer and the detectors.
//!
//! All helpers operate on masked text, so every structural character they
//! look at is ASCII and byte offsets are always valid char boundaries.

use super::SourceLine;

/// Returns true for characters that can appear in a C identifier.
pub fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Returns true if `s` is a non-empty C identifier.
pub fn is_identifier(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => bytes.iter().all(|b| is_ident_byte(*b)),
        _ => false,
    }
}

/// C keywords that can never name a function.
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "if" | "else"
            | "while"
            | "for"
            | "do"
            | "switch"
            | "case"
            | "default"
            | "return"
            | "goto"
            | "break"
            | "continue"
            | "sizeof"
            | "typedef"
            | "struct"
            | "union"
            | "enum"
            | "defined"
    )
}

/// Find the `)` matching the `(` at byte offset `open`.
pub fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
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

/// Split `text` on `sep` wherever it is not nested inside `()`, `[]` or `{}`.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ if b == sep && depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte offsets of every assignment operator in `text`.
///
/// A `=` counts unless it belongs to `==`, `!=`, `<=` or `>=`. Compound
/// assignments (`+=`, `<<=`, ...) count as assignments.
pub fn assignment_positions(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut positions = Vec::new();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { 0 };
        let next = bytes.get(i + 1).copied().unwrap_or(0);
        if next == b'=' || prev == b'=' || prev == b'!' {
            continue;
        }
        if prev == b'<' || prev == b'>' {
            // `<<=` and `>>=` are assignments, `<=` and `>=` are comparisons.
            let prev2 = if i > 1 { bytes[i - 2] } else { 0 };
            if prev2 != prev {
                continue;
            }
        }
        positions.push(i);
    }
    positions
}

/// Returns true when the match starting at `start` is preceded by `.` or `->`.
pub fn is_member_access(text: &str, start: usize) -> bool {
    let before = text[..start].trim_end();
    before.ends_with('.') || before.ends_with("->")
}

/// Byte offsets of every `name(` call site in `text`.
///
/// Matches are whole words followed by optional whitespace and `(`; member
/// calls such as `obj.name(` or `obj->name(` are skipped.
pub fn call_sites(text: &str, name: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    text.match_indices(name)
        .map(|(i, _)| i)
        .filter(|&i| {
            let end = i + name.len();
            let bounded_left = i == 0 || !is_ident_byte(bytes[i - 1]);
            let bounded_right = bytes.get(end).map_or(true, |b| !is_ident_byte(*b));
            bounded_left
                && bounded_right
                && text[end..].trim_start().starts_with('(')
                && !is_member_access(text, i)
        })
        .collect()
}

/// Number of non-whitespace characters in `text`.
pub fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Collect the text enclosed by the `(` at `open` on line `start`, following
/// the expression across at most `max_lines` lines.
///
/// Returns the inner text (without the outer parentheses) with line breaks
/// replaced by a single space, or `None` if the parenthesis does not close in
/// time.
pub fn parenthesized(lines: &[SourceLine], start: usize, open: usize, max_lines: usize) -> Option<String> {
    let mut inner: Vec<u8> = Vec::new();
    let mut depth = 0usize;
    for (n, line) in lines.iter().skip(start).take(max_lines).enumerate() {
        let from = if n == 0 { open } else { 0 };
        if n > 0 {
            inner.push(b' ');
        }
        for &b in line.masked_text.as_bytes().iter().skip(from) {
            match b {
                b'(' => {
                    depth += 1;
                    if depth == 1 {
                        continue;
                    }
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(String::from_utf8_lossy(&inner).into_owned());
                    }
                }
                _ => {}
            }
            if depth > 0 {
                inner.push(b);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_top_level_respects_nesting() {
        assert_eq!(split_top_level("int a, int b", b','), vec!["int a", " int b"]);
        assert_eq!(
            split_top_level("void (*cb)(int, int), int x", b',').len(),
            2
        );
        assert_eq!(split_top_level("i = 0; i < 10; i++", b';').len(), 3);
    }

    #[test]
    fn test_assignment_positions() {
        assert_eq!(assignment_positions("a = b = c = 0").len(), 3);
        assert!(assignment_positions("a == b && c != d && e <= f && g >= h").is_empty());
        assert_eq!(assignment_positions("x += 1").len(), 1);
        assert_eq!(assignment_positions("x <<= 1").len(), 1);
        assert_eq!(assignment_positions("(ch = getchar()) != EOF").len(), 1);
    }

    #[test]
    fn test_matching_paren() {
        let text = "f(a, (b), c) + 1";
        assert_eq!(matching_paren(text, 1), Some(11));
        assert_eq!(matching_paren("f(a", 1), None);
    }

    #[test]
    fn test_identifier_helpers() {
        assert!(is_identifier("calculate_sum"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier(""));
        assert!(is_keyword("while"));
        assert!(!is_keyword("main"));
    }

    #[test]
    fn test_call_sites() {
        assert_eq!(call_sites("return n*fact(n-1);", "fact"), vec![9]);
        assert_eq!(call_sites("x = fact (2) + fact(3)", "fact").len(), 2);
        assert!(call_sites("factorial(3); fact_table[1]", "fact").is_empty());
        assert!(call_sites("s->fact(1); s.fact(2)", "fact").is_empty());
        assert!(call_sites("int fact;", "fact").is_empty());
    }

    #[test]
    fn test_is_member_access() {
        assert!(is_member_access("obj.fact(1)", 4));
        assert!(is_member_access("obj -> fact(1)", 7));
        assert!(!is_member_access("x = fact(1)", 4));
    }
}
