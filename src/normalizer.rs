//! Query normalization.
//!
//! Every pattern match in the extractor runs against a [`NormalizedQuery`],
//! never against the raw text: line comments are gone and whitespace is
//! collapsed, so a clause split over several lines (or interrupted by a
//! trailing `-- comment`) reads as one line.

use std::fmt;

/// SQL text with line comments removed and whitespace collapsed.
///
/// Only [`normalize`] builds one, so the invariants always hold: no `--`
/// marker and no run of two whitespace characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize raw SQL text. Never fails.
///
/// ```
/// use sqlerd::normalize;
///
/// let n = normalize("SELECT *\n  FROM orders -- all of them\n");
/// assert_eq!(n.as_str(), "SELECT * FROM orders ");
/// ```
pub fn normalize(raw: &str) -> NormalizedQuery {
    NormalizedQuery(collapse_whitespace(&strip_line_comments(raw)))
}

/// Drop everything from `--` up to (not including) the next line break.
fn strip_line_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_comment = false;

    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' || c == '\r' {
                in_comment = false;
                out.push(c);
            }
            continue;
        }
        if c == '-' && chars.peek() == Some(&'-') {
            chars.next();
            in_comment = true;
            continue;
        }
        out.push(c);
    }

    out
}

/// Replace each maximal whitespace run with one space. Leading and trailing
/// runs are kept as a single space rather than trimmed.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }

    out
}
