//! Source accumulation: turning committed lines into a compilable program.
//!
//! Lines starting with [`DIRECTIVE_MARKER`] are preprocessor directives and
//! go above the entry point. Everything else goes inside `main()`, where a
//! line without a trailing [`STATEMENT_TERMINATOR`] is treated as a bare
//! expression and wrapped so its value is printed.

use std::fmt::Write;

/// First character that routes a line to the header set.
pub const DIRECTIVE_MARKER: char = '#';

/// Last character that marks a line as a full statement.
pub const STATEMENT_TERMINATOR: char = ';';

const INDENT: &str = "    ";

/// Where a non-empty input line belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Body,
}

/// Classify a raw input line. Returns `None` for the empty line.
#[must_use]
pub fn classify(line: &str) -> Option<LineKind> {
    match line.chars().next() {
        None => None,
        Some(DIRECTIVE_MARKER) => Some(LineKind::Header),
        Some(_) => Some(LineKind::Body),
    }
}

/// Whether a body entry needs the printing wrapper.
#[must_use]
pub fn is_bare_expression(entry: &str) -> bool {
    !entry.trim_end().ends_with(STATEMENT_TERMINATOR)
}

/// Render `#include <name>` for a header named in configuration.
#[must_use]
pub fn include_directive(name: &str) -> String {
    format!("{DIRECTIVE_MARKER}include <{name}>")
}

/// Render a complete program from header directives and body entries.
///
/// Pure: identical inputs always produce identical text.
#[must_use]
pub fn render(headers: &[String], body: &[String]) -> String {
    let mut src = String::new();
    for header in headers {
        src.push_str(header);
        src.push('\n');
    }
    if !headers.is_empty() {
        src.push('\n');
    }

    src.push_str("int main()\n{\n");
    for (i, entry) in body.iter().enumerate() {
        if i > 0 {
            src.push('\n');
        }
        src.push_str(INDENT);
        if is_bare_expression(entry) {
            let _ = write!(src, "std::cout << ({entry}) << std::endl;");
        } else {
            src.push_str(entry);
        }
    }
    src.push_str("\n}");
    src
}

/// An immutable snapshot of the accumulated program.
///
/// The session keeps one as its baseline and derives a candidate from it for
/// each attempt with [`SourceState::with_line`]; the baseline itself is never
/// touched until the candidate has been built and run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceState {
    headers: Vec<String>,
    body: Vec<String>,
}

impl SourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-seeded set of header directives.
    pub fn with_headers(headers: Vec<String>) -> Self {
        Self {
            headers,
            body: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Copy this state and append one line to the side its first character
    /// selects. Returns `None` for the empty line.
    #[must_use]
    pub fn with_line(&self, line: &str) -> Option<(SourceState, LineKind)> {
        let kind = classify(line)?;
        let mut next = self.clone();
        match kind {
            LineKind::Header => next.headers.push(line.to_string()),
            LineKind::Body => next.body.push(line.to_string()),
        }
        Some((next, kind))
    }

    pub fn render(&self) -> String {
        render(&self.headers, &self.body)
    }
}
