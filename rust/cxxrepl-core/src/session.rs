//! REPL session: try each line on a copy, commit only what builds and runs.

use crate::error::BuildError;
use crate::reduce::reduce;
use crate::runner::Toolchain;
use crate::source::SourceState;

/// Accumulated state for one interactive session.
///
/// `baseline` and `shown` are the last known-good program and how much of
/// its output the user has seen. They change only in [`Session::submit`]
/// after a candidate has compiled and exited successfully.
#[derive(Debug)]
pub struct Session<T> {
    toolchain: T,
    initial: SourceState,
    baseline: SourceState,
    shown: usize,
    history: Vec<String>,
}

impl<T: Toolchain> Session<T> {
    pub fn new(toolchain: T) -> Self {
        Self::with_headers(toolchain, Vec::new())
    }

    /// Start with `headers` (full directive lines) already in place.
    pub fn with_headers(toolchain: T, headers: Vec<String>) -> Self {
        let initial = SourceState::with_headers(headers);
        Self {
            toolchain,
            baseline: initial.clone(),
            initial,
            shown: 0,
            history: Vec::new(),
        }
    }

    /// Evaluate one input line.
    ///
    /// Returns the output lines this line caused that haven't been shown
    /// before. On error the session is exactly as it was before the call,
    /// apart from the line being recorded in the history.
    pub fn submit(&mut self, line: &str) -> Result<String, BuildError> {
        if line.is_empty() {
            return Ok(String::new());
        }
        self.history.push(line.to_string());

        let Some((candidate, kind)) = self.baseline.with_line(line) else {
            return Ok(String::new());
        };
        let source = candidate.render();
        tracing::debug!(?kind, line, "building candidate");

        let output = match self.toolchain.build(&source) {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(error = %e, "candidate rejected");
                return Err(e);
            }
        };

        let delta = reduce(&output, self.shown);
        self.baseline = candidate;
        self.shown = delta.shown;
        tracing::debug!(
            headers = self.baseline.headers().len(),
            body = self.baseline.body().len(),
            shown = self.shown,
            "candidate committed"
        );
        Ok(delta.text)
    }

    /// Drop every committed line and return to the startup headers.
    ///
    /// History is kept so earlier lines can still be recalled.
    pub fn reset(&mut self) {
        self.baseline = self.initial.clone();
        self.shown = 0;
    }

    pub fn headers(&self) -> &[String] {
        self.baseline.headers()
    }

    pub fn body(&self) -> &[String] {
        self.baseline.body()
    }

    /// Non-blank output lines already shown to the user.
    pub fn shown_lines(&self) -> usize {
        self.shown
    }

    /// Every non-empty line submitted, committed or not, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// The line submitted at `index` (0-based).
    pub fn recall(&self, index: usize) -> Option<&str> {
        self.history.get(index).map(String::as_str)
    }

    /// The rendered baseline program.
    pub fn source(&self) -> String {
        self.baseline.render()
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }
}
