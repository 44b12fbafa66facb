//! Per-step failure taxonomy.

use std::fmt;
use std::time::Duration;

/// The child process a failure or timeout belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => write!(f, "compilation"),
            Stage::Execute => write!(f, "execution"),
        }
    }
}

/// Why a candidate program was rejected.
///
/// Every variant is recoverable: the session reports it and keeps its
/// baseline untouched.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Workspace or process plumbing failed before a verdict was reached.
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler exited non-zero.
    #[error("compile failed: {stderr}")]
    Compile { stderr: String },

    /// The program compiled but exited non-zero (or was killed by a signal).
    #[error("execution failed: {stderr}")]
    Exec { code: Option<i32>, stderr: String },

    /// A child process outlived its configured limit and was killed.
    #[error("{stage} timed out after {}s", .limit.as_secs_f64())]
    Timeout { stage: Stage, limit: Duration },
}

impl BuildError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BuildError::Io {
            context: context.into(),
            source,
        }
    }

    /// The diagnostic text captured from the failing process, if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            BuildError::Compile { stderr } | BuildError::Exec { stderr, .. } => Some(stderr),
            BuildError::Io { .. } | BuildError::Timeout { .. } => None,
        }
    }
}
