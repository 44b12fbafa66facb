//! Configuration file parsing for `cxxrepl.toml`.
//!
//! Searches current directory then ancestors, falling back to
//! `~/.config/cxxrepl/cxxrepl.toml` if no project-level file is found.
//! A file that exists but can't be read or parsed is fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cxxrepl_core::runner::{DEFAULT_COMPILE_TIMEOUT, DEFAULT_RUN_TIMEOUT};
use cxxrepl_core::source::include_directive;
use cxxrepl_core::{ProcessToolchain, DEFAULT_COMPILER};
use serde::{Deserialize, Serialize};

/// File name looked up in the current directory and its ancestors.
pub const CONFIG_FILE_NAME: &str = "cxxrepl.toml";

/// Headers seeded when the configuration doesn't list any. Bare expressions
/// are printed through `std::cout`, so `<iostream>` has to be there.
pub const DEFAULT_HEADERS: &[&str] = &["iostream"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReplConfig {
    /// Compiler executable, invoked as `<compiler> [flags] <src> -o <bin>`.
    #[serde(default = "default_compiler")]
    pub compiler: String,
    /// Extra compiler arguments placed before the source path.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Directory for the generated source and binary. A fresh per-process
    /// directory under the system temp dir when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_dir: Option<PathBuf>,
    /// Header names seeded at startup, each rendered as `#include <name>`.
    #[serde(default = "default_headers")]
    pub default_headers: Vec<String>,
    /// Seconds the compiler may run before it is killed.
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout: u64,
    /// Seconds the compiled program may run before it is killed.
    #[serde(default = "default_run_timeout")]
    pub run_timeout: u64,
}

fn default_compiler() -> String {
    DEFAULT_COMPILER.to_string()
}

fn default_headers() -> Vec<String> {
    DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect()
}

fn default_compile_timeout() -> u64 {
    DEFAULT_COMPILE_TIMEOUT.as_secs()
}

fn default_run_timeout() -> u64 {
    DEFAULT_RUN_TIMEOUT.as_secs()
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            flags: Vec::new(),
            work_dir: None,
            default_headers: default_headers(),
            compile_timeout: default_compile_timeout(),
            run_timeout: default_run_timeout(),
        }
    }
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub compiler: Option<String>,
    pub work_dir: Option<PathBuf>,
    /// Appended to `default_headers`.
    pub headers: Vec<String>,
    /// Appended to `flags`.
    pub flags: Vec<String>,
}

impl ReplConfig {
    /// Load the effective configuration.
    ///
    /// An explicit path must exist. Otherwise the first discovered file is
    /// used, and defaults apply when there is none. Returns the path that was
    /// read, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Option<PathBuf>, Self), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let cwd = std::env::current_dir().ok();
                let home = dirs::home_dir();
                discover(cwd.as_deref(), home.as_deref())
            }
        };

        match path {
            Some(path) => {
                let cfg = Self::load_from(&path)?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                Ok((Some(path), cfg))
            }
            None => {
                tracing::debug!("no configuration file found, using defaults");
                Ok((None, Self::default()))
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a TOML string directly (useful for testing and embedding).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<string>"),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.trim().is_empty() {
            return Err(ConfigError::Invalid("`compiler` must not be empty".into()));
        }
        if self.compile_timeout == 0 || self.run_timeout == 0 {
            return Err(ConfigError::Invalid("timeouts must be at least 1 second".into()));
        }
        if self
            .work_dir
            .as_ref()
            .is_some_and(|dir| dir.as_os_str().is_empty())
        {
            return Err(ConfigError::Invalid("`work_dir` must not be empty".into()));
        }
        if let Some(bad) = self.default_headers.iter().find(|h| h.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "empty entry {bad:?} in `default_headers`"
            )));
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: &Overrides) -> Result<(), ConfigError> {
        if let Some(compiler) = &overrides.compiler {
            self.compiler = compiler.clone();
        }
        if let Some(dir) = &overrides.work_dir {
            self.work_dir = Some(dir.clone());
        }
        self.default_headers.extend(overrides.headers.iter().cloned());
        self.flags.extend(overrides.flags.iter().cloned());
        self.validate()
    }

    /// The configured work directory, or a per-process temp directory.
    pub fn resolved_work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("cxxrepl-{}", std::process::id()))
        })
    }

    /// Whether the work directory belongs to this process alone and can be
    /// removed on exit.
    pub fn owns_work_dir(&self) -> bool {
        self.work_dir.is_none()
    }

    /// `default_headers` as `#include` directives.
    pub fn header_directives(&self) -> Vec<String> {
        self.default_headers
            .iter()
            .map(|name| include_directive(name.trim()))
            .collect()
    }

    pub fn toolchain(&self) -> ProcessToolchain {
        ProcessToolchain::new(&self.resolved_work_dir())
            .with_compiler(self.compiler.clone())
            .with_flags(self.flags.clone())
            .with_timeouts(
                Duration::from_secs(self.compile_timeout),
                Duration::from_secs(self.run_timeout),
            )
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// Generate a default `cxxrepl.toml` template.
    pub fn default_template() -> &'static str {
        r#"# cxxrepl configuration

# Compiler executable, run as: <compiler> [flags] <work_dir>/repl.cpp -o <work_dir>/a.out
compiler = "g++"
# flags = ["-std=c++17", "-O0"]

# Where the generated program lives (default: a fresh directory under /tmp)
# work_dir = "/tmp/cxxrepl"

# Headers included from the start
default_headers = ["iostream"]

# Seconds before a runaway compile or program is killed
compile_timeout = 30
run_timeout = 10
"#
    }
}

/// Find the config file for a session started in `cwd`.
///
/// Rules:
/// - `cxxrepl.toml` in `cwd` or the nearest ancestor that has one.
/// - Otherwise `${HOME}/.config/cxxrepl/cxxrepl.toml` if it exists.
pub fn discover(cwd: Option<&Path>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(cwd) = cwd {
        for dir in cwd.ancestors() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    let global = home?.join(".config").join("cxxrepl").join(CONFIG_FILE_NAME);
    global.is_file().then_some(global)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
