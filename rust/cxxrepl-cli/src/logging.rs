//! Diagnostic logging to standard error.

use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive, e.g. `cxxrepl_core=trace`.
pub const LOG_ENV: &str = "CXXREPL_LOG";

/// Filter used when `CXXREPL_LOG` is unset, by `-v` count.
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

/// The directive to install: `env` when it parses, otherwise the default.
fn directive(verbose: u8, env: Option<&str>) -> String {
    match env {
        Some(d) if EnvFilter::try_new(d).is_ok() => d.to_string(),
        _ => default_directive(verbose).to_string(),
    }
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: u8) {
    let env = std::env::var(LOG_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(directive(verbose, env.as_deref())))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
