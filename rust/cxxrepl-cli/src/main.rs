//! cxxrepl — an interactive C++ prompt built on full recompilation.

use std::path::PathBuf;

use clap::{ArgAction, Parser as ClapParser};
use cxxrepl_cli::colors::red;
use cxxrepl_cli::config::{ConfigError, Overrides, ReplConfig, CONFIG_FILE_NAME};
use cxxrepl_cli::{logging, repl};
use cxxrepl_core::Session;

#[derive(ClapParser)]
#[command(name = "cxxrepl", version, about = "An interactive C++ prompt")]
struct Cli {
    /// Submit each line of this file in order instead of prompting
    #[arg()]
    script: Option<PathBuf>,

    /// Configuration file (default: nearest cxxrepl.toml, then ~/.config/cxxrepl/cxxrepl.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Compiler executable
    #[arg(long)]
    compiler: Option<String>,

    /// Directory for the generated source and binary
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Header to include from the start (repeatable)
    #[arg(long = "header", value_name = "NAME")]
    headers: Vec<String>,

    /// Extra compiler argument (repeatable)
    #[arg(long = "flag", value_name = "ARG", allow_hyphen_values = true)]
    flags: Vec<String>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Write a commented cxxrepl.toml into the current directory and exit
    #[arg(long, conflicts_with_all = ["script", "print_config"])]
    init: bool,

    /// More diagnostics on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> Result<ReplConfig, ConfigError> {
    let (_path, mut config) = ReplConfig::load(cli.config.as_deref())?;
    config.apply(&Overrides {
        compiler: cli.compiler.clone(),
        work_dir: cli.work_dir.clone(),
        headers: cli.headers.clone(),
        flags: cli.flags.clone(),
    })?;
    Ok(config)
}

fn cmd_init() {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() {
        eprintln!("{} {} already exists, not overwriting", red("error:"), CONFIG_FILE_NAME);
        std::process::exit(1);
    }
    std::fs::write(&path, ReplConfig::default_template()).unwrap_or_else(|e| {
        eprintln!("{} writing {}: {}", red("error:"), CONFIG_FILE_NAME, e);
        std::process::exit(1);
    });
    println!("Created {}", CONFIG_FILE_NAME);
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.init {
        cmd_init();
        return;
    }

    let config = load_config(&cli).unwrap_or_else(|e| {
        eprintln!("{} {}", red("error:"), e);
        std::process::exit(1);
    });

    if cli.print_config {
        match config.to_toml() {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("{} {}", red("error:"), e);
                std::process::exit(1);
            }
        }
        return;
    }

    // The terminal delivers Ctrl-C to the whole foreground group. The running
    // compiler or program dies and its line is rejected; this process stays
    // alive so the loop continues and the work directory is cleaned up.
    // At the prompt rustyline reads Ctrl-C as a key instead.
    if let Err(e) = ctrlc::set_handler(|| tracing::debug!("interrupt during build")) {
        tracing::warn!(error = %e, "cannot install interrupt handler");
    }

    let mut session = Session::with_headers(config.toolchain(), config.header_directives());
    tracing::debug!(
        compiler = %config.compiler,
        work_dir = %config.resolved_work_dir().display(),
        headers = config.default_headers.len(),
        "session started"
    );

    let result = match &cli.script {
        Some(path) => repl::run_script(
            &mut session,
            path,
            &mut std::io::stdout().lock(),
            &mut std::io::stderr().lock(),
        ),
        None => repl::run_interactive(&mut session).map(|()| true),
    };

    if config.owns_work_dir() {
        let dir = config.resolved_work_dir();
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            tracing::debug!(dir = %dir.display(), error = %e, "work directory not removed");
        }
    }

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", red("error:"), e);
            std::process::exit(1);
        }
    }
}
