//! Interactive and scripted front ends over a [`Session`].

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cxxrepl_core::{Session, Toolchain};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::colors::{bold, cyan, gray, red};
use crate::commands::{help_text, parse_repl_command, ParsedCommand, ReplCommand};

const PROMPT: &str = ">>> ";

#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error("line editor failed: {0}")]
    Readline(#[from] ReadlineError),

    #[error("cannot read script '{}': {source}", .path.display())]
    Script {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What became of one line of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected,
    Quit,
}

/// Dispatch one non-blank line: run it as a meta-command or submit it to the
/// session. New program output goes to `out`, diagnostics to `err`.
pub fn handle_line<T: Toolchain>(
    session: &mut Session<T>,
    line: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<Outcome> {
    match parse_repl_command(line) {
        ParsedCommand::NotACommand => submit(session, line, out, err),
        ParsedCommand::UnknownCommand(name) => {
            writeln!(
                err,
                "{} unknown command `{}`. Type :help for usage.",
                red("error:"),
                name
            )?;
            Ok(Outcome::Rejected)
        }
        ParsedCommand::InvalidUsage(usage) => {
            writeln!(err, "{} {}", red("error:"), usage)?;
            Ok(Outcome::Rejected)
        }
        ParsedCommand::Command(cmd) => run_command(session, cmd, out, err),
    }
}

fn run_command<T: Toolchain>(
    session: &mut Session<T>,
    cmd: ReplCommand,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<Outcome> {
    match cmd {
        ReplCommand::Quit => return Ok(Outcome::Quit),
        ReplCommand::Help => write!(out, "{}", help_text())?,
        ReplCommand::Reset => {
            session.reset();
            writeln!(out, "{}", gray("Session state reset."))?;
        }
        ReplCommand::History => {
            for (i, entry) in session.history().iter().enumerate() {
                writeln!(out, "{} {}", gray(&format!("{:>4}", i + 1)), entry)?;
            }
        }
        ReplCommand::Source => writeln!(out, "{}", session.source())?,
        ReplCommand::Recall(n) => {
            let Some(line) = session.recall(n - 1).map(str::to_string) else {
                writeln!(
                    err,
                    "{} no line {} in history ({} entries)",
                    red("error:"),
                    n,
                    session.history().len()
                )?;
                return Ok(Outcome::Rejected);
            };
            writeln!(out, "{}", gray(&line))?;
            return submit(session, &line, out, err);
        }
    }
    Ok(Outcome::Accepted)
}

fn submit<T: Toolchain>(
    session: &mut Session<T>,
    line: &str,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<Outcome> {
    match session.submit(line) {
        Ok(delta) => {
            if !delta.is_empty() {
                writeln!(out, "{delta}")?;
            }
            Ok(Outcome::Accepted)
        }
        Err(e) => {
            writeln!(err, "{} {}", red("error:"), e.to_string().trim_end())?;
            Ok(Outcome::Rejected)
        }
    }
}

/// Run the interactive loop until `:quit`, end of input, or Ctrl-C.
pub fn run_interactive<T: Toolchain>(session: &mut Session<T>) -> Result<(), ReplError> {
    println!(
        "{}",
        bold(&cyan(&format!("cxxrepl v{}", env!("CARGO_PKG_VERSION"))))
    );
    println!(
        "{}\n",
        gray("Type :help for available commands, :quit to exit.")
    );

    let config = rustyline::Config::builder().auto_add_history(true).build();
    let mut rl = DefaultEditor::with_config(config)?;
    let stdout = io::stdout();
    let stderr = io::stderr();

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let outcome = handle_line(session, &line, &mut stdout.lock(), &mut stderr.lock())?;
                if outcome == Outcome::Quit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Feed every non-blank line of `path` through the session.
///
/// Returns `Ok(false)` at the first rejected line.
pub fn run_script<T: Toolchain>(
    session: &mut Session<T>,
    path: &Path,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<bool, ReplError> {
    let text = fs::read_to_string(path).map_err(|source| ReplError::Script {
        path: path.to_path_buf(),
        source,
    })?;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match handle_line(session, line, out, err)? {
            Outcome::Accepted => {}
            Outcome::Rejected => {
                writeln!(err, "  {} {}:{}", gray("at"), path.display(), index + 1)?;
                return Ok(false);
            }
            Outcome::Quit => break,
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::create_temp_dir;
    use cxxrepl_core::BuildError;

    /// Prints the text of every wrapped expression; rejects `bad` lines.
    struct Echo;

    impl Toolchain for Echo {
        fn build(&mut self, source: &str) -> Result<String, BuildError> {
            if source.contains("bad") {
                return Err(BuildError::Compile {
                    stderr: "repl.cpp: error: 'bad' was not declared\n".to_string(),
                });
            }
            let mut out = String::new();
            for line in source.lines() {
                if let Some(expr) = line
                    .trim()
                    .strip_prefix("std::cout << (")
                    .and_then(|rest| rest.strip_suffix(") << std::endl;"))
                {
                    out.push_str(expr);
                    out.push('\n');
                }
            }
            Ok(out)
        }
    }

    fn run(session: &mut Session<Echo>, line: &str) -> (Outcome, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = handle_line(session, line, &mut out, &mut err).unwrap();
        (
            outcome,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_delta_is_printed_on_its_own_line() {
        let mut session = Session::new(Echo);
        assert_eq!(run(&mut session, "a"), (Outcome::Accepted, "a\n".into(), String::new()));
        assert_eq!(run(&mut session, "int x = 1;"), (Outcome::Accepted, String::new(), String::new()));
        assert_eq!(run(&mut session, "b"), (Outcome::Accepted, "b\n".into(), String::new()));
    }

    #[test]
    fn test_rejection_goes_to_err() {
        let mut session = Session::new(Echo);
        let (outcome, out, err) = run(&mut session, "bad");
        assert_eq!(outcome, Outcome::Rejected);
        assert!(out.is_empty());
        assert!(err.contains("compile failed: repl.cpp: error: 'bad' was not declared"));
        assert!(!err.ends_with("\n\n"));
        assert!(session.body().is_empty());
    }

    #[test]
    fn test_commands_do_not_touch_session() {
        let mut session = Session::new(Echo);
        let (outcome, out, _) = run(&mut session, ":help");
        assert_eq!(outcome, Outcome::Accepted);
        assert!(out.contains(":recall <n>"));

        assert_eq!(run(&mut session, ":q").0, Outcome::Quit);
        assert!(session.history().is_empty());

        let (outcome, _, err) = run(&mut session, ":nope");
        assert_eq!(outcome, Outcome::Rejected);
        assert!(err.contains("unknown command `:nope`"));
    }

    #[test]
    fn test_history_and_recall() {
        let mut session = Session::new(Echo);
        run(&mut session, "first");
        run(&mut session, "bad");

        let (_, out, _) = run(&mut session, ":history");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" first"));
        assert!(lines[1].ends_with(" bad"));

        // Recalling commits the line again, so it prints a second time.
        let (outcome, out, _) = run(&mut session, ":recall 1");
        assert_eq!(outcome, Outcome::Accepted);
        assert_eq!(out.lines().last(), Some("first"));
        assert_eq!(session.body().len(), 2);

        let (outcome, _, err) = run(&mut session, ":recall 9");
        assert_eq!(outcome, Outcome::Rejected);
        assert!(err.contains("no line 9 in history (3 entries)"));
    }

    #[test]
    fn test_reset_and_source() {
        let mut session = Session::with_headers(Echo, vec!["#include <iostream>".into()]);
        run(&mut session, "#include <map>");
        run(&mut session, "int x = 1;");
        let (_, out, _) = run(&mut session, ":source");
        assert!(out.contains("#include <map>"));
        assert!(out.contains("    int x = 1;"));

        run(&mut session, ":reset");
        let (_, out, _) = run(&mut session, ":source");
        assert_eq!(out, "#include <iostream>\n\nint main()\n{\n\n}\n");
    }

    #[test]
    fn test_script_runs_until_first_rejection() {
        let dir = create_temp_dir("cxxrepl_script");
        let path = dir.join("session.cpp");
        std::fs::write(&path, "one\n\n   \nint y = 2;\ntwo\nbad\nthree\n").unwrap();

        let mut session = Session::new(Echo);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let ok = run_script(&mut session, &path, &mut out, &mut err).unwrap();

        assert!(!ok);
        assert_eq!(String::from_utf8(out).unwrap(), "one\ntwo\n");
        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("compile failed"));
        assert!(err.contains("session.cpp:6"));
        assert_eq!(session.body().len(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_script_quit_stops_cleanly() {
        let dir = create_temp_dir("cxxrepl_script_quit");
        let path = dir.join("s.cpp");
        std::fs::write(&path, "one\n:quit\nbad\n").unwrap();

        let mut session = Session::new(Echo);
        let ok = run_script(&mut session, &path, &mut Vec::new(), &mut Vec::new()).unwrap();
        assert!(ok);
        assert_eq!(session.history().len(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_script() {
        let mut session = Session::new(Echo);
        let err = run_script(
            &mut session,
            Path::new("/nonexistent/cxxrepl-script"),
            &mut Vec::new(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, ReplError::Script { .. }));
    }
}
