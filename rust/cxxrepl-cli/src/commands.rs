//! REPL meta-commands (`:help`, `:history`, ...).
//!
//! A line is a command only when `:` is followed by a letter, so C++ such as
//! `::puts("hi");` still reaches the compiler.

#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Help,
    Reset,
    History,
    Source,
    /// 1-based index into the line history.
    Recall(usize),
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParsedCommand<'a> {
    NotACommand,
    UnknownCommand(&'a str),
    InvalidUsage(&'static str),
    Command(ReplCommand),
}

const RECALL_USAGE: &str = "Usage: :recall <n>  (n as listed by :history)";

pub fn parse_repl_command(line: &str) -> ParsedCommand<'_> {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    if chars.next() != Some(':') || !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return ParsedCommand::NotACommand;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match cmd {
        ":quit" | ":q" => ParsedCommand::Command(ReplCommand::Quit),
        ":help" | ":h" => ParsedCommand::Command(ReplCommand::Help),
        ":reset" | ":r" => ParsedCommand::Command(ReplCommand::Reset),
        ":history" => ParsedCommand::Command(ReplCommand::History),
        ":source" | ":s" => ParsedCommand::Command(ReplCommand::Source),
        ":recall" => match arg.and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if n > 0 => ParsedCommand::Command(ReplCommand::Recall(n)),
            _ => ParsedCommand::InvalidUsage(RECALL_USAGE),
        },
        other => ParsedCommand::UnknownCommand(other),
    }
}

pub fn help_text() -> &'static str {
    "\
Commands:
  :help, :h         Show this help message
  :quit, :q         Exit the REPL
  :reset, :r        Forget every line entered so far
  :history          List submitted lines
  :recall <n>       Resubmit line <n> from :history
  :source, :s       Show the program built so far

Input:
  #...              Preprocessor directives go above main()
  int x = 5;        Lines ending in ';' are added to main() as-is
  x * 2             Anything else is printed with std::cout
"
}
