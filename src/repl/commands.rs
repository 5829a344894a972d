//! Reserved REPL directives
//!
//! Only a whole line matching a directive is intercepted; everything else
//! goes to the agent.

/// What the operator asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Exit,
    Reset,
    Usage,
    Help,
    Empty,
    Message(String),
}

/// Parse one input line
pub fn parse(input: &str) -> Directive {
    let trimmed = input.trim();

    match trimmed.to_ascii_lowercase().as_str() {
        "" => Directive::Empty,
        "exit" | "quit" => Directive::Exit,
        "reset" => Directive::Reset,
        "usage" => Directive::Usage,
        "help" => Directive::Help,
        _ => Directive::Message(trimmed.to_string()),
    }
}

/// Directive names and descriptions, for help output
pub const DIRECTIVES: &[(&str, &str)] = &[
    ("usage", "Show token usage over the last 60 seconds"),
    ("reset", "Start a fresh conversation (token usage is kept)"),
    ("help", "Show this help message"),
    ("exit", "Leave the session (also Ctrl-D)"),
];
