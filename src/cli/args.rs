//! Command-line argument parsing for toolbuddy
//!
//! Flags override the config file; verbosity drives the log filter.

use clap::Parser;
use std::path::PathBuf;

/// toolbuddy - terminal chat agent with tools
#[derive(Parser, Debug)]
#[command(name = "toolbuddy")]
#[command(version)]
#[command(about = "Chat with an LLM that can read, edit, lint and commit your project", long_about = None)]
pub struct Args {
    /// Model to use (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// OpenAI-compatible API root, e.g. http://127.0.0.1:11434/v1 (overrides config)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Working directory for all tools (current directory by default)
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only assistant answers and errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Get working directory (current dir if not specified)
    pub fn working_dir(&self) -> PathBuf {
        self.cwd
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl Verbosity {
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "toolbuddy=info,warn",
            Verbosity::VeryVerbose => "toolbuddy=debug,info",
        }
    }

    /// Check if should show spinners and status lines
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show per-tool events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("toolbuddy").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(args.model.is_none());
        assert!(args.base_url.is_none());
        assert_eq!(args.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["-q"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv"]).verbosity(), Verbosity::VeryVerbose);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["toolbuddy", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let args = parse(&[
            "--model",
            "llama3.1:8b",
            "--base-url",
            "http://gpu-box:11434/v1",
            "--cwd",
            "/srv/app",
        ]);
        assert_eq!(args.model.as_deref(), Some("llama3.1:8b"));
        assert_eq!(args.base_url.as_deref(), Some("http://gpu-box:11434/v1"));
        assert_eq!(args.working_dir(), PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_verbosity_flags() {
        assert!(!Verbosity::Quiet.show_progress());
        assert!(Verbosity::Normal.show_progress());
        assert!(!Verbosity::Normal.show_events());
        assert!(Verbosity::Verbose.show_events());
        assert_eq!(Verbosity::Normal.log_filter(), "warn");
    }
}
