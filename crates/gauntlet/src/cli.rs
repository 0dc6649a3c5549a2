//! Command-line surface of a gauntlet test binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use termcolor::ColorChoice;

/// Report renderer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable tree with a summary line.
    Console,
    /// Test Anything Protocol, version 14.
    Tap,
    /// Machine-readable JSON document on stdout.
    Json,
}

/// Terminal color policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    #[must_use]
    pub fn choice(self) -> ColorChoice {
        match self {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Flags of a compiled test binary.
#[derive(Debug, Parser)]
#[command(name = "gauntlet", about = "Fault-containing unit-test runtime")]
pub struct Cli {
    /// Regular expression selecting runs by dotted full name.
    #[arg(long, short = 'm', value_name = "REGEX")]
    pub filter: Option<String>,

    /// Match names case-insensitively.
    #[arg(long)]
    pub icase: bool,

    /// Disable fault containment so an attached debugger catches
    /// crashes and timeouts at their origin.
    #[arg(long)]
    pub debug: bool,

    /// Report renderer.
    #[arg(long, value_enum, default_value_t = Format::Console)]
    pub format: Format,

    /// One console line per finished run instead of failures only.
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Append a JSONL event log to this file.
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,

    /// List matching runs without executing anything.
    #[arg(long)]
    pub list: bool,

    /// Terminal color policy.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_console_auto() {
        let cli = Cli::try_parse_from(["gauntlet"]).unwrap();
        assert_eq!(cli.format, Format::Console);
        assert_eq!(cli.color, ColorMode::Auto);
        assert!(!cli.debug);
        assert!(!cli.list);
        assert!(cli.filter.is_none());
    }

    #[test]
    fn all_flags_parse() {
        let cli = Cli::try_parse_from([
            "gauntlet",
            "--filter",
            "^root::net",
            "--icase",
            "--debug",
            "--format",
            "tap",
            "--verbose",
            "--log",
            "events.jsonl",
            "--color",
            "never",
        ])
        .unwrap();
        assert_eq!(cli.filter.as_deref(), Some("^root::net"));
        assert!(cli.icase);
        assert!(cli.debug);
        assert_eq!(cli.format, Format::Tap);
        assert!(cli.verbose);
        assert_eq!(cli.log.as_deref(), Some(std::path::Path::new("events.jsonl")));
        assert_eq!(cli.color, ColorMode::Never);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["gauntlet", "--fork"]).is_err());
    }
}
