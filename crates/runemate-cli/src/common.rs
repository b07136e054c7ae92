//! Common types and utilities shared across modules

use clap::Parser;
use std::path::PathBuf;

/// Global CLI options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    #[arg(short, long, global = true, help = "Only print warnings and errors")]
    pub quiet: bool,

    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "Increase verbosity (-v for debug, -vv for trace)")]
    pub verbose: u8,

    #[arg(
        short = 'C',
        long = "project-dir",
        global = true,
        value_name = "DIR",
        help = "Run as if started in DIR"
    )]
    pub project_dir: Option<PathBuf>,
}

impl GlobalOpts {
    /// Get the effective verbosity level
    /// - 0: lifecycle, warnings and errors
    /// - 1: debug (-v)
    /// - 2: trace (-vv)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Directory holding the root `runemate.toml`
    pub fn project_dir(&self) -> PathBuf {
        self.project_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Default `tracing` filter when `RUST_LOG` is unset
    pub fn tracing_directive(&self) -> &'static str {
        match self.verbosity_level() {
            0 => "warn",
            1 => "runemate=debug,runemate_manifest=debug,warn",
            _ => "trace",
        }
    }
}
