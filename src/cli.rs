//! Command-line arguments.

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// papirus-audit - check which launchers use Papirus icons and fix the rest
#[derive(Parser, Debug)]
#[command(name = "papirus-audit", version, about, long_about = None)]
pub struct Args {
    /// Scan all applications for Papirus icon coverage
    #[arg(long)]
    pub scan: bool,

    /// Apply fixes for launchers with a suggested icon (use with --scan)
    #[arg(long)]
    pub fix: bool,

    /// Apply fixes or reverts without asking
    #[arg(long)]
    pub auto: bool,

    /// Verbose diagnostics
    #[arg(long)]
    pub debug: bool,

    /// Print the scan report as JSON
    #[arg(long)]
    pub json: bool,

    /// Remove the override files written by earlier fixes
    #[arg(long, conflicts_with = "fix")]
    pub revert: bool,

    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Nothing to do without `--scan` or `--revert`.
    pub fn has_action(&self) -> bool {
        self.scan || self.revert
    }

    pub fn print_help() -> std::io::Result<()> {
        Self::command().print_help()
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "warn" }
    }
}
