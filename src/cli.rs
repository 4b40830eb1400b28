//! CLI interface for clusage
//!
//! Without a subcommand clusage opens the interactive viewer, so `clusage`
//! and `clusage view` are the same. `clusage summary` prints a table
//! instead and works when stdout is redirected.
//!
//! # Example
//!
//! ```bash
//! # Browse the history in UTC without the alternate screen
//! clusage --utc view --no-alt-screen
//!
//! # This week's figures with costs, in English
//! clusage --lang en summary --period week --cost
//!
//! # This month so far against the same days of last month
//! clusage summary --compare month
//! ```

use crate::summary::SummaryPeriod;
use crate::views::CompareMode;
use clap::{Args, Parser, Subcommand};
use clusage_core::{ClusageError, Locale, Result, TimezoneConfig};
use std::path::PathBuf;

/// Browse Claude usage history in the terminal
#[derive(Parser, Debug, Clone)]
#[command(name = "clusage")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Only show warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show debug output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Interface language ("ko" or "en"); overrides settings and CLUSAGE_LANG
    #[arg(long, global = true, value_parser = parse_locale)]
    pub lang: Option<Locale>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Data directory holding config/ and data/daily/
    #[arg(long, global = true, env = "CLUSAGE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(flatten)]
    pub timezone_args: TimezoneArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Timezone used to bucket records into days and hours
#[derive(Args, Debug, Clone, Default)]
pub struct TimezoneArgs {
    /// Timezone for date grouping (e.g. "Asia/Seoul", "America/New_York", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Use UTC for date grouping (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,
}

impl TimezoneArgs {
    pub fn resolve(&self) -> Result<TimezoneConfig> {
        TimezoneConfig::from_cli(self.timezone.as_deref(), self.utc)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Draw in the main screen buffer instead of the alternate screen
    #[arg(long)]
    pub no_alt_screen: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SummaryArgs {
    /// Period to summarize, ending today
    #[arg(long, value_enum, default_value = "today")]
    pub period: SummaryPeriod,

    /// Add an estimated cost column
    #[arg(long)]
    pub cost: bool,

    /// Compare this week or month with the previous one instead
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "week")]
    pub compare: Option<CompareMode>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the interactive history viewer (default)
    View(ViewArgs),
    /// Print a usage summary table
    Summary(SummaryArgs),
}

impl Cli {
    /// The command to run, defaulting to the viewer
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::View(ViewArgs::default()))
    }

    /// Whether this invocation takes over the terminal
    pub fn is_interactive(&self) -> bool {
        matches!(self.command(), Command::View(_))
    }

    /// Log filter directive for the selected verbosity
    pub fn log_directive(&self) -> Option<&'static str> {
        if self.quiet {
            Some("warn")
        } else if self.verbose {
            Some("clusage=debug")
        } else {
            None
        }
    }
}

fn parse_locale(value: &str) -> Result<Locale> {
    Locale::from_code(&value.to_ascii_lowercase())
        .ok_or_else(|| ClusageError::Config(format!("unsupported language '{value}', use ko or en")))
}
