//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Calendar stress analysis.
///
/// Estimates cognitive load from calendar exports and plans short breaks
/// in the gaps between meetings.
#[derive(Debug, Parser)]
#[command(name = "mindsync", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Analyze one or more calendar exports.
    ///
    /// Each file is analyzed independently; the file name (without
    /// extension) identifies the subject in the output.
    Analyze {
        /// Calendar JSON files (Google, Outlook, or custom format).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Day to analyze (YYYY-MM-DD). Defaults to the day of the earliest event.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Peak load of the previous day (0.0-1.0), carried over into today.
        #[arg(long, value_name = "LOAD")]
        previous_peak: Option<f64>,
    },

    /// Print normalized events as JSON lines.
    Normalize {
        /// Calendar JSON file.
        file: PathBuf,
    },

    /// Print the effective configuration as JSON.
    Config,
}
