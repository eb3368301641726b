//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Pomodoro session tracker.
///
/// Records work sessions in an append-only ledger and mirrors them into
/// daily CSV files, a running CSV, and Markdown day notes.
#[derive(Debug, Parser)]
#[command(name = "pom", version, about, long_about = None)]
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
    /// Start a new session.
    Start {
        /// What the session is for.
        task: String,

        /// Planned length in minutes (defaults to `session_minutes`).
        #[arg(short, long)]
        minutes: Option<u32>,
    },

    /// Record a pause in the running session.
    Pause {
        /// Why the session was interrupted.
        #[arg(short, long, default_value = "")]
        reason: String,

        /// How long the pause lasted.
        #[arg(short, long)]
        seconds: u32,

        /// The pause extended the session instead of interrupting it.
        #[arg(long)]
        extend: bool,
    },

    /// Stop the running session early.
    Stop {
        /// Why the session was stopped.
        #[arg(short, long, default_value = "")]
        reason: String,
    },

    /// Finish the running session.
    Finish,

    /// Show the latest session.
    Status,

    /// Export a date or date range.
    Export(ExportArgs),
}

/// Options for `pom export`.
#[derive(Debug, Default, Args)]
pub struct ExportArgs {
    /// Date to export, `YYYY-MM-DD` or `YY-MM-DD` (defaults to today).
    #[arg(short, long)]
    pub date: Option<String>,

    /// Last date of an inclusive range starting at `--date`.
    #[arg(long)]
    pub to: Option<String>,

    /// Write a session CSV (the default when no format is given).
    #[arg(long)]
    pub csv: bool,

    /// Write a Markdown note.
    #[arg(long)]
    pub md: bool,

    /// Write a timesheet CSV with one row per session.
    #[arg(long)]
    pub timesheet: bool,

    /// Directory to write to instead of the configured ones.
    #[arg(long)]
    pub export_path: Option<PathBuf>,

    /// Override the CSV row filter (codes P, R, X, F).
    #[arg(long)]
    pub filter_csv: Option<String>,

    /// Override the Markdown row filter (codes P, R, X, F).
    #[arg(long)]
    pub filter_md: Option<String>,
}
