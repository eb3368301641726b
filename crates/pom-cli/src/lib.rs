//! Pomodoro tracker CLI library.
//!
//! This crate provides the CLI interface for the pomodoro tracker.

mod cli;
pub mod commands;
mod config;
pub mod logging;

pub use cli::{Cli, Commands, ExportArgs};
pub use config::{Config, LEDGER_FILE_NAME};
