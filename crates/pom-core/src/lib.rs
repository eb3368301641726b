//! Core domain logic for the pomodoro session tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: the Start/Pause/Stop/Finish records kept in the ledger
//! - Session reconstruction: the latest session and the rows for a date
//! - Projections: session CSV, timesheet CSV, and Markdown day notes

pub mod clock;
mod csv_output;
mod error;
pub mod event;
mod filter;
pub mod markdown;
pub mod session;
mod timesheet;

pub use clock::{clock_to_seconds, parse_flexible_date, seconds_to_clock};
pub use csv_output::{
    SESSIONS_CSV_HEADER, SessionNumbering, session_csv_records, write_sessions_csv,
};
pub use error::CoreError;
pub use event::{Action, EXTENDED_NOTE, Event, LEDGER_VERSION, UnknownAction};
pub use filter::OutputFilter;
pub use markdown::write_daily_markdown;
pub use session::{latest_session, rows_for_date, rows_for_date_range};
pub use timesheet::{TIMESHEET_CSV_HEADER, TimesheetRow, timesheet_rows, write_timesheet_csv};
