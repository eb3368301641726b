//! Storage layer for the pomodoro tracker.
//!
//! Persists events in an append-only CSV ledger and writes the derived
//! output files (daily and running CSVs, Markdown day notes, exports).
//!
//! # Thread Safety
//!
//! Nothing here locks files. A [`Ledger`] assumes it is the only writer of
//! its data directory; every operation runs to completion on the calling
//! thread.
//!
//! # Error Reporting
//!
//! Conditions the user should hear about but that must not interrupt a
//! running session (a quarantined ledger, a missing output directory, an
//! export that ran out of file names) are queued on the [`Ledger`] and
//! drained with [`Ledger::retrieve_errors`]. I/O failures while writing are
//! returned as [`StoreError`].

mod error_queue;
mod ledger;
mod outputs;

use thiserror::Error;

pub use error_queue::{ErrorQueue, MAX_QUEUED_ERRORS};
pub use ledger::{LEDGER_HEADER, Ledger};
pub use outputs::{
    DEFAULT_RUNNING_CSV_NAME, ExportFormat, ExportRequest, MAX_EXPORT_SUFFIX, OutputSettings,
    export, unique_export_path, write_session_outputs,
};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    /// A projection failed, e.g. on a data-integrity violation.
    #[error(transparent)]
    Core(#[from] pom_core::CoreError),
}
