//! Session CSV projection.
//!
//! The output layout differs from the ledger: one row per event with a
//! single-character action code, plus optional date separator rows when a
//! range export crosses into a new day. Target files are only ever appended
//! to; the header goes in when the file is first created.

use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::WriterBuilder;

use crate::error::CoreError;
use crate::event::{Action, Event};
use crate::filter::OutputFilter;

/// Header of per-day, per-range and running session CSV files.
pub const SESSIONS_CSV_HEADER: [&str; 6] = ["date", "act", "time", "task", "message", "notes"];

/// How Start rows fill the `act` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionNumbering {
    /// Every Start is marked `S`.
    Marker,
    /// Starts are numbered 1, 2, ... restarting at each new date, and a
    /// date-only separator row is written between days.
    Sequential,
}

/// Opens `path` for appending, writing `header` first if the file is new.
pub(crate) fn open_append_writer(
    path: &Path,
    header: &[&str],
) -> Result<csv::Writer<File>, CoreError> {
    let is_new = !path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    if is_new {
        writer.write_record(header)?;
    }
    Ok(writer)
}

/// Renders event rows into session CSV records.
pub fn session_csv_records(
    rows: &[Event],
    filter: &OutputFilter,
    numbering: SessionNumbering,
) -> Vec<[String; 6]> {
    let mut records = Vec::with_capacity(rows.len());
    let mut session_num: u32 = 1;
    let mut last_date: Option<String> = None;

    for row in rows {
        if !filter.allows(row) {
            continue;
        }
        let date = row.date_str();
        let time = row.time_str();

        let record = match row.action {
            Action::Start => {
                let act = match numbering {
                    SessionNumbering::Marker => "S".to_string(),
                    SessionNumbering::Sequential => {
                        if last_date.as_ref().is_some_and(|last| *last != date) {
                            session_num = 1;
                            records.push([
                                date.clone(),
                                String::new(),
                                String::new(),
                                String::new(),
                                String::new(),
                                String::new(),
                            ]);
                        }
                        let act = session_num.to_string();
                        session_num += 1;
                        act
                    }
                };
                last_date = Some(date.clone());
                [
                    date,
                    act,
                    time,
                    row.message.clone(),
                    row.start_annotation().unwrap_or_default(),
                    String::new(),
                ]
            }
            Action::Pause => {
                let (act, message) = if row.is_extended_pause() {
                    ("E", "Pause (extended)")
                } else {
                    ("R", "Pause (resumed)")
                };
                [
                    date,
                    act.to_string(),
                    time,
                    String::new(),
                    message.to_string(),
                    row.message.clone(),
                ]
            }
            Action::Stop => [
                date,
                "X".to_string(),
                time,
                String::new(),
                "Stop".to_string(),
                row.message.clone(),
            ],
            Action::Finish => [
                date,
                "F".to_string(),
                time,
                String::new(),
                "Finish".to_string(),
                row.notes.clone(),
            ],
        };
        records.push(record);
    }

    records
}

/// Appends event rows to a session CSV file, creating it with a header if needed.
pub fn write_sessions_csv(
    path: &Path,
    filter: &OutputFilter,
    rows: &[Event],
    numbering: SessionNumbering,
) -> Result<(), CoreError> {
    let mut writer = open_append_writer(path, &SESSIONS_CSV_HEADER)?;
    let records = session_csv_records(rows, filter, numbering);
    for record in &records {
        writer.write_record(record)?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "wrote session csv rows");
    Ok(())
}
