//! Timesheet projection: one row per session instead of one per event.

use std::path::Path;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::clock::clock_to_seconds;
use crate::csv_output::open_append_writer;
use crate::error::CoreError;
use crate::event::{Action, Event};

/// Header of timesheet CSV files.
pub const TIMESHEET_CSV_HEADER: [&str; 7] = [
    "date",
    "start_time",
    "stop_time",
    "task_minutes",
    "pause_minutes",
    "task",
    "notes",
];

/// One reconstructed session in timesheet form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimesheetRow {
    pub date: String,
    pub start_time: String,
    pub stop_time: String,
    pub task_minutes: i64,
    pub pause_minutes: i64,
    pub task: String,
    pub notes: String,
}

/// Accumulates one session between its Start and its Stop or Finish.
#[derive(Debug)]
struct TaskSession {
    started: NaiveDateTime,
    stop_time: Option<String>,
    task: String,
    /// Planned length, replaced by the real elapsed time on Stop.
    task_seconds: i64,
    /// Time off task from resumed pauses. Extended pauses are overrun the
    /// user agreed to, not interruptions, so they are not counted.
    pause_seconds: i64,
    reasons: Vec<String>,
}

impl TaskSession {
    fn start(event: &Event) -> Result<Self, CoreError> {
        Ok(Self {
            started: event.timestamp,
            stop_time: None,
            task: event.message.clone(),
            task_seconds: i64::from(clock_to_seconds(&event.duration)?),
            pause_seconds: 0,
            reasons: Vec::new(),
        })
    }

    fn pause(&mut self, event: &Event) -> Result<(), CoreError> {
        let act = if event.is_extended_pause() {
            "Extend"
        } else {
            self.pause_seconds += i64::from(clock_to_seconds(&event.duration)?);
            "Resume"
        };
        if !event.message.is_empty() {
            self.reasons.push(format!("{act}: {}", event.message));
        }
        Ok(())
    }

    fn stop(&mut self, event: &Event) -> Result<(), CoreError> {
        if event.timestamp < self.started {
            return Err(CoreError::DataIntegrity(format!(
                "session '{}' stopped at {} before it started at {}",
                self.task, event.timestamp, self.started
            )));
        }
        self.stop_time = Some(event.time_str());
        self.task_seconds = (event.timestamp - self.started).num_seconds();
        if event.message.is_empty() {
            self.reasons.push("STOP".to_string());
        } else {
            self.reasons.push(format!("STOP: {}", event.message));
        }
        Ok(())
    }

    fn finish(&mut self, event: &Event) {
        self.stop_time = Some(event.time_str());
    }

    /// Only completed minutes count; nothing is rounded up.
    fn into_row(self) -> TimesheetRow {
        let task_minutes = (self.task_seconds - self.pause_seconds).div_euclid(60);
        let pause_minutes = self.task_seconds.div_euclid(60) - task_minutes;
        TimesheetRow {
            date: self.started.format("%Y-%m-%d").to_string(),
            start_time: self.started.format("%H:%M:%S").to_string(),
            stop_time: self.stop_time.unwrap_or_default(),
            task_minutes,
            pause_minutes,
            task: self.task,
            notes: self.reasons.join(" | "),
        }
    }
}

/// Folds event rows into one timesheet row per session.
///
/// A session opens at Start and closes at Stop or Finish, or when the next
/// Start arrives. A trailing open session is still emitted, with an empty
/// stop time. Events before the first Start are skipped.
pub fn timesheet_rows(rows: &[Event]) -> Result<Vec<TimesheetRow>, CoreError> {
    let mut out = Vec::new();
    let mut session: Option<TaskSession> = None;

    for row in rows {
        if row.action == Action::Start {
            if let Some(open) = session.take() {
                out.push(open.into_row());
            }
            session = Some(TaskSession::start(row)?);
            continue;
        }

        let Some(open) = session.as_mut() else {
            tracing::debug!(
                action = %row.action,
                time = %row.timestamp,
                "skipping event outside a session"
            );
            continue;
        };

        match row.action {
            Action::Pause => open.pause(row)?,
            Action::Stop => {
                open.stop(row)?;
                if let Some(closed) = session.take() {
                    out.push(closed.into_row());
                }
            }
            Action::Finish => {
                open.finish(row);
                if let Some(closed) = session.take() {
                    out.push(closed.into_row());
                }
            }
            Action::Start => unreachable!("handled above"),
        }
    }

    if let Some(open) = session {
        out.push(open.into_row());
    }

    Ok(out)
}

/// Appends timesheet rows to `path`, creating it with a header if needed.
///
/// Rows are computed before the file is opened, so a data-integrity error
/// leaves the file untouched.
pub fn write_timesheet_csv(path: &Path, rows: &[Event]) -> Result<(), CoreError> {
    let sessions = timesheet_rows(rows)?;
    let mut writer = open_append_writer(path, &TIMESHEET_CSV_HEADER)?;
    for session in &sessions {
        writer.serialize(session)?;
    }
    writer.flush()?;
    tracing::debug!(path = %path.display(), sessions = sessions.len(), "wrote timesheet rows");
    Ok(())
}
