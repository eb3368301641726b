//! Session events as recorded in the ledger.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::clock::seconds_to_clock;

/// Version tag written in the first column of every ledger row.
pub const LEDGER_VERSION: &str = "2";

/// Notes token marking a pause that extended the session instead of resuming it.
pub const EXTENDED_NOTE: &str = "extended";

/// The kind of session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Start,
    Pause,
    Stop,
    Finish,
}

impl Action {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Pause => "Pause",
            Self::Stop => "Stop",
            Self::Finish => "Finish",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Start" => Ok(Self::Start),
            "Pause" => Ok(Self::Pause),
            "Stop" => Ok(Self::Stop),
            "Finish" => Ok(Self::Finish),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown action strings.
#[derive(Debug, Clone)]
pub struct UnknownAction(String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action: {}", self.0)
    }
}

impl std::error::Error for UnknownAction {}

/// One ledger record.
///
/// The timestamp is the local wall-clock time captured when the event was
/// written. It is never normalized to another timezone, so an event always
/// belongs to the date it was stamped with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub version: String,
    pub timestamp: NaiveDateTime,
    pub action: Action,
    /// Task name for Start, reason for Pause and Stop.
    pub message: String,
    /// Planned length for Start, pause length for Pause, empty otherwise.
    pub duration: String,
    pub notes: String,
}

impl Event {
    fn new(
        timestamp: NaiveDateTime,
        action: Action,
        message: impl Into<String>,
        duration: String,
        notes: String,
    ) -> Self {
        Self {
            version: LEDGER_VERSION.to_string(),
            timestamp,
            action,
            message: message.into(),
            duration,
            notes,
        }
    }

    /// A session start. When the planned length differs from the default,
    /// the notes record which way it differs, e.g. `(< 0:25:00 default)`.
    pub fn start(
        timestamp: NaiveDateTime,
        task: impl Into<String>,
        session_seconds: u32,
        default_seconds: u32,
    ) -> Self {
        let notes = match session_seconds.cmp(&default_seconds) {
            Ordering::Less => format!("(< {} default)", seconds_to_clock(default_seconds)),
            Ordering::Greater => format!("(> {} default)", seconds_to_clock(default_seconds)),
            Ordering::Equal => String::new(),
        };
        Self::new(
            timestamp,
            Action::Start,
            task,
            seconds_to_clock(session_seconds),
            notes,
        )
    }

    pub fn pause(
        timestamp: NaiveDateTime,
        reason: impl Into<String>,
        pause_seconds: u32,
        extended: bool,
    ) -> Self {
        let notes = if extended {
            EXTENDED_NOTE.to_string()
        } else {
            String::new()
        };
        Self::new(
            timestamp,
            Action::Pause,
            reason,
            seconds_to_clock(pause_seconds),
            notes,
        )
    }

    pub fn stop(timestamp: NaiveDateTime, reason: impl Into<String>) -> Self {
        Self::new(timestamp, Action::Stop, reason, String::new(), String::new())
    }

    pub fn finish(timestamp: NaiveDateTime, started_at: NaiveTime) -> Self {
        let notes = format!("Started at {}", started_at.format("%H:%M:%S"));
        Self::new(timestamp, Action::Finish, "", String::new(), notes)
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Canonical `YYYY-MM-DD` rendering of the stamped date.
    #[must_use]
    pub fn date_str(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM:SS` rendering of the stamped time.
    #[must_use]
    pub fn time_str(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    #[must_use]
    pub fn is_extended_pause(&self) -> bool {
        self.action == Action::Pause && self.notes == EXTENDED_NOTE
    }

    /// Display text for a Start whose planned length is not the default,
    /// e.g. `(0:10:00 session < default)`.
    #[must_use]
    pub fn start_annotation(&self) -> Option<String> {
        if self.action != Action::Start {
            return None;
        }
        let cmp = if self.notes.starts_with("(< ") {
            "<"
        } else if self.notes.starts_with("(> ") {
            ">"
        } else {
            return None;
        };
        Some(format!("({} session {cmp} default)", self.duration))
    }
}
