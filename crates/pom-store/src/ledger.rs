//! The append-only event ledger file.
//!
//! # Format
//!
//! UTF-8 CSV. The first line is exactly [`LEDGER_HEADER`]; every other line
//! is one event with all fields quoted:
//!
//! ```text
//! version,date,time,action,message,duration,notes
//! "2","2024-01-02","08:30:01","Start","Write report","0:25:00",""
//! ```
//!
//! # Recovery
//!
//! The header is checked before every read and every append. A non-empty
//! file with any other first line is renamed to
//! `<name>.<yyyyMMdd_HHmmss_micros>.bad` and a fresh header-only file takes
//! its place. The rename is reported through the ledger's [`ErrorQueue`].
//! An append to a file whose last line lacks a newline terminates that
//! line first.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};
use pom_core::{Action, Event};
use serde::{Deserialize, Serialize};

use crate::StoreError;
use crate::error_queue::ErrorQueue;

/// Expected first line of the ledger file.
pub const LEDGER_HEADER: &str = "version,date,time,action,message,duration,notes";

fn trim_line_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| *b != b'\n' && *b != b'\r')
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// One ledger line as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerRecord {
    version: String,
    date: String,
    time: String,
    action: Action,
    message: String,
    duration: String,
    notes: String,
}

impl From<&Event> for LedgerRecord {
    fn from(event: &Event) -> Self {
        Self {
            version: event.version.clone(),
            date: event.date_str(),
            time: event.time_str(),
            action: event.action,
            message: event.message.clone(),
            duration: event.duration.clone(),
            notes: event.notes.clone(),
        }
    }
}

impl TryFrom<LedgerRecord> for Event {
    type Error = chrono::ParseError;

    fn try_from(record: LedgerRecord) -> Result<Self, Self::Error> {
        let timestamp = NaiveDateTime::parse_from_str(
            &format!("{} {}", record.date, record.time),
            "%Y-%m-%d %H:%M:%S",
        )?;
        Ok(Self {
            version: record.version,
            timestamp,
            action: record.action,
            message: record.message,
            duration: record.duration,
            notes: record.notes,
        })
    }
}

/// Handle on the ledger file for one data directory.
///
/// Not cached: every query reads the whole file again.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    errors: ErrorQueue,
}

impl Ledger {
    /// Opens the ledger at `path`, creating the parent directory and a
    /// header-only file if needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut ledger = Self {
            path,
            errors: ErrorQueue::new(),
        };
        ledger.ensure_valid()?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queues a user-facing error message.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.errors.push(message);
    }

    /// Returns and clears all queued error messages.
    pub fn retrieve_errors(&mut self) -> Vec<String> {
        self.errors.retrieve()
    }

    /// Makes sure the file exists and starts with the expected header.
    ///
    /// Idempotent; called before every append and every read.
    pub fn ensure_valid(&mut self) -> Result<(), StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.write_header();
            }
            Err(e) => return Err(e.into()),
        };

        if file.metadata()?.len() == 0 {
            tracing::warn!(path = %self.path.display(), "ledger file is empty, rewriting header");
            return self.write_header();
        }

        // Compared as bytes so a file that is not UTF-8 is quarantined too.
        let mut first_line = Vec::new();
        BufReader::new(file).read_until(b'\n', &mut first_line)?;
        if trim_line_end(&first_line) == LEDGER_HEADER.as_bytes() {
            return Ok(());
        }

        let bad_path = self.quarantine_path();
        fs::rename(&self.path, &bad_path)?;
        tracing::warn!(
            path = %self.path.display(),
            renamed_to = %bad_path.display(),
            "ledger header mismatch, file quarantined"
        );
        self.errors.push(format!(
            "Invalid header in data file '{}'. Renamed to '{}'.",
            self.path.display(),
            bad_path.display()
        ));
        self.write_header()
    }

    /// Writes a newline if the file does not already end with one.
    fn terminate_last_line(&self) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(());
        }
        let mut last = [0_u8; 1];
        file.seek(SeekFrom::Start(len - 1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            tracing::warn!(path = %self.path.display(), "ledger did not end with a newline");
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    fn write_header(&self) -> Result<(), StoreError> {
        let mut file = File::create(&self.path)?;
        writeln!(file, "{LEDGER_HEADER}")?;
        file.sync_all()?;
        tracing::debug!(path = %self.path.display(), "wrote ledger header");
        Ok(())
    }

    fn quarantine_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
        let name = self
            .path
            .file_name()
            .map_or_else(|| "ledger".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!("{name}.{stamp}.bad"))
    }

    /// Appends one event as a single complete line.
    ///
    /// The file is opened, written, flushed and closed on every call. Write
    /// failures are returned to the caller as-is.
    pub fn append(&mut self, event: &Event) -> Result<(), StoreError> {
        self.ensure_valid()?;
        self.terminate_last_line()?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .quote_style(QuoteStyle::Always)
            .from_writer(file);
        writer.serialize(LedgerRecord::from(event))?;
        writer.flush()?;

        tracing::debug!(action = %event.action, time = %event.timestamp, "appended ledger event");
        Ok(())
    }

    /// Reads every event in ledger order.
    ///
    /// Lines that do not parse are skipped and logged; a damaged row never
    /// hides the rest of the ledger.
    pub fn load_events(&mut self) -> Result<Vec<Event>, StoreError> {
        self.ensure_valid()?;

        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut events = Vec::new();

        for (index, result) in reader.deserialize::<LedgerRecord>().enumerate() {
            let line = index + 2;
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(line, error = %e, "skipping unreadable ledger line");
                    continue;
                }
            };
            match Event::try_from(record) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!(line, error = %e, "skipping ledger line with bad timestamp");
                }
            }
        }

        Ok(events)
    }

    /// Rows of the most recent session: everything from the last Start on.
    pub fn latest_session_rows(&mut self) -> Result<Vec<Event>, StoreError> {
        let events = self.load_events()?;
        Ok(pom_core::latest_session(&events).to_vec())
    }

    pub fn rows_for_date(&mut self, date: NaiveDate) -> Result<Vec<Event>, StoreError> {
        let events = self.load_events()?;
        Ok(pom_core::rows_for_date(&events, date))
    }

    pub fn rows_for_date_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.load_events()?;
        Ok(pom_core::rows_for_date_range(&events, start, end))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn bad_files(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "bad"))
            .collect()
    }

    #[test]
    fn test_open_creates_header_only_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("pom-data.csv");

        let mut ledger = Ledger::open(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{LEDGER_HEADER}\n"));
        assert!(ledger.load_events().unwrap().is_empty());
        assert!(ledger.retrieve_errors().is_empty());
    }

    #[test]
    fn test_append_writes_quoted_line_and_reads_back() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        let mut ledger = Ledger::open(&path).unwrap();
        let start = at("2024-01-02 08:30:01");

        ledger.append(&Event::start(start, "Say \"hi\", then go", 600, 1_500)).unwrap();
        ledger.append(&Event::pause(start + Duration::seconds(10), "phone", 2, false)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            concat!(
                r#""2","2024-01-02","08:30:01","Start","Say ""hi"", then go","#,
                r#""0:10:00","(< 0:25:00 default)""#
            )
        );

        let events = ledger.load_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "Say \"hi\", then go");
        assert_eq!(events[1].action, Action::Pause);
        assert_eq!(events[1].duration, "0:00:02");
    }

    #[test]
    fn test_bad_header_is_quarantined_on_next_append() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        let mut ledger = Ledger::open(&path).unwrap();

        fs::write(&path, "date,time,action\n\"2024-01-01\",\"x\",\"Start\"\n").unwrap();
        ledger.append(&Event::stop(at("2024-01-02 10:00:00"), "done")).unwrap();

        let bad = bad_files(temp.path());
        assert_eq!(bad.len(), 1);
        let bad_name = bad[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(bad_name.starts_with("pom-data.csv."), "{bad_name}");
        assert!(fs::read_to_string(&bad[0]).unwrap().starts_with("date,time,action"));

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with(LEDGER_HEADER));

        let errors = ledger.retrieve_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Invalid header"));
    }

    #[test]
    fn test_non_utf8_header_is_quarantined() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        let mut ledger = Ledger::open(&path).unwrap();
        fs::write(&path, b"\xff\xfe garbage header\n1,2,3\n").unwrap();

        ledger.append(&Event::stop(at("2024-01-02 10:00:00"), "")).unwrap();

        let bad = bad_files(temp.path());
        assert_eq!(bad.len(), 1);
        assert_eq!(fs::read(&bad[0]).unwrap(), b"\xff\xfe garbage header\n1,2,3\n");
        assert_eq!(ledger.load_events().unwrap().len(), 1);
        assert_eq!(ledger.retrieve_errors().len(), 1);
    }

    #[test]
    fn test_append_after_missing_final_newline() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        fs::write(
            &path,
            format!(
                "{LEDGER_HEADER}\n\
                 \"2\",\"2024-01-02\",\"08:30:01\",\"Start\",\"A\",\"0:25:00\",\"\""
            ),
        )
        .unwrap();
        let mut ledger = Ledger::open(&path).unwrap();

        ledger.append(&Event::stop(at("2024-01-02 08:40:00"), "done")).unwrap();

        let events = ledger.load_events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, Action::Start);
        assert_eq!(events[1].message, "done");
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_header_without_newline_is_kept() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        fs::write(&path, LEDGER_HEADER).unwrap();
        let mut ledger = Ledger::open(&path).unwrap();

        ledger.append(&Event::stop(at("2024-01-02 08:40:00"), "")).unwrap();

        assert!(bad_files(temp.path()).is_empty());
        assert_eq!(ledger.load_events().unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_valid_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        let mut ledger = Ledger::open(&path).unwrap();
        ledger.append(&Event::stop(at("2024-01-02 10:00:00"), "")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        ledger.ensure_valid().unwrap();
        ledger.ensure_valid().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert!(bad_files(temp.path()).is_empty());
    }

    #[test]
    fn test_emptied_file_gets_fresh_header() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        let mut ledger = Ledger::open(&path).unwrap();
        fs::write(&path, "").unwrap();

        ledger.append(&Event::stop(at("2024-01-02 10:00:00"), "")).unwrap();

        assert!(bad_files(temp.path()).is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_unreadable_lines_are_skipped() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pom-data.csv");
        fs::write(
            &path,
            format!(
                "{LEDGER_HEADER}\n\
                 \"2\",\"2024-01-02\",\"08:30:01\",\"Start\",\"A\",\"0:25:00\",\"\"\n\
                 \"2\",\"2024-01-02\",\"08:31:01\",\"Resume\",\"\",\"\",\"\"\n\
                 \"2\",\"not-a-date\",\"08:32:01\",\"Stop\",\"\",\"\",\"\"\n\
                 \"2\",\"2024-01-02\",\"08:33:01\",\"Stop\",\"B\",\"\",\"\"\n"
            ),
        )
        .unwrap();

        let mut ledger = Ledger::open(&path).unwrap();
        let events = ledger.load_events().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[1].message, "B");
    }

    #[test]
    fn test_queries_delegate_to_reconstruction() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(temp.path().join("pom-data.csv")).unwrap();
        let start = at("2024-01-02 08:30:01");
        ledger.append(&Event::start(start, "Task", 600, 600)).unwrap();
        ledger.append(&Event::pause(at("2024-01-02 08:30:11"), "phone", 2, false)).unwrap();
        ledger.append(&Event::finish(at("2024-01-02 08:30:21"), start.time())).unwrap();
        ledger.append(&Event::start(at("2024-01-03 09:00:00"), "Next", 600, 600)).unwrap();

        let latest = ledger.latest_session_rows().unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].message, "Next");

        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(ledger.rows_for_date(day).unwrap().len(), 3);
        let next = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(ledger.rows_for_date_range(day, next).unwrap().len(), 4);
    }
}
