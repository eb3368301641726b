//! Writes ledger rows out to the configured files.
//!
//! Two entry points:
//! - [`write_session_outputs`] runs after a session ends and appends it to
//!   the daily CSV, the running CSV, and the day's Markdown note.
//! - [`export`] writes a date or date range to fresh, uniquely named files.
//!
//! A missing output directory or an exhausted collision guard never fails
//! the call. The message goes to the ledger's error queue and that one
//! output is skipped.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use pom_core::{
    Event, OutputFilter, SessionNumbering, write_daily_markdown, write_sessions_csv,
    write_timesheet_csv,
};

use crate::StoreError;
use crate::ledger::Ledger;

/// Highest numeric suffix tried before an export is abandoned.
pub const MAX_EXPORT_SUFFIX: u32 = 99;

/// Default file name of the running CSV.
pub const DEFAULT_RUNNING_CSV_NAME: &str = "pom-sessions.csv";

/// Where and how session outputs are written. `None` disables an output.
#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub daily_csv_dir: Option<PathBuf>,
    pub running_csv_dir: Option<PathBuf>,
    pub running_csv_name: String,
    pub daily_md_dir: Option<PathBuf>,
    /// Markdown section heading; empty means `# Pomodori <date>`.
    pub daily_md_heading: String,
    pub daily_md_append: bool,
    pub filter_csv: OutputFilter,
    pub filter_md: OutputFilter,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            daily_csv_dir: None,
            running_csv_dir: None,
            running_csv_name: DEFAULT_RUNNING_CSV_NAME.to_string(),
            daily_md_dir: None,
            daily_md_heading: String::new(),
            daily_md_append: false,
            filter_csv: OutputFilter::default(),
            filter_md: OutputFilter::default(),
        }
    }
}

/// One export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    SessionsCsv,
    Timesheet,
    Markdown,
}

impl ExportFormat {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionsCsv => "csv",
            Self::Timesheet => "timesheet",
            Self::Markdown => "markdown",
        }
    }

    const fn extension(self) -> &'static str {
        match self {
            Self::SessionsCsv | Self::Timesheet => "csv",
            Self::Markdown => "md",
        }
    }

    const fn stem_prefix(self) -> &'static str {
        match self {
            Self::SessionsCsv | Self::Markdown => "pom",
            Self::Timesheet => "pom-timesheet",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date or inclusive date range to export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub formats: Vec<ExportFormat>,
    /// Overrides the configured directories for every format.
    pub export_dir: Option<PathBuf>,
}

impl ExportRequest {
    fn stem(&self, format: ExportFormat) -> String {
        let prefix = format.stem_prefix();
        if self.start == self.end {
            format!("{prefix}-{}", self.start.format("%Y-%m-%d"))
        } else {
            format!(
                "{prefix}-{}_{}",
                self.start.format("%Y-%m-%d"),
                self.end.format("%Y-%m-%d")
            )
        }
    }
}

/// Returns `<dir>/<stem>.<ext>`, or the first free `<stem>_N.<ext>` for
/// `N` in `1..=99`. `None` when every candidate already exists.
pub fn unique_export_path(dir: &Path, stem: &str, extension: &str) -> Option<PathBuf> {
    let plain = dir.join(format!("{stem}.{extension}"));
    if !plain.exists() {
        return Some(plain);
    }
    (1..=MAX_EXPORT_SUFFIX)
        .map(|n| dir.join(format!("{stem}_{n}.{extension}")))
        .find(|candidate| !candidate.exists())
}

/// Resolves a configured directory, queueing an error if it is set but missing.
fn usable_dir(ledger: &mut Ledger, dir: Option<&Path>, label: &str) -> Option<PathBuf> {
    let dir = dir?;
    if dir.is_dir() {
        Some(dir.to_path_buf())
    } else {
        ledger.report_error(format!("{label} directory not found: '{}'", dir.display()));
        None
    }
}

/// Writes the latest session to the daily CSV, running CSV and daily
/// Markdown outputs. Returns the files written.
///
/// The Markdown note is rebuilt from every row of the session's date, so the
/// section always reflects the whole day.
pub fn write_session_outputs(
    ledger: &mut Ledger,
    settings: &OutputSettings,
) -> Result<Vec<PathBuf>, StoreError> {
    let rows = ledger.latest_session_rows()?;
    let Some(first) = rows.first() else {
        tracing::debug!("no session in ledger, nothing to write");
        return Ok(Vec::new());
    };
    let date = first.date();
    let mut written = Vec::new();

    if let Some(dir) = usable_dir(ledger, settings.daily_csv_dir.as_deref(), "Daily CSV") {
        let path = dir.join(format!("{}.csv", date.format("%Y-%m-%d")));
        write_sessions_csv(&path, &settings.filter_csv, &rows, SessionNumbering::Marker)?;
        written.push(path);
    }

    if let Some(dir) = usable_dir(ledger, settings.running_csv_dir.as_deref(), "Running CSV") {
        let path = dir.join(&settings.running_csv_name);
        write_sessions_csv(&path, &settings.filter_csv, &rows, SessionNumbering::Marker)?;
        written.push(path);
    }

    if let Some(dir) = usable_dir(ledger, settings.daily_md_dir.as_deref(), "Daily Markdown") {
        let path = dir.join(format!("{}.md", date.format("%Y-%m-%d")));
        let day_rows = ledger.rows_for_date(date)?;
        if write_daily_markdown(
            &path,
            &settings.filter_md,
            &settings.daily_md_heading,
            settings.daily_md_append,
            &day_rows,
        )? {
            written.push(path);
        }
    }

    tracing::info!(%date, files = written.len(), "wrote session outputs");
    Ok(written)
}

/// Exports the requested dates in every requested format. Returns the files
/// written; an empty range writes nothing.
pub fn export(
    ledger: &mut Ledger,
    settings: &OutputSettings,
    request: &ExportRequest,
) -> Result<Vec<PathBuf>, StoreError> {
    let rows = ledger.rows_for_date_range(request.start, request.end)?;
    if rows.is_empty() {
        tracing::info!(start = %request.start, end = %request.end, "no events in range");
        return Ok(Vec::new());
    }

    let mut written = Vec::new();
    for &format in &request.formats {
        if let Some(path) = export_one(ledger, settings, request, format, &rows)? {
            written.push(path);
        }
    }
    Ok(written)
}

fn export_one(
    ledger: &mut Ledger,
    settings: &OutputSettings,
    request: &ExportRequest,
    format: ExportFormat,
    rows: &[Event],
) -> Result<Option<PathBuf>, StoreError> {
    let configured = match format {
        ExportFormat::SessionsCsv | ExportFormat::Timesheet => settings.daily_csv_dir.as_deref(),
        ExportFormat::Markdown => settings.daily_md_dir.as_deref(),
    };
    let Some(target) = request.export_dir.as_deref().or(configured) else {
        ledger.report_error(format!("No export directory configured for {format} export."));
        return Ok(None);
    };
    let Some(dir) = usable_dir(ledger, Some(target), "Export") else {
        return Ok(None);
    };

    let stem = request.stem(format);
    let Some(path) = unique_export_path(&dir, &stem, format.extension()) else {
        ledger.report_error(format!(
            "Too many {format} exports named '{stem}' in '{}'. Export abandoned.",
            dir.display()
        ));
        return Ok(None);
    };

    match format {
        ExportFormat::SessionsCsv => {
            write_sessions_csv(&path, &settings.filter_csv, rows, SessionNumbering::Sequential)?;
        }
        ExportFormat::Timesheet => write_timesheet_csv(&path, rows)?,
        ExportFormat::Markdown => {
            let heading = &settings.daily_md_heading;
            write_daily_markdown(&path, &settings.filter_md, heading, false, rows)?;
        }
    }

    tracing::info!(path = %path.display(), %format, "exported");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{Duration, NaiveDateTime};

    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn single_session_ledger(dir: &Path) -> Ledger {
        let mut ledger = Ledger::open(dir.join("data").join("pom-data.csv")).unwrap();
        let start = at("2024-01-02 08:30:01");
        ledger.append(&Event::start(start, "Write report", 600, 600)).unwrap();
        ledger
            .append(&Event::pause(start + Duration::seconds(10), "phone", 2, false))
            .unwrap();
        ledger
            .append(&Event::finish(start + Duration::seconds(20), start.time()))
            .unwrap();
        ledger
    }

    fn csv_request(day: &str, export_dir: &Path) -> ExportRequest {
        ExportRequest {
            start: date(day),
            end: date(day),
            formats: vec![ExportFormat::SessionsCsv],
            export_dir: Some(export_dir.to_path_buf()),
        }
    }

    #[test]
    fn test_single_date_export_has_header_and_three_rows() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());

        let written = export(
            &mut ledger,
            &OutputSettings::default(),
            &csv_request("2024-01-02", temp.path()),
        )
        .unwrap();

        assert_eq!(written, vec![temp.path().join("pom-2024-01-02.csv")]);
        let content = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert_eq!(
            content,
            "date,act,time,task,message,notes\n\
             2024-01-02,1,08:30:01,Write report,,\n\
             2024-01-02,R,08:30:11,,Pause (resumed),phone\n\
             2024-01-02,F,08:30:21,,Finish,Started at 08:30:01\n"
        );
    }

    #[test]
    fn test_repeated_export_uses_numbered_suffixes() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());
        let request = csv_request("2024-01-02", temp.path());
        let settings = OutputSettings::default();

        let first = export(&mut ledger, &settings, &request).unwrap();
        let second = export(&mut ledger, &settings, &request).unwrap();
        let third = export(&mut ledger, &settings, &request).unwrap();

        assert_eq!(first, vec![temp.path().join("pom-2024-01-02.csv")]);
        assert_eq!(second, vec![temp.path().join("pom-2024-01-02_1.csv")]);
        assert_eq!(third, vec![temp.path().join("pom-2024-01-02_2.csv")]);
        assert_eq!(
            fs::read_to_string(&first[0]).unwrap(),
            fs::read_to_string(&third[0]).unwrap()
        );
    }

    #[test]
    fn test_exhausted_suffixes_abandon_the_export() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());
        fs::write(temp.path().join("pom-2024-01-02.csv"), "keep").unwrap();
        for n in 1..=MAX_EXPORT_SUFFIX {
            fs::write(temp.path().join(format!("pom-2024-01-02_{n}.csv")), "keep").unwrap();
        }

        let written = export(
            &mut ledger,
            &OutputSettings::default(),
            &csv_request("2024-01-02", temp.path()),
        )
        .unwrap();

        assert!(written.is_empty());
        assert_eq!(fs::read_to_string(temp.path().join("pom-2024-01-02.csv")).unwrap(), "keep");
        let errors = ledger.retrieve_errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Too many csv exports"), "{}", errors[0]);
    }

    #[test]
    fn test_pause_filter_drops_every_pause_row() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = Ledger::open(temp.path().join("pom-data.csv")).unwrap();
        for start in ["2024-01-02 08:30:01", "2024-01-02 09:30:01"] {
            let start = at(start);
            ledger.append(&Event::start(start, "Task", 1_500, 1_500)).unwrap();
            ledger
                .append(&Event::pause(start + Duration::seconds(10), "phone", 5, false))
                .unwrap();
            ledger
                .append(&Event::pause(start + Duration::seconds(20), "", 60, true))
                .unwrap();
            ledger
                .append(&Event::finish(start + Duration::seconds(1_600), start.time()))
                .unwrap();
        }
        let settings = OutputSettings {
            filter_csv: OutputFilter::from_codes("P"),
            ..OutputSettings::default()
        };

        let request = csv_request("2024-01-02", temp.path());
        let written = export(&mut ledger, &settings, &request).unwrap();

        let content = fs::read_to_string(&written[0]).unwrap();
        assert!(!content.contains("Pause"), "{content}");
        assert_eq!(content.lines().filter(|l| l.contains(",F,")).count(), 2);
        assert_eq!(content.lines().count(), 5);
    }

    #[test]
    fn test_range_export_names_files_by_range() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());
        ledger
            .append(&Event::start(at("2024-01-03 09:00:00"), "Next day", 600, 600))
            .unwrap();
        ledger.append(&Event::stop(at("2024-01-03 09:05:00"), "")).unwrap();
        let request = ExportRequest {
            start: date("2024-01-02"),
            end: date("2024-01-03"),
            formats: vec![
                ExportFormat::SessionsCsv,
                ExportFormat::Timesheet,
                ExportFormat::Markdown,
            ],
            export_dir: Some(temp.path().to_path_buf()),
        };

        let written = export(&mut ledger, &OutputSettings::default(), &request).unwrap();

        assert_eq!(
            written,
            vec![
                temp.path().join("pom-2024-01-02_2024-01-03.csv"),
                temp.path().join("pom-timesheet-2024-01-02_2024-01-03.csv"),
                temp.path().join("pom-2024-01-02_2024-01-03.md"),
            ]
        );
        let csv = fs::read_to_string(&written[0]).unwrap();
        assert!(csv.contains("\n2024-01-03,,,,,\n2024-01-03,1,09:00:00,Next day,,\n"), "{csv}");
        let sheet = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(sheet.lines().count(), 3);
    }

    #[test]
    fn test_missing_directories_are_queued_not_fatal() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());
        let missing = temp.path().join("missing");
        let settings = OutputSettings {
            daily_csv_dir: Some(missing.clone()),
            ..OutputSettings::default()
        };
        let request = ExportRequest {
            start: date("2024-01-02"),
            end: date("2024-01-02"),
            formats: vec![ExportFormat::SessionsCsv, ExportFormat::Markdown],
            export_dir: None,
        };

        let written = export(&mut ledger, &settings, &request).unwrap();

        assert!(written.is_empty());
        let errors = ledger.retrieve_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("not found"), "{}", errors[0]);
        assert!(errors[1].contains("No export directory"), "{}", errors[1]);
    }

    #[test]
    fn test_session_outputs_write_daily_running_and_markdown() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        let settings = OutputSettings {
            daily_csv_dir: Some(out.clone()),
            running_csv_dir: Some(out.clone()),
            daily_md_dir: Some(out.clone()),
            ..OutputSettings::default()
        };

        let written = write_session_outputs(&mut ledger, &settings).unwrap();

        assert_eq!(
            written,
            vec![
                out.join("2024-01-02.csv"),
                out.join(DEFAULT_RUNNING_CSV_NAME),
                out.join("2024-01-02.md"),
            ]
        );
        let daily = fs::read_to_string(&written[0]).unwrap();
        assert!(daily.contains("2024-01-02,S,08:30:01,Write report,,"), "{daily}");
        let note = fs::read_to_string(&written[2]).unwrap();
        assert!(note.starts_with("# Pomodori 2024-01-02\n"), "{note}");
        assert!(note.contains("- **Write report**"), "{note}");

        // A second session the same day appends to the CSVs and merges into
        // the existing note section.
        let start = at("2024-01-02 10:00:00");
        ledger.append(&Event::start(start, "Review", 600, 600)).unwrap();
        ledger.append(&Event::stop(start + Duration::seconds(30), "lunch")).unwrap();
        write_session_outputs(&mut ledger, &settings).unwrap();

        let daily = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(daily.matches("date,act").count(), 1);
        assert_eq!(daily.lines().count(), 6);
        let note = fs::read_to_string(&written[2]).unwrap();
        assert_eq!(note.matches("# Pomodori").count(), 1);
        assert_eq!(note.matches("- **Write report**").count(), 1);
        assert!(note.contains("- **Review**"), "{note}");
        assert!(ledger.retrieve_errors().is_empty());
    }

    #[test]
    fn test_disabled_outputs_write_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let mut ledger = single_session_ledger(temp.path());

        let written = write_session_outputs(&mut ledger, &OutputSettings::default()).unwrap();

        assert!(written.is_empty());
        assert!(ledger.retrieve_errors().is_empty());
    }
}
