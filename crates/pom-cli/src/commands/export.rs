//! Export command: writes a date or date range to fresh files.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use pom_core::{OutputFilter, parse_flexible_date};
use pom_store::{ExportFormat, ExportRequest, Ledger, export};

use crate::{Config, ExportArgs};

/// Validates the arguments into an export request.
///
/// Nothing is written when this fails: a bad date, a range that ends before
/// it starts, or an export path that is not a directory.
pub fn build_request(args: &ExportArgs, today: NaiveDate) -> Result<ExportRequest> {
    let start = match &args.date {
        Some(text) => parse_flexible_date(text).context("invalid --date")?,
        None => today,
    };
    let end = match &args.to {
        Some(text) => parse_flexible_date(text).context("invalid --to")?,
        None => start,
    };
    if end < start {
        bail!("--to {end} is before --date {start}");
    }

    if let Some(dir) = &args.export_path {
        if !dir.is_dir() {
            bail!("export path is not a directory: {}", dir.display());
        }
    }

    let mut formats = Vec::new();
    if args.csv {
        formats.push(ExportFormat::SessionsCsv);
    }
    if args.timesheet {
        formats.push(ExportFormat::Timesheet);
    }
    if args.md {
        formats.push(ExportFormat::Markdown);
    }
    if formats.is_empty() {
        formats.push(ExportFormat::SessionsCsv);
    }

    Ok(ExportRequest {
        start,
        end,
        formats,
        export_dir: args.export_path.clone(),
    })
}

pub fn run<W: Write>(
    writer: &mut W,
    ledger: &mut Ledger,
    config: &Config,
    args: &ExportArgs,
    today: NaiveDate,
) -> Result<()> {
    let request = build_request(args, today)?;

    let mut settings = config.output_settings();
    if let Some(codes) = &args.filter_csv {
        settings.filter_csv = OutputFilter::from_codes(codes);
    }
    if let Some(codes) = &args.filter_md {
        settings.filter_md = OutputFilter::from_codes(codes);
    }

    let written = export(ledger, &settings, &request).context("export failed")?;
    if written.is_empty() {
        writeln!(writer, "Nothing exported for {} to {}.", request.start, request.end)?;
    }
    for path in written {
        writeln!(writer, "Exported {}", path.display())?;
    }
    Ok(())
}
