//! Status command for showing the latest session.

use std::io::Write;

use anyhow::{Context, Result};
use pom_core::{Action, Event};
use pom_store::Ledger;

fn describe(row: &Event) -> String {
    let mut line = format!(
        "- {} {} {:<6} {}",
        row.date_str(),
        row.time_str(),
        row.action.as_str(),
        row.message
    );
    if !row.duration.is_empty() {
        line.push_str(&format!(" [{}]", row.duration));
    }
    if !row.notes.is_empty() {
        line.push_str(&format!("  {}", row.notes));
    }
    line.trim_end().to_string()
}

pub fn run<W: Write>(writer: &mut W, ledger: &mut Ledger) -> Result<()> {
    let rows = ledger.latest_session_rows().context("failed to read ledger")?;

    writeln!(writer, "Pomodoro status")?;
    writeln!(writer, "Ledger: {}", ledger.path().display())?;

    let Some(last) = rows.last() else {
        writeln!(writer, "No sessions recorded.")?;
        return Ok(());
    };

    let state = match last.action {
        Action::Start | Action::Pause => "running",
        Action::Stop => "stopped",
        Action::Finish => "finished",
    };
    writeln!(writer, "Latest session ({state}):")?;
    for row in &rows {
        writeln!(writer, "{}", describe(row))?;
    }

    Ok(())
}
