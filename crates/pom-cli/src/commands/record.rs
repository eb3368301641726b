//! Recording commands. Each one appends a single event to the ledger;
//! `stop` and `finish` then write the session outputs.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use pom_core::{Action, Event};
use pom_store::{Ledger, write_session_outputs};

use crate::Config;

/// The Start of the running session, or an error if the latest session has
/// already ended.
fn running_start(ledger: &mut Ledger) -> Result<Event> {
    let rows = ledger.latest_session_rows().context("failed to read ledger")?;
    match (rows.first(), rows.last()) {
        (Some(start), Some(last)) if !matches!(last.action, Action::Stop | Action::Finish) => {
            Ok(start.clone())
        }
        _ => bail!("no running session; start one with `pom start <task>`"),
    }
}

pub fn start<W: Write>(
    writer: &mut W,
    ledger: &mut Ledger,
    config: &Config,
    task: &str,
    minutes: Option<u32>,
    now: NaiveDateTime,
) -> Result<()> {
    let default_seconds = config.session_seconds();
    let session_seconds = match minutes {
        Some(0) => bail!("session length must be at least one minute"),
        Some(m) => m.checked_mul(60).context("session length is too large")?,
        None => default_seconds,
    };

    let event = Event::start(now, task, session_seconds, default_seconds);
    ledger.append(&event).context("failed to append to ledger")?;
    writeln!(writer, "Started '{task}' ({})", event.duration)?;
    Ok(())
}

pub fn pause<W: Write>(
    writer: &mut W,
    ledger: &mut Ledger,
    reason: &str,
    seconds: u32,
    extend: bool,
    now: NaiveDateTime,
) -> Result<()> {
    running_start(ledger)?;

    let event = Event::pause(now, reason, seconds, extend);
    ledger.append(&event).context("failed to append to ledger")?;
    let verb = if extend { "Extended" } else { "Paused" };
    writeln!(writer, "{verb} for {}", event.duration)?;
    Ok(())
}

pub fn stop<W: Write>(
    writer: &mut W,
    ledger: &mut Ledger,
    config: &Config,
    reason: &str,
    now: NaiveDateTime,
) -> Result<()> {
    let start = running_start(ledger)?;

    ledger
        .append(&Event::stop(now, reason))
        .context("failed to append to ledger")?;
    writeln!(writer, "Stopped '{}'", start.message)?;
    write_outputs(writer, ledger, config)
}

pub fn finish<W: Write>(
    writer: &mut W,
    ledger: &mut Ledger,
    config: &Config,
    now: NaiveDateTime,
) -> Result<()> {
    let start = running_start(ledger)?;

    ledger
        .append(&Event::finish(now, start.timestamp.time()))
        .context("failed to append to ledger")?;
    writeln!(writer, "Finished '{}'", start.message)?;
    write_outputs(writer, ledger, config)
}

fn write_outputs<W: Write>(writer: &mut W, ledger: &mut Ledger, config: &Config) -> Result<()> {
    let written = write_session_outputs(ledger, &config.output_settings())
        .context("failed to write session outputs")?;
    for path in written {
        writeln!(writer, "Wrote {}", path.display())?;
    }
    Ok(())
}
