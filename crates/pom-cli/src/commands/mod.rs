//! CLI subcommand implementations.

use std::io::{self, Write};

use pom_store::Ledger;

pub mod export;
pub mod record;
pub mod status;

/// Drains the ledger's queued errors and prints each one as a warning.
pub fn report_queued_errors<W: Write>(writer: &mut W, ledger: &mut Ledger) -> io::Result<()> {
    for message in ledger.retrieve_errors() {
        writeln!(writer, "warning: {message}")?;
    }
    Ok(())
}
