//! Output filters shared by the CSV and Markdown projectors.

use std::fmt;

use crate::event::{Action, Event};

/// Which event rows an output leaves out.
///
/// Configuration stores this as a string of codes: `P` drops every pause,
/// `R` drops pauses without a reason, `X` drops stops, `F` drops finishes.
/// Start rows are never filtered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputFilter {
    pub exclude_pause_all: bool,
    pub exclude_pause_no_reason: bool,
    pub exclude_stop: bool,
    pub exclude_finish: bool,
}

impl OutputFilter {
    /// Parses a filter code string. Unknown codes are ignored.
    pub fn from_codes(codes: &str) -> Self {
        let mut filter = Self::default();
        for code in codes.chars().filter(|c| !c.is_whitespace()) {
            match code.to_ascii_uppercase() {
                'P' => filter.exclude_pause_all = true,
                'R' => filter.exclude_pause_no_reason = true,
                'X' => filter.exclude_stop = true,
                'F' => filter.exclude_finish = true,
                other => tracing::warn!(code = %other, "ignoring unknown output filter code"),
            }
        }
        filter
    }

    /// Returns `true` when the event should be written.
    #[must_use]
    pub fn allows(&self, event: &Event) -> bool {
        match event.action {
            Action::Start => true,
            Action::Pause => {
                !(self.exclude_pause_all
                    || (self.exclude_pause_no_reason && event.message.is_empty()))
            }
            Action::Stop => !self.exclude_stop,
            Action::Finish => !self.exclude_finish,
        }
    }
}

impl fmt::Display for OutputFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes = [
            (self.exclude_pause_all, 'P'),
            (self.exclude_pause_no_reason, 'R'),
            (self.exclude_stop, 'X'),
            (self.exclude_finish, 'F'),
        ];
        for (_, code) in codes.iter().filter(|(set, _)| *set) {
            write!(f, "{code}")?;
        }
        Ok(())
    }
}
