//! Session reconstruction over the ledger's event list.
//!
//! Nothing here is cached. Callers load the whole ledger and pass the slice
//! in.

use chrono::NaiveDate;

use crate::event::{Action, Event};

/// The trailing run of events starting at the last `Start`.
///
/// Returns an empty slice when the ledger holds no `Start`. An unterminated
/// run (no Stop or Finish yet) is still the latest session.
pub fn latest_session(events: &[Event]) -> &[Event] {
    match events.iter().rposition(|e| e.action == Action::Start) {
        Some(index) => &events[index..],
        None => &[],
    }
}

/// Events stamped with `date`, in ledger order.
///
/// Matches on the canonical `YYYY-MM-DD` string of each event, so an event
/// right at midnight stays on the date it was written with.
pub fn rows_for_date(events: &[Event], date: NaiveDate) -> Vec<Event> {
    let wanted = date.format("%Y-%m-%d").to_string();
    events
        .iter()
        .filter(|e| e.date_str() == wanted)
        .cloned()
        .collect()
}

/// Same rows as [`rows_for_date`] for each day in `[start, end]`, grouped
/// by date in ascending order and in ledger order within a day.
///
/// No merging or de-duplication; an empty range yields no rows. Cost follows
/// the number of events, not the width of the range.
pub fn rows_for_date_range(events: &[Event], start: NaiveDate, end: NaiveDate) -> Vec<Event> {
    let mut rows: Vec<Event> = events
        .iter()
        .filter(|e| (start..=end).contains(&e.date()))
        .cloned()
        .collect();
    rows.sort_by_key(Event::date);
    rows
}
