//! Markdown day-note projection.
//!
//! The day file is free-form and may be edited by hand. This module only owns
//! the section under one heading: it renders the event rows as a bullet list
//! and merges them into that section, appending lines that are not there yet.
//! Re-running with the same (or a growing) set of rows is idempotent.

use std::fs;
use std::path::Path;

use crate::error::CoreError;
use crate::event::{Action, Event};
use crate::filter::OutputFilter;

/// Title used when no explicit heading is configured.
pub const DEFAULT_TITLE: &str = "Pomodori";

const TASK_BULLET_PREFIX: &str = "- **";

/// The heading that keys the section: `heading` if set, otherwise
/// `# Pomodori <date>` from the first row. `None` when there is nothing to key on.
pub fn section_heading(heading: &str, rows: &[Event]) -> Option<String> {
    let heading = heading.trim();
    if !heading.is_empty() {
        return Some(heading.to_string());
    }
    rows.first()
        .map(|row| format!("# {DEFAULT_TITLE} {}", row.date_str()))
}

/// Renders event rows as Markdown bullet lines.
pub fn render_rows(rows: &[Event], filter: &OutputFilter) -> Vec<String> {
    let mut lines = Vec::new();
    for row in rows.iter().filter(|row| filter.allows(row)) {
        let time = row.timestamp.format("%H:%M");
        match row.action {
            Action::Start => {
                let task = if row.message.is_empty() {
                    "(?)"
                } else {
                    row.message.as_str()
                };
                lines.push(format!("{TASK_BULLET_PREFIX}{task}**"));
                match row.start_annotation() {
                    Some(note) => lines.push(format!("    - Start {time} {note}")),
                    None => lines.push(format!("    - Start {time}")),
                }
            }
            Action::Pause => {
                let act = if row.is_extended_pause() {
                    format!("extend {}", row.duration)
                } else {
                    "resume".to_string()
                };
                lines.push(format!("    - Pause {time} '{}' ({act})", row.message));
            }
            Action::Stop => lines.push(format!("    - STOP {time} '{}'", row.message)),
            Action::Finish => lines.push(format!("    - Finish {time} ({})", row.notes)),
        }
    }
    lines
}

fn is_task_bullet(line: &str) -> bool {
    line.starts_with(TASK_BULLET_PREFIX)
}

fn ends_section(line: &str) -> bool {
    let line = line.trim();
    line.starts_with('#')
        || line.starts_with("---")
        || line.starts_with("***")
        || line.starts_with("___")
}

/// Picks the rendered lines that still need to go into an existing section.
///
/// Lines already present verbatim are skipped. A task bullet that is already
/// present is held back and only re-emitted when one of its sub-bullets is
/// new and the section's most recent task bullet is a different one;
/// otherwise the new sub-bullet would land under the wrong task.
fn new_section_lines(section: &[String], rendered: &[String]) -> Vec<String> {
    let mut current_task: Option<&str> = section
        .iter()
        .rev()
        .find(|line| is_task_bullet(line))
        .map(String::as_str);
    let mut pending_task: Option<&str> = None;
    let mut out = Vec::new();

    for line in rendered {
        let present = section.iter().any(|existing| existing == line);
        if is_task_bullet(line) {
            if present {
                pending_task = Some(line);
            } else {
                out.push(line.clone());
                current_task = Some(line);
                pending_task = None;
            }
            continue;
        }
        if present {
            continue;
        }
        if let Some(task) = pending_task.take() {
            if current_task != Some(task) {
                out.push(task.to_string());
                current_task = Some(task);
            }
        }
        out.push(line.clone());
    }

    out
}

/// Merges rendered lines into `document` under `heading`.
///
/// If the heading is missing, a new block (heading, blank line, rows) is added
/// at the end. Exactly one blank line is kept after the section; everything
/// outside the section is left as it was.
pub fn merge_section(document: &str, heading: &str, rendered: &[String]) -> String {
    let mut lines: Vec<String> = document.lines().map(str::to_string).collect();

    let heading_index = lines
        .iter()
        .position(|line| line.trim().starts_with(heading));

    let (insert_index, block) = match heading_index {
        None => {
            while lines.last().is_some_and(|last| last.trim().is_empty()) {
                lines.pop();
            }
            let mut block = Vec::new();
            if !lines.is_empty() {
                block.push(String::new());
            }
            block.push(heading.to_string());
            block.push(String::new());
            block.extend(rendered.iter().cloned());
            (lines.len(), block)
        }
        Some(index) => {
            let mut body_start = index + 1;
            let has_gap = lines
                .get(body_start)
                .is_some_and(|line| line.trim().is_empty());
            if has_gap {
                body_start += 1;
            }

            let mut end = lines[body_start.min(lines.len())..]
                .iter()
                .position(|line| ends_section(line))
                .map_or(lines.len(), |offset| body_start + offset);
            while end > body_start && lines[end - 1].trim().is_empty() {
                end -= 1;
            }
            let end = end.max(body_start.min(lines.len()));

            let section = &lines[body_start.min(end)..end];
            let mut block = new_section_lines(section, rendered);
            if !has_gap && section.is_empty() && !block.is_empty() {
                block.insert(0, String::new());
            }
            (end, block)
        }
    };

    let mut tail = lines.split_off(insert_index);
    if tail.first().is_none_or(|line| !line.trim().is_empty()) {
        tail.insert(0, String::new());
    }
    lines.extend(block);
    lines.extend(tail);

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Writes the rows into the day file's section, rewriting the whole file.
///
/// With `append_only`, a missing file is left alone: whoever owns the notes
/// file is expected to create it. Returns whether the file was written.
pub fn write_daily_markdown(
    path: &Path,
    filter: &OutputFilter,
    heading: &str,
    append_only: bool,
    rows: &[Event],
) -> Result<bool, CoreError> {
    let Some(heading) = section_heading(heading, rows) else {
        return Ok(false);
    };

    let document = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if append_only {
                tracing::debug!(path = %path.display(), "markdown file missing, append-only set");
                return Ok(false);
            }
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    let rendered = render_rows(rows, filter);
    let merged = merge_section(&document, &heading, &rendered);
    fs::write(path, merged)?;
    tracing::debug!(path = %path.display(), heading = %heading, "wrote markdown section");
    Ok(true)
}
