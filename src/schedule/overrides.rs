//! Hand-written announcement lists
//!
//! CSV with a header row:
//!
//! ```text
//! remaining_seconds,announcement_text
//! 60,"1 minute remaining"
//! 30,Half a minute left
//! ```

use std::path::Path;

use tracing::{debug, warn};

use super::{Announcement, Schedule};

/// Load an override list from disk
///
/// A missing or unreadable file yields an empty schedule.
pub fn load_override_announcements(path: &Path) -> Schedule {
    if !path.exists() {
        debug!(path = %path.display(), "No override announcements file");
        return Schedule::new();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => parse_override_announcements(&content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read override announcements");
            Schedule::new()
        }
    }
}

/// Parse override rows; invalid rows are skipped with a warning
pub fn parse_override_announcements(content: &str) -> Schedule {
    let mut lines = content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_start_matches('\u{feff}')))
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header)) = lines.next() else {
        return Schedule::new();
    };
    let columns = split_row(header);
    let seconds_col = columns.iter().position(|c| c.trim() == "remaining_seconds");
    let text_col = columns.iter().position(|c| c.trim() == "announcement_text");
    let (Some(seconds_col), Some(text_col)) = (seconds_col, text_col) else {
        warn!(header = %header, "Override announcements header is missing required columns");
        return Schedule::new();
    };

    let mut announcements = Vec::new();
    for (line_number, line) in lines {
        let fields = split_row(line);
        let seconds = fields.get(seconds_col).map(|s| s.trim().parse::<u64>());
        match (seconds, fields.get(text_col)) {
            (Some(Ok(seconds)), Some(text)) => {
                announcements.push(Announcement::new(seconds, text.as_str()));
            }
            (Some(Err(e)), _) => {
                warn!(line = line_number, error = %e, "Skipping invalid override row");
            }
            _ => {
                warn!(line = line_number, "Skipping override row with missing columns");
            }
        }
    }

    Schedule::from_unsorted(announcements)
}

/// Split one CSV row, honouring double-quoted fields and `""` escapes
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}
