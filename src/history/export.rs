//! Export renderings of the attempt history. Both formats carry the
//! whole log, newest entry first.

use chrono::{Local, TimeZone};

use crate::error::CoachError;
use crate::history::HistoryEntry;

/// Format an entry timestamp as local wall-clock time, day first and
/// without zero padding, the way the history panel shows dates.
pub fn format_entry_date(timestamp: i64) -> String {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|date| date.format("%-d.%-m.%Y, %H:%M:%S").to_string())
        .unwrap_or_default()
}

fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render the log as CSV: UTF-8 BOM for spreadsheet compatibility, a
/// fixed English header, and every field double-quoted with embedded
/// quotes doubled.
pub fn to_csv(entries: &[HistoryEntry]) -> String {
    let mut csv = String::from("\u{feff}");
    csv.push_str("Date,Problem ID,Question,Status,Typed Answer,Used Step-by-Step\n");
    for entry in entries {
        let used_guidance = if entry.status.used_guidance() { "true" } else { "false" };
        let row = [
            csv_field(&format_entry_date(entry.timestamp)),
            csv_field(&entry.problem_id),
            csv_field(&entry.question),
            csv_field(entry.status.as_str()),
            csv_field(&entry.typed_answer),
            csv_field(used_guidance),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

/// Render the log as a pretty-printed JSON array.
pub fn to_pretty_json(entries: &[HistoryEntry]) -> Result<String, CoachError> {
    Ok(serde_json::to_string_pretty(entries)?)
}
