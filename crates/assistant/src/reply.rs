//! Reply text construction.
//!
//! Every user-visible message the assistant produces without the model is
//! assembled here, so the flow code stays about decisions, not wording.

use catalog::QueryResult;
use conversation::ContextEntry;
use records::{Record, RecordType};

/// Most generic result rows shown before truncation is announced.
const MAX_SHOWN_ROWS: usize = 10;

/// Numbered candidate list, 1-based, matching context positions.
pub fn numbered_list(entries: &[ContextEntry]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry.label))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ask the user to pick from several candidates.
pub fn disambiguation(entries: &[ContextEntry]) -> String {
    format!(
        "I found several wines that could match. Which one do you mean?\n{}\n\
         Reply with a position, e.g. \"2\".",
        numbered_list(entries)
    )
}

/// Result list reply when rows mapped onto wine cards.
pub fn wine_list(entries: &[ContextEntry]) -> String {
    let noun = if entries.len() == 1 { "wine" } else { "wines" };
    format!(
        "Found {} {}:\n{}",
        entries.len(),
        noun,
        numbered_list(entries)
    )
}

/// Result reply for rows without wine identifiers (aggregates and such).
pub fn tabular(result: &QueryResult) -> String {
    let mut lines: Vec<String> = result
        .rows
        .iter()
        .take(MAX_SHOWN_ROWS)
        .map(|row| {
            result
                .columns
                .iter()
                .zip(row.iter())
                .map(|(col, value)| format!("{col}: {}", render_value(value)))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect();
    if result.rows.len() > MAX_SHOWN_ROWS {
        lines.push(format!("... and {} more rows", result.rows.len() - MAX_SHOWN_ROWS));
    }
    format!("{}\n({} rows)", lines.join("\n"), result.rows.len())
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "-".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Confirmation after records were written.
pub fn record_saved(record_type: RecordType, labels: &[String]) -> String {
    let what = match record_type {
        RecordType::Like => "a like",
        RecordType::Note => "a note",
    };
    if labels.len() == 1 {
        format!("Saved {what} for {}.", labels[0])
    } else {
        format!("Saved {what} for each of: {}.", labels.join("; "))
    }
}

/// The user's own records, newest first.
pub fn record_list(records: &[Record]) -> String {
    if records.is_empty() {
        return "You have no records yet.".to_string();
    }
    let lines: Vec<String> = records
        .iter()
        .map(|record| {
            let kind = record.record_type.as_str();
            match record.content.as_deref().filter(|c| *c != records::LIKE_DEFAULT_CONTENT) {
                Some(content) => {
                    format!("- {kind} on wine {}: {content} ({})", record.wine_id, record.created_at)
                }
                None => format!("- {kind} on wine {} ({})", record.wine_id, record.created_at),
            }
        })
        .collect();
    format!("Your records ({}):\n{}", records.len(), lines.join("\n"))
}
