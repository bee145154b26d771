use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use chronicle_core::{IndexedTurn, OperationResult};

use crate::output::json::print_json;
use crate::output::table::turns_table;
use crate::output::OutputFormat;

pub fn format_timestamp(timestamp: Option<i64>) -> String {
    let Some(ts) = timestamp else {
        return "-".to_string();
    };

    let datetime: DateTime<Local> = match Local.timestamp_millis_opt(ts).single() {
        Some(dt) => dt,
        None => return "-".to_string(),
    };

    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// First line of `text`, cut to `max_chars` characters.
pub fn preview_text(text: &str, max_chars: usize) -> String {
    let line = text.trim().lines().next().unwrap_or_default();
    let mut preview: String = line.chars().take(max_chars).collect();
    if line.chars().count() > max_chars || text.trim().lines().nth(1).is_some() {
        preview.push_str("...");
    }
    preview
}

/// Print the fresh view returned by a rewriting operation.
///
/// JSON output is the `{success, turns, error}` envelope, printed for failures
/// too before the error is returned.
pub fn print_view(
    result: chronicle_core::Result<Vec<IndexedTurn>>,
    format: OutputFormat,
) -> Result<()> {
    if format.is_json() {
        let envelope = OperationResult::from(result);
        print_json(&envelope)?;
        return match envelope.error {
            Some(message) => Err(anyhow::anyhow!(message)),
            None => Ok(()),
        };
    }

    let turns = result?;
    if turns.is_empty() {
        println!("(empty conversation)");
        return Ok(());
    }
    println!("{}", turns_table(&turns));
    Ok(())
}
