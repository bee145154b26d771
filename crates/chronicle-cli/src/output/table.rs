use chronicle_core::{IndexedTurn, MemorySettings, SummaryRecord};
use comfy_table::{Cell, Table};

use crate::commands::utils::{format_timestamp, preview_text};

const PREVIEW_CHARS: usize = 72;

pub fn turns_table(turns: &[IndexedTurn]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Role", "Id", "Created", "Content"]);
    for entry in turns {
        let turn = &entry.turn;
        let role = if turn.is_summary {
            "summary".to_string()
        } else {
            turn.role.to_string()
        };
        table.add_row(vec![
            Cell::new(entry.logical_index),
            Cell::new(role),
            Cell::new(&turn.id),
            Cell::new(format_timestamp(Some(turn.timestamp))),
            Cell::new(preview_text(&turn.content, PREVIEW_CHARS)),
        ]);
    }
    table
}

pub fn summaries_table(records: &[SummaryRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Id", "Created", "Range", "Summary"]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.summary_id),
            Cell::new(format_timestamp(Some(record.timestamp))),
            Cell::new(format!("{}..={}", record.range.start, record.range.end)),
            Cell::new(preview_text(&record.summary, PREVIEW_CHARS)),
        ]);
    }
    table
}

pub fn settings_table(character_id: &str, settings: &MemorySettings) -> Table {
    let last = (settings.last_summarized_at > 0).then_some(settings.last_summarized_at);
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec![Cell::new("character"), Cell::new(character_id)]);
    table.add_row(vec![Cell::new("enabled"), Cell::new(settings.enabled)]);
    table.add_row(vec![
        Cell::new("summary_threshold_chars"),
        Cell::new(settings.summary_threshold_chars),
    ]);
    table.add_row(vec![
        Cell::new("summary_max_chars"),
        Cell::new(settings.summary_max_chars),
    ]);
    table.add_row(vec![
        Cell::new("last_summarized_at"),
        Cell::new(format_timestamp(last)),
    ]);
    table
}
