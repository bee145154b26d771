use anyhow::Result;
use chronicle_ai::ProviderConfig;
use chronicle_core::{Chronicle, ChronicleError, IndexedTurn, LogStore, SummaryRange};

use crate::cli::CompactArgs;
use crate::commands::utils::print_view;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::summaries_table;

pub async fn compact(
    chronicle: &Chronicle,
    args: &CompactArgs,
    provider: &ProviderConfig,
    format: OutputFormat,
) -> Result<()> {
    let range = match (args.start, args.end) {
        (Some(start), Some(end)) => Some(SummaryRange::new(start, end)),
        _ => None,
    };

    let result = if args.force || range.is_some() {
        chronicle
            .compaction
            .summarize_now(&args.conversation, &args.character, provider, range)
            .await
    } else {
        automatic(chronicle, args, provider).await
    };
    print_view(result, format)
}

async fn automatic(
    chronicle: &Chronicle,
    args: &CompactArgs,
    provider: &ProviderConfig,
) -> chronicle_core::Result<Vec<IndexedTurn>> {
    let log = chronicle
        .logs
        .get_log(&args.conversation)
        .await?
        .ok_or_else(|| {
            ChronicleError::validation(format!("conversation {} not found", args.conversation))
        })?;
    let before = log.len();
    let log = chronicle
        .compaction
        .check_and_summarize(&args.conversation, &args.character, log, provider)
        .await?;
    if log.len() == before {
        tracing::info!(conversation_id = %args.conversation, "No compaction needed");
    }
    Ok(log.indexed())
}

pub async fn summaries(
    chronicle: &Chronicle,
    conversation: &str,
    delete: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(summary_id) = delete {
        return print_view(
            chronicle.compaction.delete_summary(conversation, summary_id).await,
            format,
        );
    }

    let records = chronicle.compaction.list_summaries(conversation).await?;
    if format.is_json() {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No summaries for {conversation}");
        return Ok(());
    }
    println!("{}", summaries_table(&records));
    Ok(())
}
