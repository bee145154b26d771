use anyhow::{Result, bail};
use chronicle_ai::ProviderConfig;
use chronicle_core::{Chronicle, RegenerationContext, Turn, TurnRole};

use crate::cli::RoleArg;
use crate::commands::utils::print_view;
use crate::output::OutputFormat;

pub async fn show(chronicle: &Chronicle, conversation: &str, format: OutputFormat) -> Result<()> {
    print_view(chronicle.mutation.get_indexed_view(conversation).await, format)
}

pub async fn append(
    chronicle: &Chronicle,
    conversation: &str,
    role: RoleArg,
    text: &str,
    character: Option<&str>,
    provider: &ProviderConfig,
    format: OutputFormat,
) -> Result<()> {
    if conversation.trim().is_empty() {
        bail!("conversation id must not be empty");
    }
    let role = match role {
        RoleArg::User => TurnRole::User,
        RoleArg::Character => TurnRole::Character,
    };

    let mut log = chronicle
        .mutation
        .append_turn(conversation, Turn::new(role, text))
        .await?;

    if let Some(character) = character {
        log = chronicle
            .compaction
            .check_and_summarize(conversation, character, log, provider)
            .await?;
    }

    print_view(Ok(log.indexed()), format)
}

pub async fn edit(
    chronicle: &Chronicle,
    conversation: &str,
    index: usize,
    text: &str,
    format: OutputFormat,
) -> Result<()> {
    print_view(
        chronicle.mutation.edit_turn(conversation, index, text).await,
        format,
    )
}

pub async fn delete(
    chronicle: &Chronicle,
    conversation: &str,
    index: usize,
    format: OutputFormat,
) -> Result<()> {
    print_view(chronicle.mutation.delete_turn(conversation, index).await, format)
}

pub async fn regenerate(
    chronicle: &Chronicle,
    conversation: &str,
    index: usize,
    persona: Option<String>,
    preset: Option<String>,
    provider: &ProviderConfig,
    format: OutputFormat,
) -> Result<()> {
    let context = RegenerationContext { persona, preset };
    print_view(
        chronicle
            .mutation
            .regenerate_turn(conversation, index, provider, &context)
            .await,
        format,
    )
}
