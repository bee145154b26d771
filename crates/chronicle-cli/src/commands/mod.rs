mod compact;
mod conversation;
mod settings;
pub mod utils;

use anyhow::Result;
use chronicle_core::Chronicle;

use crate::cli::{Cli, Commands};
use crate::config::CliConfig;

pub async fn run(chronicle: &Chronicle, cli: &Cli, config: &CliConfig) -> Result<()> {
    let format = cli.format;
    match &cli.command {
        Commands::Show { conversation } => {
            conversation::show(chronicle, conversation, format).await
        }
        Commands::Append {
            conversation,
            role,
            text,
            character,
        } => {
            let provider = config.provider_config(&cli.provider);
            conversation::append(
                chronicle,
                conversation,
                *role,
                text,
                character.as_deref(),
                &provider,
                format,
            )
            .await
        }
        Commands::Edit {
            conversation,
            index,
            text,
        } => conversation::edit(chronicle, conversation, *index, text, format).await,
        Commands::Delete {
            conversation,
            index,
        } => conversation::delete(chronicle, conversation, *index, format).await,
        Commands::Regenerate {
            conversation,
            index,
            persona,
            preset,
        } => {
            let provider = config.provider_config(&cli.provider);
            conversation::regenerate(
                chronicle,
                conversation,
                *index,
                persona.clone(),
                preset.clone(),
                &provider,
                format,
            )
            .await
        }
        Commands::Compact(args) => {
            let provider = config.provider_config(&cli.provider);
            compact::compact(chronicle, args, &provider, format).await
        }
        Commands::Summaries {
            conversation,
            delete,
        } => compact::summaries(chronicle, conversation, delete.as_deref(), format).await,
        Commands::Settings(args) => settings::run(chronicle, args, format).await,
    }
}
