use anyhow::Result;
use chronicle_core::{Chronicle, MemorySettingsStore};
use serde_json::json;

use crate::cli::SettingsArgs;
use crate::output::OutputFormat;
use crate::output::json::print_json;
use crate::output::table::settings_table;

pub async fn run(chronicle: &Chronicle, args: &SettingsArgs, format: OutputFormat) -> Result<()> {
    let mut settings = chronicle.settings.load_settings(&args.character).await?;

    if args.changes_anything() {
        if args.enable {
            settings.enabled = true;
        }
        if args.disable {
            settings.enabled = false;
        }
        if let Some(threshold) = args.threshold {
            settings.summary_threshold_chars = threshold;
        }
        if let Some(max_chars) = args.max_chars {
            settings.summary_max_chars = max_chars;
        }
        settings.validate()?;
        chronicle
            .settings
            .save_settings(&args.character, &settings)
            .await?;
        tracing::info!(character_id = %args.character, enabled = settings.enabled, "Updated memory settings");
    }

    if format.is_json() {
        return print_json(&json!({
            "character_id": args.character,
            "settings": settings,
        }));
    }
    println!("{}", settings_table(&args.character, &settings));
    Ok(())
}
