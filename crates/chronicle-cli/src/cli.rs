use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "chronicle")]
#[command(version, about = "Chronicle - conversation log compaction and editing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (defaults to <data dir>/chronicle/chronicle.db)
    #[arg(long, global = true, env = "CHRONICLE_DB_PATH")]
    pub db_path: Option<String>,

    /// Config file (defaults to <config dir>/chronicle/config.toml)
    #[arg(long, global = true, env = "CHRONICLE_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Generation backend selection; unset values fall back to the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct ProviderArgs {
    /// Provider tag: gemini, openrouter or openai-compatible
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Model name
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Base URL (required for openai-compatible)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// API key (defaults to the provider's environment variable)
    #[arg(long, global = true)]
    pub api_key: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoleArg {
    User,
    Character,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a conversation with logical indices
    Show { conversation: String },

    /// Append a turn to a conversation
    Append {
        conversation: String,

        #[arg(long, value_enum, default_value = "user")]
        role: RoleArg,

        text: String,

        /// Run the automatic compaction check for this character afterwards
        #[arg(long)]
        character: Option<String>,
    },

    /// Replace the content of the turn at an index
    Edit {
        conversation: String,
        index: usize,
        text: String,
    },

    /// Delete the turn at an index
    Delete { conversation: String, index: usize },

    /// Regenerate the character turn at an index
    Regenerate {
        conversation: String,
        index: usize,

        /// Persona text sent as system context
        #[arg(long)]
        persona: Option<String>,

        /// Preset instructions sent as system context
        #[arg(long)]
        preset: Option<String>,
    },

    /// Compact a conversation
    Compact(CompactArgs),

    /// List a conversation's summaries, newest first
    Summaries {
        conversation: String,

        /// Delete the summary with this id instead
        #[arg(long, value_name = "SUMMARY_ID")]
        delete: Option<String>,
    },

    /// Show or change a character's compaction settings
    Settings(SettingsArgs),
}

#[derive(Args, Debug)]
pub struct CompactArgs {
    pub conversation: String,

    #[arg(long)]
    pub character: String,

    /// Skip the enabled, threshold and minimum-turn checks
    #[arg(long)]
    pub force: bool,

    /// First index to fold (implies --force)
    #[arg(long, requires = "end")]
    pub start: Option<usize>,

    /// Last index to fold, inclusive (implies --force)
    #[arg(long, requires = "start")]
    pub end: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SettingsArgs {
    pub character: String,

    #[arg(long, conflicts_with = "disable")]
    pub enable: bool,

    #[arg(long)]
    pub disable: bool,

    /// Non-summary characters that trigger compaction
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Target maximum summary length in characters
    #[arg(long)]
    pub max_chars: Option<usize>,
}

impl SettingsArgs {
    pub fn changes_anything(&self) -> bool {
        self.enable || self.disable || self.threshold.is_some() || self.max_chars.is_some()
    }
}
