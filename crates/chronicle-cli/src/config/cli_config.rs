//! CLI configuration file support
//!
//! Loads configuration from ~/.config/chronicle/config.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chronicle_ai::{LlmProvider, ProviderConfig};
use serde::{Deserialize, Serialize};

use crate::cli::ProviderArgs;

const DEFAULT_PROVIDER: &str = "gemini";

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
    /// API key settings
    #[serde(default)]
    pub api_keys: ApiKeysConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default database path
    pub db_path: Option<String>,
    /// Directory for daily log files; logs go to stderr when unset
    pub log_dir: Option<String>,
    /// Provider tag used for generation
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Base URL for openai-compatible providers
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// API key configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiKeysConfig {
    pub gemini: Option<String>,
    pub openrouter: Option<String>,
    pub openai: Option<String>,
}

impl ApiKeysConfig {
    fn for_provider(&self, provider: LlmProvider) -> Option<&String> {
        match provider {
            LlmProvider::Gemini => self.gemini.as_ref(),
            LlmProvider::OpenRouter => self.openrouter.as_ref(),
            LlmProvider::OpenAICompatible => self.openai.as_ref(),
        }
    }
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path; a missing file yields defaults.
    pub fn load_from_path(path: Option<PathBuf>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::parse_file(&path)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.toml"))
    }

    /// Copy configured API keys into the provider environment variables that
    /// are not already set.
    ///
    /// # Safety
    /// This modifies environment variables which can cause issues in multi-threaded contexts.
    /// Should only be called early in main() before spawning threads.
    pub fn apply_api_key_env(&self) {
        for provider in LlmProvider::ALL {
            let Some(key) = self.api_keys.for_provider(provider) else {
                continue;
            };
            if std::env::var(provider.api_key_env()).is_err() {
                // SAFETY: Called early in main() before spawning threads
                unsafe { std::env::set_var(provider.api_key_env(), key) };
            }
        }
    }

    /// Build the provider configuration for generating commands.
    ///
    /// Command-line values win over the config file; the key falls back to the
    /// provider's environment variable.
    pub fn provider_config(&self, args: &ProviderArgs) -> ProviderConfig {
        self.provider_config_with(args, |name| std::env::var(name).ok())
    }

    fn provider_config_with(
        &self,
        args: &ProviderArgs,
        env: impl Fn(&str) -> Option<String>,
    ) -> ProviderConfig {
        let tag = args
            .provider
            .clone()
            .or_else(|| self.default.provider.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let mut config = ProviderConfig::new(tag.clone());
        config.model = args.model.clone().or_else(|| self.default.model.clone());
        config.endpoint = args.endpoint.clone().or_else(|| self.default.endpoint.clone());
        config.timeout_secs = self.default.timeout_secs;

        // An unknown tag gets no key; the core reports it as unsupported.
        let api_key = args.api_key.clone().or_else(|| {
            tag.parse::<LlmProvider>()
                .ok()
                .and_then(|provider| env(provider.api_key_env()))
        });
        if let Some(api_key) = api_key {
            config = config.with_api_key(api_key);
        }
        config
    }
}
