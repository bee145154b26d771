//! Per-character compaction settings.

use serde::{Deserialize, Serialize};

use crate::error::{ChronicleError, Result};

pub const DEFAULT_SUMMARY_THRESHOLD_CHARS: usize = 6000;
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 1000;

/// Compaction settings for one character.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemorySettings {
    /// Compaction runs only when enabled.
    #[serde(default)]
    pub enabled: bool,
    /// Non-summary characters that trigger compaction.
    #[serde(default = "default_threshold")]
    pub summary_threshold_chars: usize,
    /// Target maximum length requested for a summary.
    #[serde(default = "default_max_chars")]
    pub summary_max_chars: usize,
    /// Unix milliseconds of the last successful compaction, 0 if never.
    #[serde(default)]
    pub last_summarized_at: i64,
}

fn default_threshold() -> usize {
    DEFAULT_SUMMARY_THRESHOLD_CHARS
}

fn default_max_chars() -> usize {
    DEFAULT_SUMMARY_MAX_CHARS
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            enabled: false,
            summary_threshold_chars: DEFAULT_SUMMARY_THRESHOLD_CHARS,
            summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS,
            last_summarized_at: 0,
        }
    }
}

impl MemorySettings {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.summary_threshold_chars == 0 {
            return Err(ChronicleError::validation(
                "summary_threshold_chars must be greater than zero",
            ));
        }
        if self.summary_max_chars == 0 {
            return Err(ChronicleError::validation(
                "summary_max_chars must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = MemorySettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.summary_threshold_chars, 6000);
        assert_eq!(settings.summary_max_chars, 1000);
        assert_eq!(settings.last_summarized_at, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings: MemorySettings = serde_json::from_str(r#"{"enabled": true}"#).unwrap();
        assert_eq!(settings, MemorySettings::enabled());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let settings = MemorySettings {
            summary_threshold_chars: 0,
            ..MemorySettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ChronicleError::Validation(_))
        ));

        let settings = MemorySettings {
            summary_max_chars: 0,
            ..MemorySettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
