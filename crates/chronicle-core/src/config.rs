//! Engine configuration: fold window geometry and summary prompt.

use chronicle_ai::Message;

pub const SUMMARY_HEADER: &str = "--- CONVERSATION SUMMARY (AI-GENERATED, NOT VISIBLE TO USER) ---";
pub const SUMMARY_FOOTER: &str = "--- END OF SUMMARY ---";

/// Geometry and prompt settings shared by every compaction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Turns at the start of the log never folded.
    pub preserve_head: usize,
    /// Turns at the end of the log never folded.
    pub preserve_tail: usize,
    /// Logs shorter than this are never compacted automatically.
    pub min_turns: usize,
    /// Smallest window worth summarizing.
    pub min_window: usize,
    pub summary_header: String,
    pub summary_footer: String,
    pub temperature: Option<f32>,
    pub summary_max_tokens: Option<u32>,
    /// Replaces the built-in instructions. The transcript is appended to the
    /// last user message, or sent as a new user message if the last one is
    /// not from the user.
    pub custom_prompt: Option<Vec<Message>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preserve_head: 3,
            preserve_tail: 3,
            min_turns: 10,
            min_window: 4,
            summary_header: SUMMARY_HEADER.to_string(),
            summary_footer: SUMMARY_FOOTER.to_string(),
            temperature: None,
            summary_max_tokens: None,
            custom_prompt: None,
        }
    }
}

impl EngineConfig {
    /// Frame generated text so prompt assembly can recognize it.
    pub fn wrap_summary(&self, summary: &str) -> String {
        format!("{}\n{}\n{}", self.summary_header, summary, self.summary_footer)
    }

    /// Inverse of [`wrap_summary`](Self::wrap_summary); text without the
    /// framing (for example after a manual edit) is returned trimmed.
    pub fn unwrap_summary<'a>(&self, content: &'a str) -> &'a str {
        content
            .trim()
            .strip_prefix(self.summary_header.as_str())
            .and_then(|rest| rest.strip_suffix(self.summary_footer.as_str()))
            .map(str::trim)
            .unwrap_or_else(|| content.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_and_unwrap() {
        let config = EngineConfig::default();
        let wrapped = config.wrap_summary("They agreed to meet at dawn.");

        assert_eq!(
            wrapped,
            "--- CONVERSATION SUMMARY (AI-GENERATED, NOT VISIBLE TO USER) ---\nThey agreed to meet at dawn.\n--- END OF SUMMARY ---"
        );
        assert_eq!(config.unwrap_summary(&wrapped), "They agreed to meet at dawn.");
        assert_eq!(config.unwrap_summary("  edited by hand "), "edited by hand");
    }
}
