//! Compaction: fold an aging middle window of a log into one summary turn.

use std::ops::Range;
use std::sync::Arc;

use chronicle_ai::{
    CompletionRequest, LlmClient, LlmClientFactory, Message, ProviderConfig, Role,
};

use crate::config::EngineConfig;
use crate::error::{ChronicleError, Result};
use crate::locks::ConversationLocks;
use crate::models::{
    ChatLog, IndexedTurn, MemorySettings, SummaryRange, SummaryRecord, Turn, index_turns,
};
use crate::services::require_id;
use crate::store::{LogStore, MemorySettingsStore, SummaryArchive};

pub const SUMMARY_PROMPT: &str = include_str!("templates/summary_prompt.md");

/// Decides when a log needs compaction, picks the window, asks the generation
/// backend for a summary and splices it back.
#[derive(Clone)]
pub struct CompactionEngine {
    logs: Arc<dyn LogStore>,
    settings: Arc<dyn MemorySettingsStore>,
    archive: Arc<dyn SummaryArchive>,
    factory: Arc<dyn LlmClientFactory>,
    locks: ConversationLocks,
    config: EngineConfig,
}

impl CompactionEngine {
    pub fn new(
        logs: Arc<dyn LogStore>,
        settings: Arc<dyn MemorySettingsStore>,
        archive: Arc<dyn SummaryArchive>,
        factory: Arc<dyn LlmClientFactory>,
        locks: ConversationLocks,
    ) -> Self {
        Self {
            logs,
            settings,
            archive,
            factory,
            locks,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compact `log` if the character's settings call for it.
    ///
    /// Returns the new log on success and `log` itself whenever compaction is
    /// skipped. A generation failure, or a client that cannot be built for a
    /// reason other than configuration, is logged and also returns `log`
    /// unchanged without touching settings. Configuration problems are
    /// `Validation` errors; store failures are `Persistence` errors.
    ///
    /// `log` must match what the store holds for the conversation (when it
    /// holds anything); a stale copy is returned as-is rather than spliced
    /// over newer turns. If the stored log changes while the summary is being
    /// generated, the stored log wins and is returned.
    pub async fn check_and_summarize(
        &self,
        conversation_id: &str,
        character_id: &str,
        log: ChatLog,
        provider_config: &ProviderConfig,
    ) -> Result<ChatLog> {
        require_id(conversation_id, "conversation id")?;
        require_id(character_id, "character id")?;

        let mut settings = self.settings.load_settings(character_id).await?;
        if !settings.enabled {
            tracing::debug!(conversation_id, character_id, "Compaction disabled, skipping");
            return Ok(log);
        }

        let total_chars = log.non_summary_chars();
        if total_chars < settings.summary_threshold_chars {
            tracing::debug!(
                conversation_id,
                total_chars,
                threshold = settings.summary_threshold_chars,
                "Below compaction threshold, skipping"
            );
            return Ok(log);
        }

        if log.len() < self.config.min_turns {
            tracing::debug!(conversation_id, turns = log.len(), "Too few turns to compact");
            return Ok(log);
        }

        let Some(window) = self.default_window(&log.turns) else {
            tracing::debug!(conversation_id, turns = log.len(), "Fold window too small");
            return Ok(log);
        };

        let _guard = self.locks.lock(conversation_id).await;

        if let Some(stored) = self.logs.get_log(conversation_id).await?
            && stored.turns != log.turns
        {
            tracing::warn!(
                conversation_id,
                stored_turns = stored.len(),
                given_turns = log.len(),
                "Log changed since it was read, skipping compaction"
            );
            return Ok(log);
        }

        let client = match self.factory.create_client(provider_config) {
            Ok(client) => client,
            Err(err) if err.is_configuration() => return Err(err.into()),
            Err(err) => {
                tracing::warn!(
                    conversation_id,
                    provider = %provider_config.api_provider,
                    error = %err,
                    "Could not build generation client, keeping log uncompacted"
                );
                return Ok(log);
            }
        };
        let summary = match self
            .generate_summary(client.as_ref(), &log.turns[window.clone()], &settings)
            .await
        {
            Ok(summary) => summary,
            Err(err) => {
                tracing::warn!(
                    conversation_id,
                    provider = client.provider(),
                    window_start = window.start,
                    window_end = window.end,
                    error = %err,
                    "Summary generation failed, keeping log uncompacted"
                );
                return Ok(log);
            }
        };

        match self
            .commit(conversation_id, character_id, &log.turns, window, &summary, &mut settings)
            .await?
        {
            Some(turns) => Ok(ChatLog::with_turns(conversation_id, turns)),
            None => Ok(self.logs.get_log(conversation_id).await?.unwrap_or(log)),
        }
    }

    /// Compact the stored log now, skipping the enabled, threshold and
    /// minimum-turn gates.
    ///
    /// `range` is inclusive; it is clamped to the log and a range holding no
    /// turns is a no-op. Without a range the default window applies. Unlike
    /// automatic compaction, a generation failure is returned to the caller.
    pub async fn summarize_now(
        &self,
        conversation_id: &str,
        character_id: &str,
        provider_config: &ProviderConfig,
        range: Option<SummaryRange>,
    ) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;
        require_id(character_id, "character id")?;
        provider_config.validate()?;

        let _guard = self.locks.lock(conversation_id).await;

        let log = self.load_log(conversation_id).await?;
        let window = match range {
            Some(range) => self.explicit_window(&log.turns, range),
            None => self.default_window(&log.turns),
        };
        let Some(window) = window else {
            tracing::debug!(conversation_id, ?range, "Nothing to summarize in range");
            return Ok(log.indexed());
        };

        let mut settings = self.settings.load_settings(character_id).await?;
        let client = self.factory.create_client(provider_config)?;
        let summary = self
            .generate_summary(client.as_ref(), &log.turns[window.clone()], &settings)
            .await?;

        match self
            .commit(conversation_id, character_id, &log.turns, window, &summary, &mut settings)
            .await?
        {
            Some(turns) => Ok(index_turns(&turns)),
            None => Ok(self.load_log(conversation_id).await?.indexed()),
        }
    }

    /// Every summary known for a conversation, newest first: archived records
    /// plus summary turns in the log that were never archived.
    pub async fn list_summaries(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>> {
        require_id(conversation_id, "conversation id")?;

        let mut records = self.archive.list_summaries(conversation_id).await?;
        if let Some(log) = self.logs.get_log(conversation_id).await? {
            for turn in log.turns.iter().filter(|turn| turn.is_summary) {
                if records.iter().any(|r| r.summary_id == turn.id) {
                    continue;
                }
                records.push(SummaryRecord {
                    conversation_id: conversation_id.to_string(),
                    summary_id: turn.id.clone(),
                    summary: self.config.unwrap_summary(&turn.content).to_string(),
                    timestamp: turn.timestamp,
                    range: turn.summary_range.unwrap_or(SummaryRange::new(0, 0)),
                    character_id: None,
                });
            }
        }

        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records)
    }

    /// Remove the summary with id `summary_id` from both the log and the
    /// archive. The folded turns are not restored.
    pub async fn delete_summary(
        &self,
        conversation_id: &str,
        summary_id: &str,
    ) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;

        let _guard = self.locks.lock(conversation_id).await;

        let mut log = self
            .logs
            .get_log(conversation_id)
            .await?
            .unwrap_or_else(|| ChatLog::new(conversation_id));
        let before = log.len();
        log.turns
            .retain(|turn| !(turn.is_summary && turn.id == summary_id));
        let removed_from_log = log.len() != before;
        if removed_from_log {
            self.logs
                .replace_log(conversation_id, log.turns.clone())
                .await?;
        }

        let removed_from_archive = self
            .archive
            .delete_summary(conversation_id, summary_id)
            .await?;

        if !removed_from_log && !removed_from_archive {
            return Err(ChronicleError::validation(format!(
                "no summary {summary_id} in conversation {conversation_id}"
            )));
        }

        tracing::info!(
            conversation_id,
            summary_id,
            removed_from_log,
            removed_from_archive,
            "Deleted summary"
        );
        Ok(log.indexed())
    }

    /// `[preserve_head, N - preserve_tail)`, narrowed past any summary turn.
    fn default_window(&self, turns: &[Turn]) -> Option<Range<usize>> {
        let end = turns.len().checked_sub(self.config.preserve_tail)?;
        let start = self.config.preserve_head;
        if end <= start {
            return None;
        }
        let start = skip_summaries(turns, start, end);
        (end - start >= self.config.min_window).then_some(start..end)
    }

    fn explicit_window(&self, turns: &[Turn], range: SummaryRange) -> Option<Range<usize>> {
        let end = range.end.saturating_add(1).min(turns.len());
        let start = range.start;
        if end <= start {
            return None;
        }
        let start = skip_summaries(turns, start, end);
        (end > start).then_some(start..end)
    }

    fn build_prompt(&self, transcript: &str, max_chars: usize) -> Vec<Message> {
        if let Some(custom) = self.config.custom_prompt.as_ref().filter(|m| !m.is_empty()) {
            let mut messages = custom.clone();
            match messages.last_mut() {
                Some(last) if last.role == Role::User => {
                    last.content.push_str("\n\nConversation:\n");
                    last.content.push_str(transcript);
                }
                _ => messages.push(Message::user(format!("Conversation:\n{transcript}"))),
            }
            return messages;
        }

        let prompt = SUMMARY_PROMPT
            .trim_end()
            .replace("{max_chars}", &max_chars.to_string())
            .replace("{conversation}", transcript);
        vec![Message::user(prompt)]
    }

    async fn generate_summary(
        &self,
        client: &dyn LlmClient,
        window: &[Turn],
        settings: &MemorySettings,
    ) -> chronicle_ai::Result<String> {
        let transcript = window
            .iter()
            .map(Turn::render)
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut request =
            CompletionRequest::new(self.build_prompt(&transcript, settings.summary_max_chars));
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.summary_max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let summary = client.generate(request).await?;
        Ok(summary.trim().to_string())
    }

    /// Splice the summary in and persist log, settings and archive record.
    ///
    /// Returns `None` without writing anything when the stored log no longer
    /// matches `turns`. Only the log write is fatal; settings and archive
    /// failures are logged.
    async fn commit(
        &self,
        conversation_id: &str,
        character_id: &str,
        turns: &[Turn],
        window: Range<usize>,
        summary: &str,
        settings: &mut MemorySettings,
    ) -> Result<Option<Vec<Turn>>> {
        if let Some(stored) = self.logs.get_log(conversation_id).await?
            && stored.turns != turns
        {
            tracing::warn!(
                conversation_id,
                stored_turns = stored.len(),
                snapshot_turns = turns.len(),
                "Log changed during summary generation, discarding summary"
            );
            return Ok(None);
        }

        let range = SummaryRange::new(window.start, window.end - 1);
        let summary_turn = Turn::summary(self.config.wrap_summary(summary), range);

        let mut new_turns = Vec::with_capacity(turns.len() - window.len() + 1);
        new_turns.extend_from_slice(&turns[..window.start]);
        new_turns.push(summary_turn.clone());
        new_turns.extend_from_slice(&turns[window.end..]);

        self.logs
            .replace_log(conversation_id, new_turns.clone())
            .await?;

        settings.last_summarized_at = summary_turn.timestamp;
        if let Err(err) = self.settings.save_settings(character_id, settings).await {
            tracing::warn!(character_id, error = %err, "Failed to record compaction time");
        }

        let record = SummaryRecord {
            conversation_id: conversation_id.to_string(),
            summary_id: summary_turn.id.clone(),
            summary: summary.to_string(),
            timestamp: summary_turn.timestamp,
            range,
            character_id: Some(character_id.to_string()),
        };
        if let Err(err) = self.archive.archive_summary(&record).await {
            tracing::warn!(conversation_id, error = %err, "Failed to archive summary");
        }

        tracing::info!(
            conversation_id,
            window_start = range.start,
            window_end = range.end,
            turns_before = turns.len(),
            turns_after = new_turns.len(),
            "Compacted conversation log"
        );

        Ok(Some(new_turns))
    }

    async fn load_log(&self, conversation_id: &str) -> Result<ChatLog> {
        self.logs
            .get_log(conversation_id)
            .await?
            .ok_or_else(|| {
                ChronicleError::validation(format!("conversation {conversation_id} not found"))
            })
    }
}

/// Move `start` past the last summary turn in `start..end`; summaries are
/// never folded again.
fn skip_summaries(turns: &[Turn], start: usize, end: usize) -> usize {
    turns[start..end]
        .iter()
        .rposition(|turn| turn.is_summary)
        .map(|pos| start + pos + 1)
        .unwrap_or(start)
}
