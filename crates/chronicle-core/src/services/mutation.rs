//! Point mutation of single turns, addressed by logical index.

use std::sync::Arc;

use chronicle_ai::{CompletionRequest, LlmClientFactory, Message, ProviderConfig};

use crate::error::{ChronicleError, Result};
use crate::locks::ConversationLocks;
use crate::models::{ChatLog, IndexedTurn, Turn, TurnRole};
use crate::services::require_id;
use crate::store::LogStore;

/// Persona and preset text supplied by the host for regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegenerationContext {
    pub persona: Option<String>,
    pub preset: Option<String>,
}

impl RegenerationContext {
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = Some(persona.into());
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// Single leading system message, if any context is set.
    fn system_message(&self) -> Option<Message> {
        let parts: Vec<&str> = [self.persona.as_deref(), self.preset.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        (!parts.is_empty()).then(|| Message::system(parts.join("\n\n")))
    }
}

/// Edit, delete and regenerate turns, returning a fresh indexed view after
/// every change. Indices held from an earlier view must not be reused.
#[derive(Clone)]
pub struct MutationService {
    logs: Arc<dyn LogStore>,
    factory: Arc<dyn LlmClientFactory>,
    locks: ConversationLocks,
}

impl MutationService {
    pub fn new(
        logs: Arc<dyn LogStore>,
        factory: Arc<dyn LlmClientFactory>,
        locks: ConversationLocks,
    ) -> Self {
        Self {
            logs,
            factory,
            locks,
        }
    }

    /// Append `turn` to the end of the log, creating the log if needed.
    ///
    /// Waits for any compaction or mutation of the conversation in flight, so
    /// a turn written mid-compaction is never lost to the summary splice.
    pub async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<ChatLog> {
        require_id(conversation_id, "conversation id")?;

        let _guard = self.locks.lock(conversation_id).await;
        let turn_id = turn.id.clone();
        let log = self.logs.append_turn(conversation_id, turn).await?;

        tracing::info!(conversation_id, %turn_id, turns = log.len(), "Appended turn");
        Ok(log)
    }

    /// Replace the content of the turn at `index`. Role, id, timestamp and
    /// the summary flag are kept; summary turns may be edited too.
    pub async fn edit_turn(
        &self,
        conversation_id: &str,
        index: usize,
        new_content: impl Into<String>,
    ) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;
        let new_content = new_content.into();

        let _guard = self.locks.lock(conversation_id).await;
        let mut log = self.load_log(conversation_id).await?;
        check_index(&log, index)?;

        log.turns[index].content = new_content;
        self.logs
            .replace_log(conversation_id, log.turns.clone())
            .await?;

        tracing::info!(conversation_id, index, "Edited turn");
        Ok(log.indexed())
    }

    /// Remove the turn at `index`; later turns shift down by one.
    pub async fn delete_turn(&self, conversation_id: &str, index: usize) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;

        let _guard = self.locks.lock(conversation_id).await;
        let mut log = self.load_log(conversation_id).await?;
        check_index(&log, index)?;

        let removed = log.turns.remove(index);
        self.logs
            .replace_log(conversation_id, log.turns.clone())
            .await?;

        tracing::info!(
            conversation_id,
            index,
            turn_id = %removed.id,
            remaining = log.len(),
            "Deleted turn"
        );
        Ok(log.indexed())
    }

    /// Generate new content for the character turn at `index` from the turns
    /// before it. One attempt; on failure the log is left unchanged.
    pub async fn regenerate_turn(
        &self,
        conversation_id: &str,
        index: usize,
        provider_config: &ProviderConfig,
        context: &RegenerationContext,
    ) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;
        provider_config.validate()?;

        let _guard = self.locks.lock(conversation_id).await;
        let mut log = self.load_log(conversation_id).await?;
        check_index(&log, index)?;

        let target = &log.turns[index];
        if target.is_summary {
            return Err(ChronicleError::validation(format!(
                "turn {index} is a summary and cannot be regenerated"
            )));
        }
        if target.role != TurnRole::Character {
            return Err(ChronicleError::validation(format!(
                "turn {index} is a {} turn; only character turns can be regenerated",
                target.role
            )));
        }

        let client = self.factory.create_client(provider_config)?;
        let request = CompletionRequest::new(regeneration_prompt(context, &log.turns[..index]));
        let content = client.generate(request).await.map_err(|err| {
            tracing::warn!(
                conversation_id,
                index,
                provider = client.provider(),
                error = %err,
                "Regeneration failed"
            );
            ChronicleError::from(err)
        })?;

        log.turns[index].content = content.trim().to_string();
        self.logs
            .replace_log(conversation_id, log.turns.clone())
            .await?;

        tracing::info!(conversation_id, index, provider = client.provider(), "Regenerated turn");
        Ok(log.indexed())
    }

    /// Current indexed view of a conversation without changing it.
    pub async fn get_indexed_view(&self, conversation_id: &str) -> Result<Vec<IndexedTurn>> {
        require_id(conversation_id, "conversation id")?;
        Ok(self.load_log(conversation_id).await?.indexed())
    }

    /// Current logical index of the turn with `turn_id`.
    pub async fn find_turn_index(
        &self,
        conversation_id: &str,
        turn_id: &str,
    ) -> Result<Option<usize>> {
        require_id(conversation_id, "conversation id")?;
        Ok(self.load_log(conversation_id).await?.position_of(turn_id))
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

fn check_index(log: &ChatLog, index: usize) -> Result<()> {
    if index >= log.len() {
        return Err(ChronicleError::NotFound {
            conversation_id: log.conversation_id.clone(),
            index,
            len: log.len(),
        });
    }
    Ok(())
}

fn regeneration_prompt(context: &RegenerationContext, history: &[Turn]) -> Vec<Message> {
    context
        .system_message()
        .into_iter()
        .chain(history.iter().map(|turn| match turn.role {
            TurnRole::User => Message::user(turn.content.clone()),
            TurnRole::Character => Message::assistant(turn.content.clone()),
        }))
        .collect()
}
