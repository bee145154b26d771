//! Typed chat log storage wrapper.

use crate::models::ChatLog;
use anyhow::{Context, Result};
use redb::Database;
use std::sync::Arc;

/// Typed wrapper around chronicle_storage::ChatLogStorage.
#[derive(Debug, Clone)]
pub struct ChatLogStorage {
    inner: chronicle_storage::ChatLogStorage,
}

impl ChatLogStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: chronicle_storage::ChatLogStorage::new(db)?,
        })
    }

    /// Get a conversation's log.
    pub fn get(&self, conversation_id: &str) -> Result<Option<ChatLog>> {
        if let Some(bytes) = self.inner.get_raw(conversation_id)? {
            let log = serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt chat log for {conversation_id}"))?;
            Ok(Some(log))
        } else {
            Ok(None)
        }
    }

    /// Save a log, replacing any previous one for the conversation.
    pub fn save(&self, log: &ChatLog) -> Result<()> {
        let json = serde_json::to_vec(log)?;
        self.inner.put_raw(&log.conversation_id, &json)
    }

    /// List every stored conversation id.
    pub fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .inner
            .list_raw()?
            .into_iter()
            .map(|(id, _)| id)
            .collect())
    }

    pub fn delete(&self, conversation_id: &str) -> Result<bool> {
        self.inner.delete(conversation_id)
    }

    pub fn exists(&self, conversation_id: &str) -> Result<bool> {
        self.inner.exists(conversation_id)
    }
}
