//! Async store contracts consumed by the engine, with redb-backed and
//! in-memory implementations.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ChronicleError, Result};
use crate::models::{ChatLog, MemorySettings, SummaryRecord, Turn};
use crate::storage::Storage;

/// Durable home of conversation logs. Every method is atomic.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn get_log(&self, conversation_id: &str) -> Result<Option<ChatLog>>;

    /// Replace a conversation's whole log in one write.
    async fn replace_log(&self, conversation_id: &str, turns: Vec<Turn>) -> Result<()>;

    /// Append one turn, creating the log if needed. Returns the new log.
    async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<ChatLog>;

    async fn get_turn_at(&self, conversation_id: &str, index: usize) -> Result<Turn> {
        let log = self.get_log(conversation_id).await?.unwrap_or_default();
        log.get(index)
            .cloned()
            .ok_or_else(|| ChronicleError::NotFound {
                conversation_id: conversation_id.to_string(),
                index,
                len: log.len(),
            })
    }
}

#[async_trait]
pub trait MemorySettingsStore: Send + Sync {
    /// Settings for a character, created with defaults on first read.
    async fn load_settings(&self, character_id: &str) -> Result<MemorySettings>;

    async fn save_settings(&self, character_id: &str, settings: &MemorySettings) -> Result<()>;
}

#[async_trait]
pub trait SummaryArchive: Send + Sync {
    async fn archive_summary(&self, record: &SummaryRecord) -> Result<()>;

    /// Archived records for a conversation, oldest first.
    async fn list_summaries(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>>;

    async fn delete_summary(&self, conversation_id: &str, summary_id: &str) -> Result<bool>;
}

/// Run a blocking storage call off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await?
        .map_err(ChronicleError::persistence)
}

/// Store backed by the embedded redb database.
#[derive(Debug, Clone)]
pub struct RedbStore {
    storage: Arc<Storage>,
}

impl RedbStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(storage),
        }
    }

    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(Storage::new(path)?))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

#[async_trait]
impl LogStore for RedbStore {
    async fn get_log(&self, conversation_id: &str) -> Result<Option<ChatLog>> {
        let storage = self.storage.clone();
        let conversation_id = conversation_id.to_string();
        blocking(move || storage.chat_logs.get(&conversation_id)).await
    }

    async fn replace_log(&self, conversation_id: &str, turns: Vec<Turn>) -> Result<()> {
        let storage = self.storage.clone();
        let log = ChatLog::with_turns(conversation_id, turns);
        blocking(move || storage.chat_logs.save(&log)).await
    }

    async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<ChatLog> {
        let storage = self.storage.clone();
        let conversation_id = conversation_id.to_string();
        blocking(move || {
            let mut log = storage
                .chat_logs
                .get(&conversation_id)?
                .unwrap_or_else(|| ChatLog::new(&conversation_id));
            log.push(turn);
            storage.chat_logs.save(&log)?;
            Ok(log)
        })
        .await
    }
}

#[async_trait]
impl MemorySettingsStore for RedbStore {
    async fn load_settings(&self, character_id: &str) -> Result<MemorySettings> {
        let storage = self.storage.clone();
        let character_id = character_id.to_string();
        blocking(move || storage.memory_settings.get_or_create(&character_id)).await
    }

    async fn save_settings(&self, character_id: &str, settings: &MemorySettings) -> Result<()> {
        let storage = self.storage.clone();
        let character_id = character_id.to_string();
        let settings = settings.clone();
        blocking(move || storage.memory_settings.save(&character_id, &settings)).await
    }
}

#[async_trait]
impl SummaryArchive for RedbStore {
    async fn archive_summary(&self, record: &SummaryRecord) -> Result<()> {
        let storage = self.storage.clone();
        let record = record.clone();
        blocking(move || storage.summaries.add(&record)).await
    }

    async fn list_summaries(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>> {
        let storage = self.storage.clone();
        let conversation_id = conversation_id.to_string();
        blocking(move || storage.summaries.list(&conversation_id)).await
    }

    async fn delete_summary(&self, conversation_id: &str, summary_id: &str) -> Result<bool> {
        let storage = self.storage.clone();
        let conversation_id = conversation_id.to_string();
        let summary_id = summary_id.to_string();
        blocking(move || storage.summaries.delete(&conversation_id, &summary_id)).await
    }
}

/// Process-local store for tests and hosts that persist elsewhere.
///
/// Writes can be made to fail on demand to exercise persistence errors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    logs: Arc<RwLock<HashMap<String, ChatLog>>>,
    settings: Arc<RwLock<HashMap<String, MemorySettings>>>,
    summaries: Arc<RwLock<HashMap<String, Vec<SummaryRecord>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChronicleError::Persistence(
                "in-memory store is read-only".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for InMemoryStore {
    async fn get_log(&self, conversation_id: &str) -> Result<Option<ChatLog>> {
        Ok(self.logs.read().await.get(conversation_id).cloned())
    }

    async fn replace_log(&self, conversation_id: &str, turns: Vec<Turn>) -> Result<()> {
        self.check_writable()?;
        self.logs.write().await.insert(
            conversation_id.to_string(),
            ChatLog::with_turns(conversation_id, turns),
        );
        Ok(())
    }

    async fn append_turn(&self, conversation_id: &str, turn: Turn) -> Result<ChatLog> {
        self.check_writable()?;
        let mut logs = self.logs.write().await;
        let log = logs
            .entry(conversation_id.to_string())
            .or_insert_with(|| ChatLog::new(conversation_id));
        log.push(turn);
        Ok(log.clone())
    }
}

#[async_trait]
impl MemorySettingsStore for InMemoryStore {
    async fn load_settings(&self, character_id: &str) -> Result<MemorySettings> {
        let mut settings = self.settings.write().await;
        Ok(settings
            .entry(character_id.to_string())
            .or_default()
            .clone())
    }

    async fn save_settings(&self, character_id: &str, settings: &MemorySettings) -> Result<()> {
        self.check_writable()?;
        self.settings
            .write()
            .await
            .insert(character_id.to_string(), settings.clone());
        Ok(())
    }
}

#[async_trait]
impl SummaryArchive for InMemoryStore {
    async fn archive_summary(&self, record: &SummaryRecord) -> Result<()> {
        self.check_writable()?;
        let mut summaries = self.summaries.write().await;
        let records = summaries.entry(record.conversation_id.clone()).or_default();
        records.retain(|existing| existing.summary_id != record.summary_id);
        records.push(record.clone());
        records.sort_by_key(|r| r.timestamp);
        Ok(())
    }

    async fn list_summaries(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>> {
        Ok(self
            .summaries
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_summary(&self, conversation_id: &str, summary_id: &str) -> Result<bool> {
        self.check_writable()?;
        let mut summaries = self.summaries.write().await;
        let Some(records) = summaries.get_mut(conversation_id) else {
            return Ok(false);
        };
        let before = records.len();
        records.retain(|record| record.summary_id != summary_id);
        Ok(records.len() != before)
    }
}
