//! Chronicle Storage - Low-level storage layer for conversation logs
//!
//! This crate provides the persistence layer for Chronicle, using redb as the
//! embedded database. It exposes byte-level APIs so that the turn and settings
//! models can live in chronicle-core without a circular dependency.
//!
//! # Tables
//!
//! - `chat_logs` - One serialized log per conversation id
//! - `memory_settings` - Per-character compaction settings
//! - `conversation_summaries` - Archive of every summary produced by compaction
//!
//! Every write is a single redb write transaction, so a log replacement is
//! either fully committed or not visible at all.

pub mod chat_log;
pub mod memory_settings;
pub mod summary_archive;

mod simple_storage;

use anyhow::{Context, Result};
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use chat_log::ChatLogStorage;
pub use memory_settings::MemorySettingsStorage;
pub use simple_storage::SimpleStorage;
pub use summary_archive::SummaryArchiveStorage;

/// Central storage manager that initializes all storage subsystems
#[derive(Debug, Clone)]
pub struct Storage {
    db: Arc<Database>,
    pub chat_logs: ChatLogStorage,
    pub memory_settings: MemorySettingsStorage,
    pub summaries: SummaryArchiveStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = Database::create(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        let db = Arc::new(db);

        let chat_logs = ChatLogStorage::new(db.clone())?;
        let memory_settings = MemorySettingsStorage::new(db.clone())?;
        let summaries = SummaryArchiveStorage::new(db.clone())?;

        tracing::debug!(path = %path.display(), "Opened chronicle storage");

        Ok(Self {
            db,
            chat_logs,
            memory_settings,
            summaries,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
