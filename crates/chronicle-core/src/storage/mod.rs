//! Storage layer with typed wrappers around chronicle-storage.
//!
//! This module converts between the byte-level APIs of chronicle-storage and
//! the models in this crate. Values are stored as JSON.

pub mod chat_log;
pub mod memory_settings;
pub mod summary_archive;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use chat_log::ChatLogStorage;
pub use memory_settings::MemorySettingsStorage;
pub use summary_archive::SummaryArchiveStorage;

/// Typed access to every table.
#[derive(Debug, Clone)]
pub struct Storage {
    db: Arc<Database>,
    pub chat_logs: ChatLogStorage,
    pub memory_settings: MemorySettingsStorage,
    pub summaries: SummaryArchiveStorage,
}

impl Storage {
    /// Open (or create) the database at `path` and initialize all tables.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let raw = chronicle_storage::Storage::new(path)?;
        Self::from_db(raw.get_db())
    }

    pub fn from_db(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            chat_logs: ChatLogStorage::new(db.clone())?,
            memory_settings: MemorySettingsStorage::new(db.clone())?,
            summaries: SummaryArchiveStorage::new(db.clone())?,
            db,
        })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
