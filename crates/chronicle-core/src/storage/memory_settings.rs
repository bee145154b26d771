//! Typed memory settings storage wrapper.

use crate::models::MemorySettings;
use anyhow::{Context, Result};
use redb::Database;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct MemorySettingsStorage {
    inner: chronicle_storage::MemorySettingsStorage,
}

impl MemorySettingsStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: chronicle_storage::MemorySettingsStorage::new(db)?,
        })
    }

    pub fn get(&self, character_id: &str) -> Result<Option<MemorySettings>> {
        match self.inner.get_for_character(character_id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).with_context(|| {
                format!("Corrupt memory settings for {character_id}")
            })?)),
            None => Ok(None),
        }
    }

    /// Get settings, creating and persisting defaults on first read.
    pub fn get_or_create(&self, character_id: &str) -> Result<MemorySettings> {
        if let Some(settings) = self.get(character_id)? {
            return Ok(settings);
        }
        let settings = MemorySettings::default();
        self.save(character_id, &settings)?;
        Ok(settings)
    }

    pub fn save(&self, character_id: &str, settings: &MemorySettings) -> Result<()> {
        let json = serde_json::to_vec(settings)?;
        self.inner.put_for_character(character_id, &json)
    }
}
