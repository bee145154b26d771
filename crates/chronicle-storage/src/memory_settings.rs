//! Memory settings storage - per-character compaction configuration.

use crate::define_simple_storage;

/// Key prefix under which every character's settings are stored.
pub const MEMORY_SETTINGS_PREFIX: &str = "memory_settings_";

define_simple_storage! {
    /// Memory settings storage with byte-level API, keyed by character.
    pub struct MemorySettingsStorage { table: "memory_settings" }
}

impl MemorySettingsStorage {
    /// Storage key for a character's settings.
    pub fn key_for(character_id: &str) -> String {
        format!("{MEMORY_SETTINGS_PREFIX}{character_id}")
    }

    /// Store raw settings for a character.
    pub fn put_for_character(&self, character_id: &str, data: &[u8]) -> anyhow::Result<()> {
        self.put_raw(&Self::key_for(character_id), data)
    }

    /// Get raw settings for a character.
    pub fn get_for_character(&self, character_id: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.get_raw(&Self::key_for(character_id))
    }
}
