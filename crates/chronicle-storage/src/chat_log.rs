//! Chat log storage - byte-level API for conversation log persistence.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::sync::Arc;

const CHAT_LOGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("chat_logs");

/// Low-level chat log storage keyed by conversation id.
///
/// A conversation's whole ordered log is stored as one value, so replacing it
/// is a single-key write inside one transaction.
#[derive(Debug, Clone)]
pub struct ChatLogStorage {
    db: Arc<Database>,
}

impl ChatLogStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(CHAT_LOGS_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store raw log data, replacing whatever was there
    pub fn put_raw(&self, conversation_id: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHAT_LOGS_TABLE)?;
            table.insert(conversation_id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw log data by conversation id
    pub fn get_raw(&self, conversation_id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAT_LOGS_TABLE)?;

        if let Some(data) = table.get(conversation_id)? {
            Ok(Some(data.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all raw log data
    pub fn list_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAT_LOGS_TABLE)?;

        let mut logs = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            logs.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(logs)
    }

    /// Check if a log exists for the conversation
    pub fn exists(&self, conversation_id: &str) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAT_LOGS_TABLE)?;
        Ok(table.get(conversation_id)?.is_some())
    }

    /// Delete a conversation's log
    pub fn delete(&self, conversation_id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(CHAT_LOGS_TABLE)?;
            table.remove(conversation_id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Count stored conversations
    pub fn count(&self) -> Result<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHAT_LOGS_TABLE)?;
        Ok(table.len()? as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (ChatLogStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (ChatLogStorage::new(db).unwrap(), temp_dir)
    }

    #[test]
    fn test_put_and_get_raw() {
        let (storage, _temp_dir) = setup();

        storage.put_raw("conv-001", b"log data").unwrap();

        let retrieved = storage.get_raw("conv-001").unwrap();
        assert_eq!(retrieved.as_deref(), Some(&b"log data"[..]));
    }

    #[test]
    fn test_put_replaces_previous_value() {
        let (storage, _temp_dir) = setup();

        storage.put_raw("conv-001", b"first").unwrap();
        storage.put_raw("conv-001", b"second").unwrap();

        assert_eq!(storage.get_raw("conv-001").unwrap().unwrap(), b"second");
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[test]
    fn test_list_raw() {
        let (storage, _temp_dir) = setup();

        storage.put_raw("conv-001", b"data1").unwrap();
        storage.put_raw("conv-002", b"data2").unwrap();

        let logs = storage.list_raw().unwrap();
        assert_eq!(logs.len(), 2);
    }

    #[test]
    fn test_exists_and_delete() {
        let (storage, _temp_dir) = setup();

        assert!(!storage.exists("conv-001").unwrap());

        storage.put_raw("conv-001", b"data").unwrap();
        assert!(storage.exists("conv-001").unwrap());

        assert!(storage.delete("conv-001").unwrap());
        assert!(!storage.exists("conv-001").unwrap());
        assert!(!storage.delete("conv-001").unwrap());
    }
}
