//! Typed summary archive storage wrapper.

use crate::models::SummaryRecord;
use anyhow::Result;
use redb::Database;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SummaryArchiveStorage {
    inner: chronicle_storage::SummaryArchiveStorage,
}

impl SummaryArchiveStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        Ok(Self {
            inner: chronicle_storage::SummaryArchiveStorage::new(db)?,
        })
    }

    pub fn add(&self, record: &SummaryRecord) -> Result<()> {
        let json = serde_json::to_vec(record)?;
        self.inner.put_record(
            &record.conversation_id,
            record.timestamp,
            &record.summary_id,
            &json,
        )
    }

    /// Records for one conversation, oldest first. Unreadable records and
    /// records filed under another conversation are skipped.
    pub fn list(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>> {
        let mut records = Vec::new();
        for bytes in self.inner.list_for_conversation(conversation_id)? {
            match serde_json::from_slice::<SummaryRecord>(&bytes) {
                Ok(record) if record.conversation_id == conversation_id => records.push(record),
                Ok(record) => {
                    tracing::warn!(
                        conversation_id,
                        found = %record.conversation_id,
                        "Skipping summary record of another conversation"
                    );
                }
                Err(err) => {
                    tracing::warn!(conversation_id, error = %err, "Skipping corrupt summary record");
                }
            }
        }
        Ok(records)
    }

    pub fn delete(&self, conversation_id: &str, summary_id: &str) -> Result<bool> {
        let Some(record) = self
            .list(conversation_id)?
            .into_iter()
            .find(|record| record.summary_id == summary_id)
        else {
            return Ok(false);
        };
        self.inner
            .delete_record(conversation_id, record.timestamp, &record.summary_id)
    }
}
