//! Summary archive storage - every summary compaction has ever produced.
//!
//! Records are keyed `<conversation_id>\0<timestamp_ms>\0<summary_id>` with the
//! timestamp zero-padded, so a prefix scan returns one conversation's
//! summaries in chronological order. The NUL separator keeps a conversation
//! id from matching the prefix of a longer one such as `room` and `room/42`.

use crate::define_simple_storage;
use anyhow::Result;

const SEPARATOR: char = '\0';

define_simple_storage! {
    /// Summary archive storage with byte-level API.
    pub struct SummaryArchiveStorage { table: "conversation_summaries" }
}

impl SummaryArchiveStorage {
    fn conversation_prefix(conversation_id: &str) -> String {
        format!("{conversation_id}{SEPARATOR}")
    }

    /// Storage key for one summary record.
    pub fn record_key(conversation_id: &str, timestamp_ms: i64, summary_id: &str) -> String {
        format!(
            "{}{:020}{SEPARATOR}{summary_id}",
            Self::conversation_prefix(conversation_id),
            timestamp_ms.max(0)
        )
    }

    /// Store a raw summary record.
    pub fn put_record(
        &self,
        conversation_id: &str,
        timestamp_ms: i64,
        summary_id: &str,
        data: &[u8],
    ) -> Result<()> {
        self.put_raw(&Self::record_key(conversation_id, timestamp_ms, summary_id), data)
    }

    /// List raw records for one conversation, oldest first.
    pub fn list_for_conversation(&self, conversation_id: &str) -> Result<Vec<Vec<u8>>> {
        let entries = self.list_prefixed_raw(&Self::conversation_prefix(conversation_id))?;
        Ok(entries.into_iter().map(|(_, data)| data).collect())
    }

    /// Delete one record, returns true if it existed.
    pub fn delete_record(
        &self,
        conversation_id: &str,
        timestamp_ms: i64,
        summary_id: &str,
    ) -> Result<bool> {
        self.delete(&Self::record_key(conversation_id, timestamp_ms, summary_id))
    }
}
