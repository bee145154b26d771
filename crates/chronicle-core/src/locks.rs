//! Per-conversation serialization.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Registry of one async mutex per conversation id.
///
/// Compaction and mutation share a registry so read-modify-write cycles on
/// the same log never interleave. Different conversations never contend.
/// An entry lives only while someone holds or waits on it.
#[derive(Debug, Clone, Default)]
pub struct ConversationLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one conversation, released on drop.
#[derive(Debug)]
pub struct ConversationGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
    key: String,
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map's own handle left: nobody holds or waits on it.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`.
    pub async fn lock(&self, conversation_id: &str) -> ConversationGuard {
        let mutex = self
            .locks
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        ConversationGuard {
            guard: Some(mutex.lock_owned().await),
            locks: self.locks.clone(),
            key: conversation_id.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
