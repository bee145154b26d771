//! Chronicle Core - conversation log consistency and compaction
//!
//! A conversation is an ordered log of turns. Two kinds of operation rewrite
//! it:
//!
//! - [`CompactionEngine`] folds an aging middle window into one generated
//!   summary turn once the log grows past a per-character threshold.
//! - [`MutationService`] edits, deletes or regenerates one turn addressed by
//!   its logical index.
//!
//! Logical indices are positions in the current log and are never stored.
//! Every rewriting operation returns the whole freshly indexed log, and both
//! services serialize on a shared [`ConversationLocks`] registry so a
//! compaction and a mutation of the same conversation never interleave.

pub mod config;
pub mod error;
pub mod locks;
pub mod models;
pub mod services;
pub mod storage;
pub mod store;

pub use config::EngineConfig;
pub use error::{ChronicleError, ErrorKind, Result};
pub use locks::ConversationLocks;
pub use models::*;
pub use services::{CompactionEngine, MutationService, RegenerationContext};
pub use store::{InMemoryStore, LogStore, MemorySettingsStore, RedbStore, SummaryArchive};

use std::path::Path;
use std::sync::Arc;

use chronicle_ai::LlmClientFactory;

/// Both services wired to one store and one lock registry.
#[derive(Clone)]
pub struct Chronicle {
    pub logs: Arc<dyn LogStore>,
    pub settings: Arc<dyn MemorySettingsStore>,
    pub compaction: CompactionEngine,
    pub mutation: MutationService,
}

impl Chronicle {
    pub fn new<S>(store: Arc<S>, factory: Arc<dyn LlmClientFactory>, config: EngineConfig) -> Self
    where
        S: LogStore + MemorySettingsStore + SummaryArchive + 'static,
    {
        let locks = ConversationLocks::new();
        let compaction = CompactionEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            factory.clone(),
            locks.clone(),
        )
        .with_config(config);
        let mutation = MutationService::new(store.clone(), factory, locks);

        Self {
            logs: store.clone(),
            settings: store,
            compaction,
            mutation,
        }
    }

    /// Open the redb database at `path`.
    pub fn open(
        path: impl AsRef<Path>,
        factory: Arc<dyn LlmClientFactory>,
        config: EngineConfig,
    ) -> anyhow::Result<Self> {
        let store = Arc::new(RedbStore::open(path)?);
        tracing::info!("Initializing Chronicle");
        Ok(Self::new(store, factory, config))
    }
}
