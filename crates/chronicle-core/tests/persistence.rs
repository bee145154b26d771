mod common;

use std::sync::Arc;

use chronicle_ai::{MockLlmClient, MockLlmClientFactory, MockStep};
use chronicle_core::{Chronicle, EngineConfig, LogStore, MemorySettings, MemorySettingsStore};
use common::{CHARACTER, CONVERSATION, gemini, sized_turns};
use tempfile::tempdir;

#[tokio::test]
async fn test_compaction_survives_reopen() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("chronicle.db");
    let mock = MockLlmClient::from_steps("mock-model", vec![MockStep::text("They made a plan.")]);
    let factory = Arc::new(MockLlmClientFactory::new(mock.clone()));

    let compacted = {
        let chronicle = Chronicle::open(&db_path, factory.clone(), EngineConfig::default()).unwrap();
        chronicle
            .settings
            .save_settings(CHARACTER, &MemorySettings::enabled())
            .await
            .unwrap();

        let mut log = None;
        for turn in sized_turns(12, 600) {
            log = Some(chronicle.logs.append_turn(CONVERSATION, turn).await.unwrap());
        }
        let log = log.unwrap();
        assert_eq!(log.len(), 12);

        chronicle
            .compaction
            .check_and_summarize(CONVERSATION, CHARACTER, log, &gemini())
            .await
            .unwrap()
    };
    assert_eq!(compacted.len(), 7);

    let chronicle = Chronicle::open(&db_path, factory, EngineConfig::default()).unwrap();
    let stored = chronicle.logs.get_log(CONVERSATION).await.unwrap().unwrap();
    assert_eq!(stored, compacted);

    let settings = chronicle.settings.load_settings(CHARACTER).await.unwrap();
    assert!(settings.enabled);
    assert_eq!(settings.last_summarized_at, compacted.turns[3].timestamp);

    let summaries = chronicle.compaction.list_summaries(CONVERSATION).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].summary, "They made a plan.");

    let view = chronicle.mutation.delete_turn(CONVERSATION, 0).await.unwrap();
    assert_eq!(view.len(), 6);
    assert_eq!(view[0].turn.id, "t1");
}
