mod common;

use std::sync::Arc;
use std::time::Duration;

use chronicle_ai::{AiError, LlmClient, LlmClientFactory, MockStep, ProviderConfig};
use chronicle_core::{
    ChatLog, Chronicle, ChronicleError, EngineConfig, ErrorKind, InMemoryStore, LogStore,
    MemorySettings, MemorySettingsStore, RedbStore, SummaryArchive, SummaryRange, SummaryRecord,
    Turn,
};
use common::*;

const SUMMARY: &str = "Mira and the user rebuilt the lighthouse lamp and agreed to sail at dawn.";

#[tokio::test]
async fn test_fewer_than_ten_turns_is_unchanged() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(9, 1_000);
    seed(&h.store, &turns).await;

    let log = ChatLog::with_turns(CONVERSATION, turns.clone());
    let result = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(result, log);
    assert_eq!(stored_turns(&h.store).await, turns);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_below_threshold_is_unchanged() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 100);
    seed(&h.store, &turns).await;

    let log = ChatLog::with_turns(CONVERSATION, turns);
    let result = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(result, log);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_disabled_settings_skip_compaction() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let log = ChatLog::with_turns(CONVERSATION, turns);
    let result = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(result, log);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_twelve_turns_fold_middle_window() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let result = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, turns.clone()),
            &gemini(),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 7);
    let result_ids = ids(&result.turns);
    assert_eq!(&result_ids[..3], &["t0", "t1", "t2"]);
    assert_eq!(&result_ids[4..], &["t9", "t10", "t11"]);
    assert_eq!(&result.turns[..3], &turns[..3]);
    assert_eq!(&result.turns[4..], &turns[9..]);

    let summary = &result.turns[3];
    assert!(summary.is_summary);
    assert_eq!(summary.role, chronicle_core::TurnRole::User);
    assert_eq!(summary.summary_range, Some(SummaryRange { start: 3, end: 8 }));
    assert_eq!(
        summary.content,
        format!(
            "--- CONVERSATION SUMMARY (AI-GENERATED, NOT VISIBLE TO USER) ---\n{SUMMARY}\n--- END OF SUMMARY ---"
        )
    );

    assert_eq!(stored_turns(&h.store).await, result.turns);

    let settings = h.store.load_settings(CHARACTER).await.unwrap();
    assert_eq!(settings.last_summarized_at, summary.timestamp);

    let archived = h.store.list_summaries(CONVERSATION).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].summary_id, summary.id);
    assert_eq!(archived[0].summary, SUMMARY);
    assert_eq!(archived[0].range, SummaryRange::new(3, 8));
    assert_eq!(archived[0].character_id.as_deref(), Some(CHARACTER));

    let requests = h.mock.requests().await;
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].messages[0].content;
    assert!(prompt.contains("approximately 1000 characters"));
    assert!(prompt.contains(&format!("Character: {}", turns[3].content)));
    assert!(prompt.contains(&format!("User: {}", turns[8].content)));
    assert!(!prompt.contains(&turns[2].content));
    assert!(!prompt.contains(&turns[9].content));
}

#[tokio::test]
async fn test_compaction_is_idempotent() {
    let h = harness(vec![MockStep::text(SUMMARY), MockStep::text("second summary")]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let first = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, turns),
            &gemini(),
        )
        .await
        .unwrap();
    let second = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, first.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(second, first);
    assert_eq!(second.len(), 7);
    assert_eq!(h.mock.call_count().await, 1);
}

#[tokio::test]
async fn test_generation_failure_returns_original_log() {
    for step in [MockStep::error("upstream 500"), MockStep::empty()] {
        let h = harness(vec![step]);
        enable_compaction(&h.store).await;
        let turns = sized_turns(12, 600);
        seed(&h.store, &turns).await;

        let log = ChatLog::with_turns(CONVERSATION, turns.clone());
        let result = h
            .chronicle
            .compaction
            .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
            .await
            .unwrap();

        assert_eq!(result, log);
        assert_eq!(stored_turns(&h.store).await, turns);
        assert_eq!(
            h.store.load_settings(CHARACTER).await.unwrap().last_summarized_at,
            0
        );
        assert!(h.store.list_summaries(CONVERSATION).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_unsupported_provider_is_validation_error() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let err = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, turns.clone()),
            &ProviderConfig::new("carrier-pigeon").with_api_key("k"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(stored_turns(&h.store).await, turns);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_missing_ids_are_validation_errors() {
    let h = harness(vec![]);
    let log = ChatLog::with_turns(CONVERSATION, sized_turns(12, 600));

    let err = h
        .chronicle
        .compaction
        .check_and_summarize("", CHARACTER, log.clone(), &gemini())
        .await
        .unwrap_err();
    assert!(matches!(err, ChronicleError::Validation(_)));

    let err = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, " ", log, &gemini())
        .await
        .unwrap_err();
    assert!(matches!(err, ChronicleError::Validation(_)));
}

#[tokio::test]
async fn test_existing_summary_is_never_refolded() {
    let h = harness(vec![MockStep::text("newer summary")]);
    enable_compaction(&h.store).await;

    let mut turns = sized_turns(14, 700);
    turns[3] = Turn::summary("older summary", SummaryRange::new(3, 9))
        .with_id("s0")
        .with_timestamp(500);
    seed(&h.store, &turns).await;

    let result = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, turns.clone()),
            &gemini(),
        )
        .await
        .unwrap();

    // Window 3..11 narrows to 4..11 past the old summary.
    assert_eq!(result.len(), 14 - 7 + 1);
    assert_eq!(&result.turns[..4], &turns[..4]);
    assert_eq!(result.turns[4].summary_range, Some(SummaryRange::new(4, 10)));
    assert_eq!(&result.turns[5..], &turns[11..]);

    let prompt = &h.mock.requests().await[0].messages[0].content;
    assert!(!prompt.contains("older summary"));
}

#[tokio::test]
async fn test_stale_log_is_not_spliced() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    let mut stored = turns.clone();
    stored.push(Turn::user("appended after the caller read the log"));
    seed(&h.store, &stored).await;

    let log = ChatLog::with_turns(CONVERSATION, turns);
    let result = h
        .chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(result, log);
    assert_eq!(stored_turns(&h.store).await, stored);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_compacts_log_the_store_has_never_seen() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;

    let result = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, sized_turns(12, 600)),
            &gemini(),
        )
        .await
        .unwrap();

    assert_eq!(result.len(), 7);
    assert_eq!(stored_turns(&h.store).await, result.turns);
}

#[tokio::test]
async fn test_summarize_now_with_explicit_range() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    let turns = sized_turns(5, 50);
    seed(&h.store, &turns).await;

    let view = h
        .chronicle
        .compaction
        .summarize_now(CONVERSATION, CHARACTER, &gemini(), Some(SummaryRange::new(0, 2)))
        .await
        .unwrap();

    assert_eq!(view.len(), 3);
    assert!(view[0].turn.is_summary);
    assert_eq!(view[0].turn.summary_range, Some(SummaryRange::new(0, 2)));
    assert_eq!(view[1].turn.id, "t3");
    assert_eq!(view[2].logical_index, 2);
    assert_eq!(view[2].turn.id, "t4");
}

#[tokio::test]
async fn test_summarize_now_clamps_range_end() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    let turns = sized_turns(5, 50);
    seed(&h.store, &turns).await;

    let view = h
        .chronicle
        .compaction
        .summarize_now(CONVERSATION, CHARACTER, &gemini(), Some(SummaryRange::new(2, 100)))
        .await
        .unwrap();

    assert_eq!(view.len(), 3);
    assert_eq!(view[2].turn.summary_range, Some(SummaryRange::new(2, 4)));
}

#[tokio::test]
async fn test_summarize_now_empty_range_is_noop() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    let turns = sized_turns(5, 50);
    seed(&h.store, &turns).await;

    let view = h
        .chronicle
        .compaction
        .summarize_now(CONVERSATION, CHARACTER, &gemini(), Some(SummaryRange::new(7, 9)))
        .await
        .unwrap();

    assert_eq!(view.len(), 5);
    assert_eq!(h.mock.call_count().await, 0);
}

#[tokio::test]
async fn test_summarize_now_surfaces_generation_failure() {
    let h = harness(vec![MockStep::error("quota exceeded")]);
    let turns = sized_turns(12, 50);
    seed(&h.store, &turns).await;

    let err = h
        .chronicle
        .compaction
        .summarize_now(CONVERSATION, CHARACTER, &gemini(), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Generation);
    assert_eq!(stored_turns(&h.store).await, turns);
}

#[tokio::test]
async fn test_list_and_delete_summaries() {
    let h = harness(vec![MockStep::text(SUMMARY)]);
    enable_compaction(&h.store).await;

    // A summary turn that predates the archive.
    let mut turns = sized_turns(12, 600);
    turns[1] = Turn::summary("legacy summary", SummaryRange::new(0, 4))
        .with_id("legacy")
        .with_timestamp(10);
    seed(&h.store, &turns).await;

    let compacted = h
        .chronicle
        .compaction
        .check_and_summarize(
            CONVERSATION,
            CHARACTER,
            ChatLog::with_turns(CONVERSATION, turns),
            &gemini(),
        )
        .await
        .unwrap();
    let new_summary = compacted.turns[3].clone();

    let listed = h
        .chronicle
        .compaction
        .list_summaries(CONVERSATION)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].summary_id, new_summary.id);
    assert_eq!(listed[0].summary, SUMMARY);
    assert_eq!(listed[1].summary_id, "legacy");
    assert_eq!(listed[1].timestamp, 10);
    assert_eq!(listed[1].summary, "legacy summary");

    let view = h
        .chronicle
        .compaction
        .delete_summary(CONVERSATION, &new_summary.id)
        .await
        .unwrap();
    assert_eq!(view.len(), compacted.len() - 1);
    assert!(view.iter().all(|entry| entry.turn.id != new_summary.id));
    assert!(h.store.list_summaries(CONVERSATION).await.unwrap().is_empty());

    let err = h
        .chronicle
        .compaction
        .delete_summary(CONVERSATION, "missing-summary")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn test_mutation_waits_for_compaction_and_sees_fresh_indices() {
    let h = harness(vec![MockStep::text(SUMMARY).with_delay(150)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let compaction = h.chronicle.compaction.clone();
    let log = ChatLog::with_turns(CONVERSATION, turns);
    let running = tokio::spawn(async move {
        compaction
            .check_and_summarize(CONVERSATION, CHARACTER, log, &gemini())
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;

    // Index 11 was valid before compaction; once the lock is released the log
    // has 7 turns, so the stale index must be rejected rather than applied.
    let err = h
        .chronicle
        .mutation
        .edit_turn(CONVERSATION, 11, "stale edit")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ChronicleError::NotFound { index: 11, len: 7, .. }
    ));

    let compacted = running.await.unwrap().unwrap();
    assert_eq!(stored_turns(&h.store).await, compacted.turns);
}

#[tokio::test]
async fn test_append_during_compaction_is_kept() {
    let h = harness(vec![MockStep::text(SUMMARY).with_delay(150)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let compaction = h.chronicle.compaction.clone();
    let log = ChatLog::with_turns(CONVERSATION, turns);
    let running = tokio::spawn(async move {
        compaction
            .check_and_summarize(CONVERSATION, CHARACTER, log, &gemini())
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;

    let appended = h
        .chronicle
        .mutation
        .append_turn(CONVERSATION, Turn::user("new message").with_id("late"))
        .await
        .unwrap();
    assert_eq!(appended.len(), 8);

    let compacted = running.await.unwrap().unwrap();
    assert_eq!(compacted.len(), 7);

    let stored = stored_turns(&h.store).await;
    assert_eq!(stored.len(), 8);
    assert!(stored[3].is_summary);
    assert_eq!(stored.last().map(|turn| turn.id.as_str()), Some("late"));
}

#[tokio::test]
async fn test_unlocked_write_during_generation_discards_summary() {
    let h = harness(vec![MockStep::text(SUMMARY).with_delay(150)]);
    enable_compaction(&h.store).await;
    let turns = sized_turns(12, 600);
    seed(&h.store, &turns).await;

    let compaction = h.chronicle.compaction.clone();
    let log = ChatLog::with_turns(CONVERSATION, turns.clone());
    let running = tokio::spawn(async move {
        compaction
            .check_and_summarize(CONVERSATION, CHARACTER, log, &gemini())
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    h.store
        .append_turn(CONVERSATION, Turn::user("new message").with_id("late"))
        .await
        .unwrap();

    let result = running.await.unwrap().unwrap();
    let stored = stored_turns(&h.store).await;
    assert_eq!(stored.len(), 13);
    assert_eq!(&stored[..12], &turns[..]);
    assert_eq!(stored[12].id, "late");
    assert_eq!(result.turns, stored);

    assert!(h.store.list_summaries(CONVERSATION).await.unwrap().is_empty());
    let settings = h.store.load_settings(CHARACTER).await.unwrap();
    assert_eq!(settings.last_summarized_at, 0);
}

/// Passes configuration checks but cannot build a client.
struct UnreachableFactory;

impl LlmClientFactory for UnreachableFactory {
    fn create_client(&self, _config: &ProviderConfig) -> chronicle_ai::Result<Arc<dyn LlmClient>> {
        Err(AiError::Llm("connection pool exhausted".to_string()))
    }
}

#[tokio::test]
async fn test_client_construction_failure_returns_original_log() {
    let store = Arc::new(InMemoryStore::new());
    let chronicle = Chronicle::new(
        store.clone(),
        Arc::new(UnreachableFactory),
        EngineConfig::default(),
    );
    enable_compaction(&store).await;
    let turns = sized_turns(12, 600);
    seed(&store, &turns).await;

    let log = ChatLog::with_turns(CONVERSATION, turns.clone());
    let result = chronicle
        .compaction
        .check_and_summarize(CONVERSATION, CHARACTER, log.clone(), &gemini())
        .await
        .unwrap();

    assert_eq!(result, log);
    assert_eq!(stored_turns(&store).await, turns);
    assert_eq!(
        store.load_settings(CHARACTER).await.unwrap(),
        MemorySettings::enabled()
    );

    let err = chronicle
        .compaction
        .summarize_now(CONVERSATION, CHARACTER, &gemini(), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Generation);
}

#[tokio::test]
async fn test_summaries_sharing_a_timestamp_are_distinct() {
    let h = harness(vec![]);
    for (id, text) in [("s-a", "first"), ("s-b", "second")] {
        h.store
            .archive_summary(&SummaryRecord {
                conversation_id: CONVERSATION.to_string(),
                summary_id: id.to_string(),
                summary: text.to_string(),
                timestamp: 5_000,
                range: SummaryRange::new(3, 8),
                character_id: None,
            })
            .await
            .unwrap();
    }

    let listed = h
        .chronicle
        .compaction
        .list_summaries(CONVERSATION)
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);

    h.chronicle
        .compaction
        .delete_summary(CONVERSATION, "s-a")
        .await
        .unwrap();
    let listed = h
        .chronicle
        .compaction
        .list_summaries(CONVERSATION)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].summary_id, "s-b");
    assert_eq!(listed[0].summary, "second");
}

#[tokio::test]
async fn test_nested_conversation_ids_keep_separate_summaries() {
    let temp_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RedbStore::open(temp_dir.path().join("chronicle.db")).unwrap());
    let chronicle = Chronicle::new(
        store.clone(),
        Arc::new(UnreachableFactory),
        EngineConfig::default(),
    );

    for (conversation_id, id) in [("room/42", "nested"), ("room", "top")] {
        store
            .archive_summary(&SummaryRecord {
                conversation_id: conversation_id.to_string(),
                summary_id: id.to_string(),
                summary: format!("{conversation_id} recap"),
                timestamp: 1_000,
                range: SummaryRange::new(0, 4),
                character_id: None,
            })
            .await
            .unwrap();
    }

    let listed = chronicle.compaction.list_summaries("room").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].summary_id, "top");

    let err = chronicle
        .compaction
        .delete_summary("room", "nested")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(store.list_summaries("room/42").await.unwrap().len(), 1);
}
