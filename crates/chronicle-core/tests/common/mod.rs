#![allow(dead_code)]

use std::sync::Arc;

use chronicle_ai::{MockLlmClient, MockLlmClientFactory, MockStep, ProviderConfig};
use chronicle_core::{
    Chronicle, EngineConfig, InMemoryStore, LogStore, MemorySettings, MemorySettingsStore, Turn,
};

pub const CONVERSATION: &str = "conv-1";
pub const CHARACTER: &str = "mira";

pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub mock: MockLlmClient,
    pub factory: Arc<MockLlmClientFactory>,
    pub chronicle: Chronicle,
}

pub fn harness(steps: Vec<MockStep>) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let mock = MockLlmClient::from_steps("mock-model", steps);
    let factory = Arc::new(MockLlmClientFactory::new(mock.clone()));
    let chronicle = Chronicle::new(store.clone(), factory.clone(), EngineConfig::default());
    Harness {
        store,
        mock,
        factory,
        chronicle,
    }
}

pub fn gemini() -> ProviderConfig {
    ProviderConfig::new("gemini").with_api_key("test-key")
}

/// Alternating user/character turns, each exactly `chars` characters long,
/// with ids `t0`, `t1`, ...
pub fn sized_turns(count: usize, chars: usize) -> Vec<Turn> {
    (0..count)
        .map(|i| {
            let mut content = format!("turn {i} ");
            while content.len() < chars {
                content.push('x');
            }
            content.truncate(chars);
            let turn = if i % 2 == 0 {
                Turn::user(content)
            } else {
                Turn::character(content)
            };
            turn.with_id(format!("t{i}")).with_timestamp(1_000 + i as i64)
        })
        .collect()
}

pub async fn seed(store: &InMemoryStore, turns: &[Turn]) {
    store
        .replace_log(CONVERSATION, turns.to_vec())
        .await
        .unwrap();
}

pub async fn enable_compaction(store: &InMemoryStore) {
    store
        .save_settings(CHARACTER, &MemorySettings::enabled())
        .await
        .unwrap();
}

pub async fn stored_turns(store: &InMemoryStore) -> Vec<Turn> {
    store
        .get_log(CONVERSATION)
        .await
        .unwrap()
        .map(|log| log.turns)
        .unwrap_or_default()
}

pub fn ids(turns: &[Turn]) -> Vec<String> {
    turns.iter().map(|turn| turn.id.clone()).collect()
}
