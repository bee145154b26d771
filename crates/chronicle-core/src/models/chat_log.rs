//! Ordered turn log for one conversation.

use serde::{Deserialize, Serialize};

use crate::models::turn::{IndexedTurn, Turn, index_turns};

/// The ordered turns of one conversation.
///
/// Logical indices are positions in `turns`; they are never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatLog {
    pub conversation_id: String,
    #[serde(default)]
    pub turns: Vec<Turn>,
}

impl ChatLog {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            turns: Vec::new(),
        }
    }

    pub fn with_turns(conversation_id: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            turns,
        }
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Total characters of every turn that is not a summary.
    pub fn non_summary_chars(&self) -> usize {
        self.turns
            .iter()
            .filter(|turn| !turn.is_summary)
            .map(Turn::char_len)
            .sum()
    }

    /// Current logical index of the turn with `turn_id`.
    pub fn position_of(&self, turn_id: &str) -> Option<usize> {
        self.turns.iter().position(|turn| turn.id == turn_id)
    }

    /// Fresh indexed view of the log.
    pub fn indexed(&self) -> Vec<IndexedTurn> {
        index_turns(&self.turns)
    }
}
