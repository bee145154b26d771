//! Turn model and the derived logical index.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChronicleError;

/// Who a turn is attributed to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Character,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Character => "character",
        }
    }

    /// Speaker label used when rendering turns as a transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Character => "Character",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = ChronicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "character" | "model" | "assistant" => Ok(Self::Character),
            other => Err(ChronicleError::validation(format!(
                "unknown turn role '{other}'"
            ))),
        }
    }
}

/// Logical indices (inclusive on both ends) a summary replaced, as they were
/// immediately before compaction. Audit data only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRange {
    pub start: usize,
    pub end: usize,
}

impl SummaryRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// One dialogue unit in a conversation log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub id: String,
    pub role: TurnRole,
    pub content: String,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_range: Option<SummaryRange>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            is_summary: false,
            summary_range: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn character(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Character, content)
    }

    /// A compaction summary. Framed as out-of-band context on the user side.
    pub fn summary(content: impl Into<String>, range: SummaryRange) -> Self {
        Self {
            is_summary: true,
            summary_range: Some(range),
            ..Self::new(TurnRole::User, content)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Content length in characters, the unit thresholds are expressed in.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// `"<Role>: <content>"` transcript line.
    pub fn render(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// A turn paired with its position in the log it was read from.
///
/// Only produced by [`index_turns`]; holding one across an operation that
/// rewrites the log leaves a stale index.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IndexedTurn {
    pub logical_index: usize,
    #[serde(flatten)]
    pub turn: Turn,
}

/// Project a log onto `(logical_index, turn)` pairs; `result[i].logical_index == i`.
pub fn index_turns(turns: &[Turn]) -> Vec<IndexedTurn> {
    turns
        .iter()
        .enumerate()
        .map(|(logical_index, turn)| IndexedTurn {
            logical_index,
            turn: turn.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_turns_is_dense_and_ordered() {
        let turns = vec![Turn::user("a"), Turn::character("b"), Turn::user("c")];
        let indexed = index_turns(&turns);

        assert_eq!(indexed.len(), 3);
        for (i, entry) in indexed.iter().enumerate() {
            assert_eq!(entry.logical_index, i);
            assert_eq!(entry.turn, turns[i]);
        }
    }

    #[test]
    fn test_summary_turn_shape() {
        let turn = Turn::summary("folded", SummaryRange::new(3, 8));
        assert_eq!(turn.role, TurnRole::User);
        assert!(turn.is_summary);
        assert_eq!(turn.summary_range, Some(SummaryRange { start: 3, end: 8 }));
    }

    #[test]
    fn test_render_and_char_len() {
        let turn = Turn::character("héllo");
        assert_eq!(turn.render(), "Character: héllo");
        assert_eq!(turn.char_len(), 5);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("User".parse::<TurnRole>().unwrap(), TurnRole::User);
        assert_eq!("character".parse::<TurnRole>().unwrap(), TurnRole::Character);
        assert!("narrator".parse::<TurnRole>().is_err());
    }

    #[test]
    fn test_serde_omits_range_for_plain_turns() {
        let turn = Turn::user("hi").with_id("t1").with_timestamp(42);
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["is_summary"], false);
        assert!(json.get("summary_range").is_none());

        let indexed = serde_json::to_value(&index_turns(&[turn])[0]).unwrap();
        assert_eq!(indexed["logical_index"], 0);
        assert_eq!(indexed["id"], "t1");
    }
}
