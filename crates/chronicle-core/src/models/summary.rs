use serde::{Deserialize, Serialize};

use crate::models::turn::SummaryRange;

/// Archived copy of a summary produced by compaction.
///
/// The archive outlives the log entry: a summary turn may later be edited or
/// deleted while the record stays listable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryRecord {
    pub conversation_id: String,
    /// Id of the summary turn this record was produced with.
    #[serde(default)]
    pub summary_id: String,
    /// Generated text without the marker framing.
    pub summary: String,
    /// Unix milliseconds; matches the summary turn's timestamp. Not unique.
    pub timestamp: i64,
    pub range: SummaryRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
}
