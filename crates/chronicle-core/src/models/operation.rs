//! Caller-facing result of a log operation.

use serde::Serialize;

use crate::error::{ChronicleError, ErrorKind, Result};
use crate::models::turn::IndexedTurn;

/// `{success, turns?, error?}` as handed to hosts.
///
/// On success `turns` carries the whole freshly indexed log; any index a
/// caller held before the operation must be re-derived from it.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turns: Option<Vec<IndexedTurn>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl OperationResult {
    pub fn ok(turns: Vec<IndexedTurn>) -> Self {
        Self {
            success: true,
            turns: Some(turns),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(error: &ChronicleError) -> Self {
        Self {
            success: false,
            turns: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

impl From<Result<Vec<IndexedTurn>>> for OperationResult {
    fn from(result: Result<Vec<IndexedTurn>>) -> Self {
        match result {
            Ok(turns) => Self::ok(turns),
            Err(err) => Self::failed(&err),
        }
    }
}
