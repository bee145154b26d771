//! Error taxonomy for log operations.

use chronicle_ai::AiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by the compaction engine and the mutation service.
#[derive(Error, Debug)]
pub enum ChronicleError {
    /// Malformed input: missing ids, bad provider configuration, or an
    /// operation the target turn does not support.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The logical index does not exist in the current log.
    #[error("Turn {index} not found in conversation {conversation_id} ({len} turns)")]
    NotFound {
        conversation_id: String,
        index: usize,
        len: usize,
    },

    /// The generation backend failed or returned nothing usable.
    #[error("Generation error: {0}")]
    Generation(#[source] AiError),

    /// The log, settings or summary store failed to read or commit.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Stable error tag for hosts that only need to branch on the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Generation,
    Persistence,
}

impl ChronicleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Generation(_) => ErrorKind::Generation,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a store failure, keeping the whole context chain in the message.
    pub fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{err:#}"))
    }
}

impl From<AiError> for ChronicleError {
    fn from(err: AiError) -> Self {
        if err.is_configuration() {
            Self::Validation(err.to_string())
        } else {
            Self::Generation(err)
        }
    }
}

impl From<tokio::task::JoinError> for ChronicleError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Persistence(format!("storage task failed: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
