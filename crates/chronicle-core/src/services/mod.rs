pub mod compaction;
pub mod mutation;

pub use compaction::CompactionEngine;
pub use mutation::{MutationService, RegenerationContext};

use crate::error::{ChronicleError, Result};

pub(crate) fn require_id(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ChronicleError::validation(format!("{what} is required")));
    }
    Ok(())
}
