pub mod chat_log;
pub mod memory_settings;
pub mod operation;
pub mod summary;
pub mod turn;

pub use chat_log::ChatLog;
pub use memory_settings::{
    DEFAULT_SUMMARY_MAX_CHARS, DEFAULT_SUMMARY_THRESHOLD_CHARS, MemorySettings,
};
pub use operation::OperationResult;
pub use summary::SummaryRecord;
pub use turn::{IndexedTurn, SummaryRange, Turn, TurnRole, index_turns};
