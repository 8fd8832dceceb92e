mod engine;
mod entry;

pub use engine::{ChatEngine, ConversationLog, TranscriptUpdate, FAILURE_TEXT, PLACEHOLDER_TEXT};
pub use entry::{Entry, EntryId, EntryState, Speaker};
