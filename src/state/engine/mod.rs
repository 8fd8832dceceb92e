mod core;
mod history;
mod placeholder;
mod state;
mod streaming;


pub use self::core::{FAILURE_TEXT, PLACEHOLDER_TEXT};
pub use history::ConversationLog;
pub use state::{ChatEngine, TranscriptUpdate};
