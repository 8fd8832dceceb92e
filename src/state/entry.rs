use serde::{Deserialize, Serialize};

pub type EntryId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Bot,
}

/// Lifecycle of a transcript entry. `Final` entries never change again;
/// only a `Pending` placeholder may be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Streaming,
    Final,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub speaker: Speaker,
    /// Source text. Markup is derived at emission time, never stored here.
    pub text: String,
    #[serde(default)]
    pub label: Option<String>,
    pub state: EntryState,
}
