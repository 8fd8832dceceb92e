use super::history::ConversationLog;
use crate::render::MarkupRenderer;
use crate::state::entry::{Entry, EntryId, EntryState};
use crate::transport::Transport;
use std::sync::Arc;

/// Change notifications for the rendering boundary. Markup is computed at
/// emission time; observers never reach back into the log.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptUpdate {
    Appended {
        entry: Entry,
        markup: String,
    },
    /// The entry's displayed content was replaced wholesale.
    Replaced {
        id: EntryId,
        markup: String,
        state: EntryState,
    },
    Removed {
        id: EntryId,
    },
}

/// The one in-flight request. `entry_id` is the correlation token tying
/// delivery events back to the placeholder entry.
pub(super) struct PendingRequest {
    pub(super) request_id: Option<u64>,
    pub(super) submitted_text: String,
    pub(super) entry_id: EntryId,
}

/// Accumulated source text of the reply currently being streamed. At most
/// one exists per engine.
pub(super) struct StreamBuffer {
    pub(super) entry_id: EntryId,
    pub(super) text: String,
}

/// The message-delivery reconciliation engine: owns the transport strategy,
/// the transcript, and the single outstanding request and stream buffer.
/// Lifecycle is create, use, dispose.
pub struct ChatEngine {
    pub(super) transport: Transport,
    pub(super) renderer: Arc<dyn MarkupRenderer>,
    pub(super) log: ConversationLog,
    pub(super) pending: Option<PendingRequest>,
    pub(super) stream: Option<StreamBuffer>,
    pub(super) next_entry_id: EntryId,
}

impl ChatEngine {
    pub fn new(transport: Transport, renderer: Arc<dyn MarkupRenderer>) -> Self {
        Self {
            transport,
            renderer,
            log: ConversationLog::new(),
            pending: None,
            stream: None,
            next_entry_id: 0,
        }
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    /// Text of the submission still awaiting its reply, if any.
    pub fn pending_submission(&self) -> Option<&str> {
        self.pending
            .as_ref()
            .map(|pending| pending.submitted_text.as_str())
    }

    pub(super) fn allocate_entry_id(&mut self) -> EntryId {
        self.next_entry_id += 1;
        self.next_entry_id
    }
}
