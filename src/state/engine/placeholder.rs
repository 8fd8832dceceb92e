use super::core::PLACEHOLDER_TEXT;
use super::state::{ChatEngine, TranscriptUpdate};
use super::streaming::emit_update;
use crate::state::entry::{Entry, EntryId, EntryState, Speaker};
use tokio::sync::mpsc;

impl ChatEngine {
    /// Append the working-indicator entry. Exactly one per request.
    pub(super) fn show_placeholder(
        &mut self,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) -> EntryId {
        let id = self.allocate_entry_id();
        let entry = Entry {
            id,
            speaker: Speaker::Bot,
            text: PLACEHOLDER_TEXT.to_string(),
            label: None,
            state: EntryState::Pending,
        };
        self.log.append(entry.clone());
        emit_update(
            update_tx,
            TranscriptUpdate::Appended {
                entry,
                // The sentinel is decoration, not source text; it skips the
                // renderer.
                markup: PLACEHOLDER_TEXT.to_string(),
            },
        );
        id
    }

    /// Replace the working indicator with final content and freeze the
    /// entry. No-op on an entry that is already final or was never created,
    /// which makes duplicate deliveries harmless.
    pub(super) fn resolve_placeholder(
        &mut self,
        id: EntryId,
        text: &str,
        label: Option<String>,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        match self.log.get(id) {
            Some(entry) if entry.state != EntryState::Final => {}
            _ => return,
        }

        let markup = self.renderer.render(text);
        self.log.replace_or_append(Entry {
            id,
            speaker: Speaker::Bot,
            text: text.to_string(),
            label,
            state: EntryState::Final,
        });
        emit_update(
            update_tx,
            TranscriptUpdate::Replaced {
                id,
                markup,
                state: EntryState::Final,
            },
        );
    }

    /// Drop a placeholder that never received content. No-op once the entry
    /// has streamed or settled.
    pub(super) fn clear_placeholder(
        &mut self,
        id: EntryId,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        if self.log.remove_pending(id) {
            emit_update(update_tx, TranscriptUpdate::Removed { id });
        }
    }
}
