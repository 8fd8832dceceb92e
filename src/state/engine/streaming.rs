use super::state::{ChatEngine, StreamBuffer, TranscriptUpdate};
use crate::state::entry::{EntryId, EntryState};
use tokio::sync::mpsc;

impl ChatEngine {
    /// Take over the placeholder entry as the live streaming entry (same
    /// id), stripping the sentinel text. An already-live buffer is finalized
    /// first: at most one exists at a time.
    pub(super) fn begin_stream(
        &mut self,
        entry_id: EntryId,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        if self.stream.is_some() {
            self.end_stream(update_tx);
        }

        match self.log.get_mut(entry_id) {
            Some(entry) if entry.state != EntryState::Final => {
                entry.state = EntryState::Streaming;
                entry.text.clear();
            }
            // A begin on a settled or unknown entry is a stray event.
            _ => return,
        }

        self.stream = Some(StreamBuffer {
            entry_id,
            text: String::new(),
        });
        emit_update(
            update_tx,
            TranscriptUpdate::Replaced {
                id: entry_id,
                markup: String::new(),
                state: EntryState::Streaming,
            },
        );
    }

    /// Append one token and re-render the whole accumulated source. The
    /// buffer stores source text only, never markup: structures that span
    /// tokens (an unclosed code fence) come out well-formed once the rest
    /// arrives, which piecewise markup patching cannot guarantee.
    pub(super) fn append_token(
        &mut self,
        token: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        let Some(buffer) = self.stream.as_mut() else {
            return;
        };
        buffer.text.push_str(token);
        let entry_id = buffer.entry_id;
        let source = buffer.text.clone();

        let markup = self.renderer.render(&source);
        if let Some(entry) = self.log.get_mut(entry_id) {
            entry.text = source;
        }
        emit_update(
            update_tx,
            TranscriptUpdate::Replaced {
                id: entry_id,
                markup,
                state: EntryState::Streaming,
            },
        );
    }

    /// Freeze the streaming entry, discard the buffer, and return the
    /// accumulated source text.
    pub(super) fn end_stream(
        &mut self,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) -> Option<String> {
        let buffer = self.stream.take()?;
        let markup = self.renderer.render(&buffer.text);

        if let Some(entry) = self.log.get_mut(buffer.entry_id) {
            entry.text = buffer.text.clone();
            entry.state = EntryState::Final;
        }
        emit_update(
            update_tx,
            TranscriptUpdate::Replaced {
                id: buffer.entry_id,
                markup,
                state: EntryState::Final,
            },
        );
        Some(buffer.text)
    }
}

pub(super) fn emit_update(
    update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    update: TranscriptUpdate,
) {
    if let Some(tx) = update_tx {
        let _ = tx.send(update);
    }
}
