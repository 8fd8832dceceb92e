use super::state::{ChatEngine, PendingRequest, TranscriptUpdate};
use super::streaming::emit_update;
use crate::state::entry::{Entry, EntryState, Speaker};
use crate::transport::{logging, DeliveryEvent};
use crate::types::ReplyStatus;
use anyhow::Result;
use tokio::sync::mpsc;

/// Sentinel shown while a reply is outstanding.
pub const PLACEHOLDER_TEXT: &str = "…";

/// Final bot entry shown when the transport fails. The conversation stays
/// usable afterwards; retry is a user-initiated resubmission.
pub const FAILURE_TEXT: &str = "Sorry, something went wrong while fetching the reply.";

impl ChatEngine {
    /// Send one user utterance: append the user entry, show the working
    /// placeholder, hand the text to the transport, and record the pending
    /// request. A submission while one is already outstanding is ignored,
    /// as is an empty one.
    pub async fn submit(
        &mut self,
        text: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) -> Result<()> {
        let trimmed = text.trim();
        if trimmed.is_empty() || self.pending.is_some() {
            return Ok(());
        }

        let user_id = self.allocate_entry_id();
        let entry = Entry {
            id: user_id,
            speaker: Speaker::User,
            text: trimmed.to_string(),
            label: None,
            state: EntryState::Final,
        };
        let markup = self.renderer.render(trimmed);
        self.log.append(entry.clone());
        emit_update(update_tx, TranscriptUpdate::Appended { entry, markup });

        let placeholder_id = self.show_placeholder(update_tx);

        match self.transport.send(trimmed).await {
            Ok(handle) => {
                self.pending = Some(PendingRequest {
                    request_id: handle.request_id,
                    submitted_text: trimmed.to_string(),
                    entry_id: placeholder_id,
                });
            }
            Err(error) => {
                logging::emit_transport_failure(&format!("send failed: {error:#}"));
                self.resolve_placeholder(placeholder_id, FAILURE_TEXT, None, update_tx);
            }
        }

        Ok(())
    }

    /// Apply one delivery event. Events are processed in arrival order, to
    /// completion, one at a time; duplicates and strays are no-ops.
    pub fn handle_delivery(
        &mut self,
        event: DeliveryEvent,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        match event {
            DeliveryEvent::Complete { text, label } => {
                self.complete_pending(&text, label, update_tx);
            }
            DeliveryEvent::Status {
                request_id,
                status,
                text,
            } => {
                let Some(pending) = &self.pending else {
                    // Duplicate completed answer or a poll that outlived its
                    // request.
                    return;
                };
                if pending.request_id != Some(request_id) {
                    // Stale correlation: not ours.
                    return;
                }
                match status {
                    ReplyStatus::Pending => {}
                    ReplyStatus::Completed => {
                        let text = text.unwrap_or_default();
                        self.complete_pending(&text, None, update_tx);
                    }
                }
            }
            DeliveryEvent::Token { token } => {
                if self.stream.is_none() {
                    let Some(pending) = &self.pending else {
                        // Token after end or before begin: ignored.
                        return;
                    };
                    let entry_id = pending.entry_id;
                    self.begin_stream(entry_id, update_tx);
                }
                self.append_token(&token, update_tx);
            }
            DeliveryEvent::StreamEnd => {
                if self.stream.is_some() {
                    self.end_stream(update_tx);
                    self.pending = None;
                }
            }
            DeliveryEvent::Failed { message } => {
                self.fail_pending(&message, update_tx);
            }
        }
    }

    /// Cancel outstanding transport activity and settle the transcript: a
    /// live stream is finalized with what it has, a bare placeholder is
    /// cleared.
    pub fn dispose(&mut self, update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>) {
        self.transport.dispose();

        if self.stream.is_some() {
            self.end_stream(update_tx);
            self.pending = None;
        }
        if let Some(pending) = self.pending.take() {
            self.clear_placeholder(pending.entry_id, update_tx);
        }
    }

    fn complete_pending(
        &mut self,
        text: &str,
        label: Option<String>,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        // A complete reply racing a live stream finalizes the buffer; the
        // entry then refuses the second resolution below.
        if self.stream.is_some() {
            self.end_stream(update_tx);
        }

        let Some(pending) = self.pending.take() else {
            return;
        };
        self.resolve_placeholder(pending.entry_id, text, label, update_tx);
    }

    fn fail_pending(
        &mut self,
        message: &str,
        update_tx: Option<&mpsc::UnboundedSender<TranscriptUpdate>>,
    ) {
        logging::emit_transport_failure(message);
        self.stream = None;

        if let Some(pending) = self.pending.take() {
            self.resolve_placeholder(pending.entry_id, FAILURE_TEXT, None, update_tx);
        } else {
            // Out-of-band failure (the channel broke while idle): still
            // surfaced, the transcript gains a final failure entry.
            let id = self.allocate_entry_id();
            let entry = Entry {
                id,
                speaker: Speaker::Bot,
                text: FAILURE_TEXT.to_string(),
                label: None,
                state: EntryState::Final,
            };
            let markup = self.renderer.render(FAILURE_TEXT);
            self.log.append(entry.clone());
            emit_update(update_tx, TranscriptUpdate::Appended { entry, markup });
        }
    }
}
