use super::logging::emit_malformed_event;
use crate::types::{BotMessagePayload, ReceiveMessagePayload, ServerEvent, StreamTokenPayload};

/// Incremental parser for the persistent channel's `event:`/`data:` frame
/// protocol. Chunks may split frames anywhere; frames are complete at the
/// blank-line separator.
#[derive(Default)]
pub struct EventParser {
    buffer: String,
}

impl EventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every event completed by it. Unknown event
    /// names are skipped. Malformed payloads are reported and dropped rather
    /// than surfaced, since a single bad frame must not strand the channel.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<ServerEvent> {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
        let mut events = Vec::new();
        let mut start = 0;

        while let Some(end) = self.buffer[start..].find("\n\n") {
            let frame_end = start + end + 2;
            let frame = &self.buffer[start..frame_end];

            let mut event_name = None;
            let mut data = None;

            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event: ") {
                    event_name = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data: ") {
                    data = Some(rest.trim().to_string());
                }
            }

            if let (Some(name), Some(payload)) = (event_name, data) {
                match parse_event(&name, &payload) {
                    Ok(Some(event)) => events.push(event),
                    Ok(None) => {}
                    Err(error) => emit_malformed_event(Some(&name), &payload, &error),
                }
            }

            start = frame_end;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        events
    }

    pub fn flush(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

fn parse_event(name: &str, payload: &str) -> Result<Option<ServerEvent>, serde_json::Error> {
    match name {
        "bot_message" => {
            let parsed: BotMessagePayload = serde_json::from_str(payload)?;
            Ok(Some(ServerEvent::BotMessage {
                message: parsed.message,
                label: parsed.label,
            }))
        }
        "receive_message" => {
            let parsed: ReceiveMessagePayload = serde_json::from_str(payload)?;
            Ok(Some(ServerEvent::ReceiveMessage {
                sender: parsed.sender,
                message: parsed.message,
            }))
        }
        "stream_token" => {
            let parsed: StreamTokenPayload = serde_json::from_str(payload)?;
            Ok(Some(ServerEvent::StreamToken {
                token: parsed.token,
            }))
        }
        "stream_end" => Ok(Some(ServerEvent::StreamEnd)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carries_partial_frame_across_chunks() {
        let mut parser = EventParser::new();
        assert!(parser.process(b"event: stream_token\ndata: {\"tok").is_empty());

        let events = parser.process(b"en\":\"Hi\"}\n\n");
        assert_eq!(
            events,
            vec![ServerEvent::StreamToken {
                token: "Hi".to_string()
            }]
        );
        assert!(parser.flush().is_empty());
    }

    #[test]
    fn test_stream_end_needs_no_payload_fields() {
        let mut parser = EventParser::new();
        let events = parser.process(b"event: stream_end\ndata: {}\n\n");
        assert_eq!(events, vec![ServerEvent::StreamEnd]);
    }
}
