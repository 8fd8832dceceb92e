use super::events::EventParser;
use super::logging::{debug_events_enabled, emit_debug_event};
use super::{DeliveryEvent, RequestHandle};
use crate::types::{OutboundMessage, ServerEvent};
use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::pin::Pin;
#[cfg(test)]
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

#[cfg(test)]
pub trait EventStreamProducer: Send + Sync {
    fn create_event_stream(&self) -> Result<ByteStream>;
}

/// Persistent-channel strategy: one long-lived event stream carries every
/// server event; sends are fire-and-forget posts.
pub struct PushTransport {
    http: reqwest::Client,
    base_url: String,
    delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    shutdown: CancellationToken,
    #[cfg(test)]
    mock_stream_producer: Option<Arc<dyn EventStreamProducer>>,
}

impl PushTransport {
    pub fn new(base_url: &str, delivery_tx: mpsc::UnboundedSender<DeliveryEvent>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            delivery_tx,
            shutdown: CancellationToken::new(),
            #[cfg(test)]
            mock_stream_producer: None,
        }
    }

    #[cfg(test)]
    pub fn new_mock(
        producer: Arc<dyn EventStreamProducer>,
        delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:5000".to_string(),
            delivery_tx,
            shutdown: CancellationToken::new(),
            mock_stream_producer: Some(producer),
        }
    }

    /// Open the event channel and start forwarding server events to the
    /// delivery channel. Must be called once before the first `send`.
    pub async fn connect(&mut self) -> Result<()> {
        let stream = self.open_event_stream().await?;
        let delivery_tx = self.delivery_tx.clone();
        let shutdown = self.shutdown.child_token();
        tokio::spawn(run_reader(stream, delivery_tx, shutdown));
        Ok(())
    }

    pub async fn send(&mut self, text: &str) -> Result<RequestHandle> {
        let url = format!("{}/messages", self.base_url);
        self.http
            .post(&url)
            .json(&OutboundMessage {
                message: text.to_string(),
            })
            .send()
            .await
            .map_err(|error| map_transport_error(error, &url))?
            .error_for_status()
            .map_err(|error| map_transport_error(error, &url))?;

        Ok(RequestHandle { request_id: None })
    }

    pub fn dispose(&mut self) {
        self.shutdown.cancel();
    }

    async fn open_event_stream(&self) -> Result<ByteStream> {
        #[cfg(test)]
        {
            if let Some(producer) = &self.mock_stream_producer {
                return producer.create_event_stream();
            }
        }

        let url = format!("{}/events", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|error| map_transport_error(error, &url))?
            .error_for_status()
            .map_err(|error| map_transport_error(error, &url))?;

        let url_for_stream = url.clone();
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_transport_error(error, &url_for_stream)));
        Ok(Box::pin(stream))
    }
}

async fn run_reader(
    mut stream: ByteStream,
    delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    shutdown: CancellationToken,
) {
    let mut parser = EventParser::new();

    loop {
        let chunk = tokio::select! {
            _ = shutdown.cancelled() => break,
            chunk = stream.next() => chunk,
        };
        let Some(chunk) = chunk else { break };

        match chunk {
            Ok(bytes) => {
                for event in parser.process(&bytes) {
                    if debug_events_enabled() {
                        emit_debug_event("recv", &format!("{event:?}"));
                    }
                    if let Some(delivery) = map_server_event(event) {
                        if delivery_tx.send(delivery).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(error) => {
                let _ = delivery_tx.send(DeliveryEvent::Failed {
                    message: error.to_string(),
                });
                break;
            }
        }
    }
}

/// Collapse the legacy event vocabulary onto the delivery contract. The
/// server echoes user messages back and emits an empty bot marker before a
/// token stream; both are redundant with local state and dropped here.
fn map_server_event(event: ServerEvent) -> Option<DeliveryEvent> {
    match event {
        ServerEvent::BotMessage { message, label } => Some(DeliveryEvent::Complete {
            text: message,
            label,
        }),
        ServerEvent::ReceiveMessage { sender, message } => {
            if sender == "bot" && !message.is_empty() {
                Some(DeliveryEvent::Complete {
                    text: message,
                    label: None,
                })
            } else {
                None
            }
        }
        ServerEvent::StreamToken { token } => Some(DeliveryEvent::Token { token }),
        ServerEvent::StreamEnd => Some(DeliveryEvent::StreamEnd),
    }
}

pub(super) fn map_transport_error(error: reqwest::Error, url: &str) -> anyhow::Error {
    if error.is_connect() {
        return anyhow!("cannot reach chat server '{url}': {error}");
    }
    if error.is_timeout() {
        return anyhow!("request to '{url}' timed out: {error}");
    }
    if let Some(status) = error.status() {
        return anyhow!("chat server '{url}' returned HTTP {status}: {error}");
    }
    anyhow!("request to '{url}' failed: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct ScriptedFrames(Vec<&'static str>);

    impl EventStreamProducer for ScriptedFrames {
        fn create_event_stream(&self) -> Result<ByteStream> {
            let chunks: Vec<Result<Bytes>> = self
                .0
                .iter()
                .map(|frame| Ok(Bytes::from_static(frame.as_bytes())))
                .collect();
            Ok(Box::pin(stream::iter(chunks)))
        }
    }

    #[tokio::test]
    async fn test_reader_forwards_stream_events_and_drops_echoes() {
        let (delivery_tx, mut delivery_rx) = mpsc::unbounded_channel();
        let producer = Arc::new(ScriptedFrames(vec![
            "event: receive_message\ndata: {\"sender\":\"user\",\"message\":\"2+2?\"}\n\n",
            "event: receive_message\ndata: {\"sender\":\"bot\",\"message\":\"\"}\n\n",
            "event: stream_token\ndata: {\"token\":\"4\"}\n\n",
            "event: stream_token\ndata: {\"token\":\" is the answer\"}\n\n",
            "event: stream_end\ndata: {}\n\n",
        ]));
        let mut transport = PushTransport::new_mock(producer, delivery_tx);
        transport.connect().await.expect("mock connect");

        let first = delivery_rx.recv().await.expect("first event");
        assert_eq!(
            first,
            DeliveryEvent::Token {
                token: "4".to_string()
            }
        );
        let second = delivery_rx.recv().await.expect("second event");
        assert_eq!(
            second,
            DeliveryEvent::Token {
                token: " is the answer".to_string()
            }
        );
        let third = delivery_rx.recv().await.expect("third event");
        assert_eq!(third, DeliveryEvent::StreamEnd);
    }

    #[tokio::test]
    async fn test_reader_maps_legacy_bot_echo_to_complete() {
        let (delivery_tx, mut delivery_rx) = mpsc::unbounded_channel();
        let producer = Arc::new(ScriptedFrames(vec![
            "event: receive_message\ndata: {\"sender\":\"bot\",\"message\":\"hi there\"}\n\n",
        ]));
        let mut transport = PushTransport::new_mock(producer, delivery_tx);
        transport.connect().await.expect("mock connect");

        let event = delivery_rx.recv().await.expect("mapped event");
        assert_eq!(
            event,
            DeliveryEvent::Complete {
                text: "hi there".to_string(),
                label: None,
            }
        );
    }

    #[test]
    fn test_map_server_event_keeps_labels() {
        let mapped = map_server_event(ServerEvent::BotMessage {
            message: "shuttle leaves at nine".to_string(),
            label: Some("shuttle_bus".to_string()),
        });
        assert_eq!(
            mapped,
            Some(DeliveryEvent::Complete {
                text: "shuttle leaves at nine".to_string(),
                label: Some("shuttle_bus".to_string()),
            })
        );
    }
}
