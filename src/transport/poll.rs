use super::logging::{debug_events_enabled, emit_debug_event};
use super::push::map_transport_error;
use super::{DeliveryEvent, RequestHandle};
use crate::types::{OutboundMessage, ReplyStatus, SendReceipt, StatusResponse};
use anyhow::{anyhow, Result};
#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(test)]
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
pub trait StatusProducer: Send + Sync {
    fn fetch_status(&self, request_id: u64) -> Result<StatusResponse>;
}

/// Request/poll strategy: each send returns a request id, then a repeating
/// status query runs until the reply is complete. Every outstanding poll is
/// a child of one root cancellation token, so `dispose` stops them all.
pub struct PollTransport {
    http: reqwest::Client,
    base_url: String,
    interval: Duration,
    delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    shutdown: CancellationToken,
    #[cfg(test)]
    mock_status_producer: Option<Arc<dyn StatusProducer>>,
    #[cfg(test)]
    mock_request_counter: AtomicU64,
}

impl PollTransport {
    pub fn new(
        base_url: &str,
        poll_interval_ms: u64,
        delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            interval: Duration::from_millis(poll_interval_ms),
            delivery_tx,
            shutdown: CancellationToken::new(),
            #[cfg(test)]
            mock_status_producer: None,
            #[cfg(test)]
            mock_request_counter: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    pub fn new_mock(
        producer: Arc<dyn StatusProducer>,
        interval: Duration,
        delivery_tx: mpsc::UnboundedSender<DeliveryEvent>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "http://localhost:5000".to_string(),
            interval,
            delivery_tx,
            shutdown: CancellationToken::new(),
            mock_status_producer: Some(producer),
            mock_request_counter: AtomicU64::new(0),
        }
    }

    pub async fn send(&mut self, text: &str) -> Result<RequestHandle> {
        let request_id = self.post_message(text).await?;
        self.spawn_status_poller(request_id);
        Ok(RequestHandle {
            request_id: Some(request_id),
        })
    }

    pub fn dispose(&mut self) {
        self.shutdown.cancel();
    }

    async fn post_message(&self, text: &str) -> Result<u64> {
        #[cfg(test)]
        if self.mock_status_producer.is_some() {
            // Mock mode skips the HTTP round trip; requests number from 1.
            return Ok(self.mock_request_counter.fetch_add(1, Ordering::SeqCst) + 1);
        }

        let url = format!("{}/messages", self.base_url);
        let receipt: SendReceipt = self
            .http
            .post(&url)
            .json(&OutboundMessage {
                message: text.to_string(),
            })
            .send()
            .await
            .map_err(|error| map_transport_error(error, &url))?
            .error_for_status()
            .map_err(|error| map_transport_error(error, &url))?
            .json()
            .await
            .map_err(|error| map_transport_error(error, &url))?;

        receipt
            .request_id
            .ok_or_else(|| anyhow!("send receipt from '{url}' carried no request id"))
    }

    fn spawn_status_poller(&self, request_id: u64) {
        let token = self.shutdown.child_token();
        let delivery_tx = self.delivery_tx.clone();
        let interval = self.interval;
        let fetcher = self.status_fetcher();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                match fetcher.fetch(request_id).await {
                    Ok(response) => {
                        let completed = response.status == ReplyStatus::Completed;
                        if debug_events_enabled() {
                            emit_debug_event(
                                "poll",
                                &format!("request_id={request_id} status={:?}", response.status),
                            );
                        }
                        let _ = delivery_tx.send(DeliveryEvent::Status {
                            request_id,
                            status: response.status,
                            text: response.response,
                        });
                        if completed {
                            // Stop exactly once; a duplicate completed answer
                            // can never restart the query.
                            break;
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
        });
    }

    fn status_fetcher(&self) -> StatusFetcher {
        #[cfg(test)]
        if let Some(producer) = &self.mock_status_producer {
            return StatusFetcher::Mock(Arc::clone(producer));
        }

        StatusFetcher::Http {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

enum StatusFetcher {
    Http {
        http: reqwest::Client,
        base_url: String,
    },
    #[cfg(test)]
    Mock(Arc<dyn StatusProducer>),
}

impl StatusFetcher {
    async fn fetch(&self, request_id: u64) -> Result<StatusResponse> {
        match self {
            StatusFetcher::Http { http, base_url } => {
                let url = format!("{base_url}/status/{request_id}");
                http.get(&url)
                    .send()
                    .await
                    .map_err(|error| map_transport_error(error, &url))?
                    .error_for_status()
                    .map_err(|error| map_transport_error(error, &url))?
                    .json::<StatusResponse>()
                    .await
                    .map_err(|error| map_transport_error(error, &url))
            }
            #[cfg(test)]
            StatusFetcher::Mock(producer) => producer.fetch_status(request_id),
        }
    }
}
