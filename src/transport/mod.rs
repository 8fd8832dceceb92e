pub mod events;
pub mod logging;
pub mod poll;
pub mod push;

#[cfg(test)]
pub mod mock;

use crate::types::ReplyStatus;
use anyhow::Result;

pub use poll::PollTransport;
pub use push::PushTransport;

/// One unit of information from the backend about a request's progress,
/// normalized across both delivery strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryEvent {
    /// Full reply in one payload, no streaming.
    Complete {
        text: String,
        label: Option<String>,
    },
    /// Polling strategy status answer; only `Completed` carries text.
    Status {
        request_id: u64,
        status: ReplyStatus,
        text: Option<String>,
    },
    /// One incremental piece of a streaming reply.
    Token { token: String },
    /// End of a token sequence.
    StreamEnd,
    /// Transport-level failure. Never silently dropped.
    Failed { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHandle {
    pub request_id: Option<u64>,
}

/// Delivery strategy, selected by value at startup. Both variants feed the
/// same `DeliveryEvent` channel handed to them at construction.
pub enum Transport {
    Push(PushTransport),
    Poll(PollTransport),
    #[cfg(test)]
    Mock(mock::MockTransport),
}

impl Transport {
    pub async fn send(&mut self, text: &str) -> Result<RequestHandle> {
        match self {
            Transport::Push(push) => push.send(text).await,
            Transport::Poll(poll) => poll.send(text).await,
            #[cfg(test)]
            Transport::Mock(mock) => mock.send(text),
        }
    }

    /// Cancel all background activity. Idempotent.
    pub fn dispose(&mut self) {
        match self {
            Transport::Push(push) => push.dispose(),
            Transport::Poll(poll) => poll.dispose(),
            #[cfg(test)]
            Transport::Mock(mock) => mock.dispose(),
        }
    }
}
