use super::RequestHandle;
use anyhow::{bail, Result};
use std::collections::VecDeque;

/// Scripted transport for engine tests: records sends, hands out request
/// ids, and can be told to fail. Delivery events are injected by the test
/// through `ChatEngine::handle_delivery` directly.
#[derive(Default)]
pub struct MockTransport {
    pub sent: Vec<String>,
    pub request_ids: VecDeque<u64>,
    pub fail_sends: bool,
    pub disposed: bool,
}

impl MockTransport {
    /// Push-style: sends succeed and carry no request id.
    pub fn push_like() -> Self {
        Self::default()
    }

    /// Poll-style: each send consumes the next scripted request id.
    pub fn poll_like(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            request_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn send(&mut self, text: &str) -> Result<RequestHandle> {
        if self.fail_sends {
            bail!("mock transport refused the send");
        }
        self.sent.push(text.to_string());
        Ok(RequestHandle {
            request_id: self.request_ids.pop_front(),
        })
    }

    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}
