use serde::{Deserialize, Serialize};

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub message: String,
}

/// Reply to `POST /messages`. Push-mode servers may omit the request id.
#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub request_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Pending,
    Completed,
}

/// Reply to `GET /status/{request_id}`. Only `completed` carries text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: ReplyStatus,
    #[serde(default)]
    pub response: Option<String>,
}

/// One event read off the persistent channel, after frame parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    BotMessage { message: String, label: Option<String> },
    ReceiveMessage { sender: String, message: String },
    StreamToken { token: String },
    StreamEnd,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotMessagePayload {
    pub message: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiveMessagePayload {
    pub sender: String,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamTokenPayload {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_pending_omits_text() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"status":"pending"}"#).expect("pending should parse");
        assert_eq!(parsed.status, ReplyStatus::Pending);
        assert_eq!(parsed.response, None);
    }

    #[test]
    fn test_status_response_completed_carries_text() {
        let parsed: StatusResponse =
            serde_json::from_str(r#"{"status":"completed","response":"done"}"#)
                .expect("completed should parse");
        assert_eq!(parsed.status, ReplyStatus::Completed);
        assert_eq!(parsed.response.as_deref(), Some("done"));
    }

    #[test]
    fn test_send_receipt_tolerates_missing_request_id() {
        let parsed: SendReceipt = serde_json::from_str("{}").expect("empty receipt should parse");
        assert_eq!(parsed.request_id, None);

        let parsed: SendReceipt =
            serde_json::from_str(r#"{"request_id":42}"#).expect("receipt should parse");
        assert_eq!(parsed.request_id, Some(42));
    }
}
