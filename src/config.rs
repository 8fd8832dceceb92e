use crate::util::is_local_endpoint_url;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

const SERVER_URL_ENV: &str = "PARLOR_SERVER_URL";
const TRANSPORT_ENV: &str = "PARLOR_TRANSPORT";
const POLL_INTERVAL_ENV: &str = "PARLOR_POLL_INTERVAL_MS";

/// Delivery strategy selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Push,
    Poll,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub transport: TransportKind,
    pub poll_interval_ms: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let server_url =
            std::env::var(SERVER_URL_ENV).unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());

        let transport = match std::env::var(TRANSPORT_ENV) {
            Ok(value) => parse_transport_kind(&value)
                .with_context(|| format!("{TRANSPORT_ENV} must be 'push' or 'poll', got '{value}'"))?,
            Err(_) => TransportKind::Push,
        };

        let poll_interval_ms = match std::env::var(POLL_INTERVAL_ENV) {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{POLL_INTERVAL_ENV} must be an integer, got '{value}'"))?,
            Err(_) => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            server_url,
            transport,
            poll_interval_ms,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("{POLL_INTERVAL_ENV} must be nonzero");
        }

        let url = self.server_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            bail!("server url '{}' must use http or https", self.server_url);
        }
        if url.starts_with("http://") && !is_local_endpoint_url(url) {
            bail!(
                "refusing plain http to non-local endpoint '{}'",
                self.server_url
            );
        }

        Ok(())
    }
}

fn parse_transport_kind(value: &str) -> Option<TransportKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "push" | "socket" | "channel" => Some(TransportKind::Push),
        "poll" | "polling" | "status" => Some(TransportKind::Poll),
        _ => None,
    }
}
