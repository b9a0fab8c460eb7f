//! Webhook notification delivery
//!
//! Pushes digest messages to a Discord webhook as a single embed. A
//! failed delivery gets exactly one immediate retry; after that the
//! digest is dropped and the next cycle starts fresh, so one bad digest
//! can never back up the schedule.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Discord brand purple used for the digest embed
const EMBED_COLOR: u32 = 0x7447FF;

/// A digest failed to reach the webhook
#[derive(Debug)]
pub enum DeliveryError {
    /// Request never completed (connect, TLS, timeout)
    Transport(String),
    /// Webhook answered with a non-success status
    Rejected(u16),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Transport(msg) => write!(f, "Delivery transport error: {}", msg),
            DeliveryError::Rejected(status) => {
                write!(f, "Webhook rejected delivery with status {}", status)
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Seam for digest delivery, mockable in tests
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, title: &str, message: &str) -> Result<(), DeliveryError>;
}

/// Discord webhook sink
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            webhook_url,
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordNotifier {
    async fn send(&self, title: &str, message: &str) -> Result<(), DeliveryError> {
        let payload = json!({
            "embeds": [{
                "title": title,
                "description": message,
                "color": EMBED_COLOR,
                "footer": { "text": "penumbra-pulse" },
            }]
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(status.as_u16()))
        }
    }
}

/// Deliver with exactly one immediate retry.
///
/// Returns the second error when both attempts fail; the caller logs it
/// and moves on, the digest is not queued for later.
pub async fn deliver_with_retry(
    sink: &dyn NotificationSink,
    title: &str,
    message: &str,
) -> Result<(), DeliveryError> {
    match sink.send(title, message).await {
        Ok(()) => Ok(()),
        Err(first) => {
            log::warn!("Digest delivery failed, retrying once: {}", first);
            sink.send(title, message).await
        }
    }
}
