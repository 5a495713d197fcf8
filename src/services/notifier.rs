//! Chat-webhook notification delivery.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NotificationPayload;
use crate::services::NotificationDispatcher;

/// Posts completion payloads to a chat webhook as a JSON message.
///
/// Best-effort by contract: callers log failures and move on; there is no
/// retry here.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Human-readable message line accompanying the structured payload.
    fn format_message(payload: &NotificationPayload) -> String {
        let price = payload
            .price
            .map(|p| format!(" @ {}", p))
            .unwrap_or_default();
        format!(
            "{} {} [{}] score {}: {}",
            payload.action,
            payload.ticker,
            payload.timeframe_used,
            payload.score,
            payload.matched_triggers.join(", "),
        ) + &price
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookNotifier {
    async fn notify(&self, payload: &NotificationPayload) -> Result<()> {
        let body = serde_json::json!({
            "content": Self::format_message(payload),
            "payload": payload,
        });
        self.client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
