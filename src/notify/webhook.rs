use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use crate::config::Webhook;

use super::{Notification, Notifier, NotifyError, check_response, http_client};

/// Posts a generic JSON payload
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    config: Webhook,
}

impl WebhookNotifier {
    pub fn new(config: Webhook) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }

    pub fn payload(notification: &Notification) -> serde_json::Value {
        json!({
            "kind": notification.kind,
            "title": notification.title,
            "message": notification.text,
            "timestamp": Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    #[instrument(skip(self, notification), fields(kind = ?notification.kind))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&Self::payload(notification))
            .send()
            .await?;
        check_response(response).await?;

        debug!("Successfully sent webhook notification");
        Ok(())
    }
}
