use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Telegram;

use super::{Notification, Notifier, NotifyError, check_response, http_client};

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
}

/// Sends plain text through the Bot API `sendMessage` method
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Fails when no bot token was configured
    pub fn new(config: Telegram) -> Result<Self, NotifyError> {
        let token = config
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| NotifyError::Config("telegram bot token is not set".to_string()))?;

        Ok(Self {
            client: http_client(),
            endpoint: format!(
                "{}/bot{token}/sendMessage",
                config.api_url.trim_end_matches('/')
            ),
            chat_id: config.chat_id,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    #[instrument(skip(self, notification), fields(kind = ?notification.kind))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: notification.plain_text(),
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        check_response(response).await?;

        debug!("Successfully sent Telegram message");
        Ok(())
    }
}
