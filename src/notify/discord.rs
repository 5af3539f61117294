use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::Discord;

use super::{Notification, NotificationKind, Notifier, NotifyError, check_response, http_client};

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

pub struct MessageBuilder {
    content: Option<String>,
    embeds: Vec<Embed>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self {
            content: None,
            embeds: Vec::new(),
        }
    }

    pub fn content(mut self, content: impl ToString) -> Self {
        self.content = Some(content.to_string());
        self
    }

    pub fn add_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn build(self) -> Message {
        Message {
            content: self.content,
            embeds: self.embeds,
        }
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Posts embeds to a Discord webhook
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    client: Client,
    config: Discord,
}

impl DiscordNotifier {
    pub fn new(config: Discord) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }

    pub fn build_message(&self, notification: &Notification) -> Message {
        let (prefix, color) = match notification.kind {
            NotificationKind::Alarm => ("🥶", 15158332),    // Red
            NotificationKind::Recovery => ("✅", 3066993), // Green
            NotificationKind::Report => ("🌡️", 5793266),   // Light blue
        };

        // reports already start with their title
        let description = notification
            .text
            .strip_prefix(&notification.title)
            .map(str::trim_start)
            .unwrap_or(&notification.text);

        let embed = Embed {
            title: Some(format!("{prefix} {}", notification.title)),
            description: Some(format!("```\n{description}\n```")),
            color: Some(color),
            timestamp: Some(Utc::now().to_rfc3339()),
        };

        let mut builder = MessageBuilder::new().add_embed(embed);
        if notification.kind == NotificationKind::Alarm
            && let Some(user_id) = &self.config.user_id
        {
            builder = builder.content(format!("{prefix} {} <@{user_id}>", notification.title));
        }

        builder.build()
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &'static str {
        "discord"
    }

    #[instrument(skip(self, notification), fields(kind = ?notification.kind))]
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let message = self.build_message(notification);

        let response = self
            .client
            .post(&self.config.url)
            .json(&message)
            .send()
            .await?;
        check_response(response).await?;

        debug!("Successfully sent Discord message");
        Ok(())
    }
}
