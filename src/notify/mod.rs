//! Outbound notification sinks
//!
//! Every sink implements [`Notifier`]. Delivery is best effort: callers log a
//! failed send and move on, nothing is retried.

pub mod discord;
pub mod telegram;
pub mod webhook;

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::NotifierConfig;

pub use discord::DiscordNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Alarm,
    Recovery,
    Report,
}

/// A message ready to be sent through any sink
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl ToString, text: impl ToString) -> Self {
        Self {
            kind,
            title: title.to_string(),
            text: text.to_string(),
        }
    }

    /// Title and body as one plain-text block
    pub fn plain_text(&self) -> String {
        if self.text.starts_with(&self.title) {
            return self.text.clone();
        }
        format!("{}\n{}", self.title, self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The request never got a response
    Request(String),

    /// The endpoint answered with a non-success status
    Status { status: u16, body: String },

    /// The sink is missing a required setting
    Config(String),
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Request(msg) => write!(f, "notification request failed: {msg}"),
            NotifyError::Status { status, body } if body.is_empty() => {
                write!(f, "notification rejected with status {status}")
            }
            NotifyError::Status { status, body } => {
                write!(f, "notification rejected with status {status}: {body}")
            }
            NotifyError::Config(msg) => write!(f, "notifier misconfigured: {msg}"),
        }
    }
}

impl std::error::Error for NotifyError {}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Request(err.to_string())
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> reqwest::Client {
    client_or_default(reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build())
}

fn client_or_default(built: reqwest::Result<reqwest::Client>) -> reqwest::Client {
    built.unwrap_or_else(|e| {
        error!("failed to build HTTP client, falling back to one without a request timeout: {e}");
        reqwest::Client::new()
    })
}

/// Turn a non-success response into [`NotifyError::Status`]
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log, used when nothing else is configured
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        match notification.kind {
            NotificationKind::Alarm => warn!("{}", notification.plain_text()),
            NotificationKind::Recovery | NotificationKind::Report => {
                info!("{}", notification.plain_text())
            }
        }
        Ok(())
    }
}

/// Build the configured sink, falling back to [`LogNotifier`]
pub fn build_notifier(config: Option<&NotifierConfig>) -> Result<Arc<dyn Notifier>, NotifyError> {
    let notifier: Arc<dyn Notifier> = match config {
        Some(NotifierConfig::Discord(discord)) => Arc::new(DiscordNotifier::new(discord.clone())),
        Some(NotifierConfig::Webhook(webhook)) => Arc::new(WebhookNotifier::new(webhook.clone())),
        Some(NotifierConfig::Telegram(telegram)) => {
            Arc::new(TelegramNotifier::new(telegram.clone())?)
        }
        Some(NotifierConfig::Log) | None => Arc::new(LogNotifier),
    };

    Ok(notifier)
}
