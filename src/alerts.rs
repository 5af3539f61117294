use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::{
    cycle::AlertNotice,
    monitors::hysteresis::AlertTransition,
    notify::{Notification, NotificationKind, Notifier},
};

/// Formats alert and report messages and hands them to the configured sink
#[derive(Clone)]
pub struct AlertManager {
    notifier: Arc<dyn Notifier>,
}

impl AlertManager {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn notifier_name(&self) -> &'static str {
        self.notifier.name()
    }

    pub fn format_alert(notice: &AlertNotice) -> Notification {
        let name = &notice.display_name;
        let unit = &notice.unit;

        match notice.transition {
            AlertTransition::Tripped { average, threshold } => Notification::new(
                NotificationKind::Alarm,
                format!("{name} below {threshold} {unit}"),
                format!(
                    "{name}: 1h average dropped to {average:.1} {unit} (trip threshold {threshold} {unit})"
                ),
            ),
            AlertTransition::Recovered { average, threshold } => Notification::new(
                NotificationKind::Recovery,
                format!("{name} recovered"),
                format!(
                    "{name}: 1h average back at {average:.1} {unit} (reset threshold {threshold} {unit})"
                ),
            ),
        }
    }

    #[instrument(skip(self, notice), fields(channel = %notice.channel))]
    pub async fn send_alert(&self, notice: &AlertNotice) {
        if !notice.notify {
            return;
        }

        self.dispatch(&Self::format_alert(notice)).await;
    }

    #[instrument(skip(self, text))]
    pub async fn send_report(&self, title: &str, text: &str) {
        self.dispatch(&Notification::new(NotificationKind::Report, title, text))
            .await;
    }

    /// Send and log the outcome, never fails
    async fn dispatch(&self, notification: &Notification) {
        match self.notifier.send(notification).await {
            Ok(()) => info!(
                "sent {:?} notification via {}",
                notification.kind,
                self.notifier.name()
            ),
            Err(e) => error!(
                "failed to send {:?} notification via {}: {e}",
                notification.kind,
                self.notifier.name()
            ),
        }
    }
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("notifier", &self.notifier.name())
            .finish()
    }
}
