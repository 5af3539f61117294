//! ReportActor - Sends the snapshot report at one daily wall-clock time
//!
//! Each configured time gets its own actor, so report times never wait on
//! each other or on the poll cadence.

use chrono::{DateTime, NaiveTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use crate::{alerts::AlertManager, schedule, snapshot::SnapshotReadModel};

use super::messages::ReportCommand;

pub struct ReportActor {
    at: NaiveTime,
    title: String,
    read_model: SnapshotReadModel,
    alert_manager: AlertManager,
    command_rx: mpsc::Receiver<ReportCommand>,
}

impl ReportActor {
    pub fn new(
        at: NaiveTime,
        title: String,
        read_model: SnapshotReadModel,
        alert_manager: AlertManager,
        command_rx: mpsc::Receiver<ReportCommand>,
    ) -> Self {
        Self {
            at,
            title,
            read_model,
            alert_manager,
            command_rx,
        }
    }

    #[instrument(skip(self), name = "reporter", fields(at = %self.at.format("%H:%M")))]
    pub async fn run(mut self) {
        // last fired occurrence, so an early wakeup cannot fire the same slot twice
        let mut fired: Option<DateTime<Utc>> = None;

        loop {
            let now = fired.map_or_else(Utc::now, |fired| fired.max(Utc::now()));
            let next = schedule::next_occurrence(now, self.at);
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            debug!("next report at {next} (in {}s)", wait.as_secs());

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.send_report().await;
                    fired = Some(next);
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        ReportCommand::ReportNow { respond_to } => {
                            let text = self.send_report().await;
                            let _ = respond_to.send(text);
                        }

                        ReportCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("report actor stopped");
    }

    async fn send_report(&self) -> String {
        let text = self.read_model.generate_report(&self.title).await;
        info!("sending scheduled report");
        self.alert_manager.send_report(&self.title, &text).await;
        text
    }
}

/// Handle for controlling a ReportActor
#[derive(Clone)]
pub struct ReportHandle {
    sender: mpsc::Sender<ReportCommand>,
    at: NaiveTime,
}

impl ReportHandle {
    pub fn spawn(
        at: NaiveTime,
        title: String,
        read_model: SnapshotReadModel,
        alert_manager: AlertManager,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = ReportActor::new(at, title, read_model, alert_manager, cmd_rx);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx, at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// Send the report now, returning the text that was sent
    pub async fn report_now(&self) -> anyhow::Result<String> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ReportCommand::ReportNow { respond_to: tx })
            .await
            .map_err(|_| anyhow::anyhow!("report actor is not running"))?;

        Ok(rx.await?)
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(ReportCommand::Shutdown).await;
    }
}
