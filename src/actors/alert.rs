//! AlertActor - Dispatches alert transitions raised by the poll cycle
//!
//! The hysteresis itself is evaluated inside the poll cycle, which is the
//! sole writer of channel state. This actor only turns the transitions it
//! sees in each [`CycleEvent`] into notifications, so a slow sink never
//! delays polling.
//!
//! Muting suppresses notifications without touching alert state; a channel
//! that trips while muted will not alarm again until it has recovered.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::alerts::AlertManager;

use super::messages::{AlertCommand, CycleEvent};

/// Longest mute accepted through the API (30 days)
pub const MAX_MUTE_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mute {
    Off,
    Until(Instant),
    /// Deadline past what `Instant` can represent; lasts until unmuted
    Indefinite,
}

pub struct AlertActor {
    alert_manager: AlertManager,

    /// Cycle reports from the collector
    event_rx: broadcast::Receiver<CycleEvent>,

    command_rx: mpsc::Receiver<AlertCommand>,

    mute: Mute,
}

impl AlertActor {
    pub fn new(
        alert_manager: AlertManager,
        event_rx: broadcast::Receiver<CycleEvent>,
        command_rx: mpsc::Receiver<AlertCommand>,
    ) -> Self {
        Self {
            alert_manager,
            event_rx,
            command_rx,
            mute: Mute::Off,
        }
    }

    #[instrument(skip(self), name = "alerts")]
    pub async fn run(mut self) {
        debug!(
            "starting alert actor, notifying via {}",
            self.alert_manager.notifier_name()
        );

        loop {
            tokio::select! {
                result = self.event_rx.recv() => {
                    match result {
                        Ok(event) => self.handle_cycle_event(event).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("alert actor lagged, skipped {skipped} cycle events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("cycle event channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AlertCommand::Mute { duration_secs } => {
                            info!("muting alerts for {duration_secs}s");
                            self.mute = match Instant::now()
                                .checked_add(Duration::from_secs(duration_secs))
                            {
                                Some(until) => Mute::Until(until),
                                None => {
                                    warn!("mute of {duration_secs}s has no representable end, muting until unmuted");
                                    Mute::Indefinite
                                }
                            };
                        }

                        AlertCommand::Unmute => {
                            info!("unmuting alerts");
                            self.mute = Mute::Off;
                        }

                        AlertCommand::IsMuted { respond_to } => {
                            let _ = respond_to.send(self.is_muted());
                        }

                        AlertCommand::Shutdown => {
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

        debug!("alert actor stopped");
    }

    /// Mute state, clearing an expired mute
    fn is_muted(&mut self) -> bool {
        match self.mute {
            Mute::Indefinite => true,
            Mute::Until(until) if Instant::now() < until => true,
            Mute::Until(_) => {
                debug!("mute expired");
                self.mute = Mute::Off;
                false
            }
            Mute::Off => false,
        }
    }

    async fn handle_cycle_event(&mut self, event: CycleEvent) {
        if event.transitions.is_empty() {
            return;
        }

        if self.is_muted() {
            for notice in &event.transitions {
                info!("alerts muted, suppressing notification for {}", notice.channel);
            }
            return;
        }

        for notice in &event.transitions {
            self.alert_manager.send_alert(notice).await;
        }
    }
}

/// Handle for controlling the AlertActor
#[derive(Clone)]
pub struct AlertHandle {
    sender: mpsc::Sender<AlertCommand>,
}

impl AlertHandle {
    pub fn spawn(alert_manager: AlertManager, event_rx: broadcast::Receiver<CycleEvent>) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = AlertActor::new(alert_manager, event_rx, cmd_rx);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Mute alerts for a duration, after which they unmute on their own
    pub async fn mute_alerts(&self, duration_secs: u64) {
        let _ = self
            .sender
            .send(AlertCommand::Mute { duration_secs })
            .await;
    }

    pub async fn unmute_alerts(&self) {
        let _ = self.sender.send(AlertCommand::Unmute).await;
    }

    /// `None` when the actor is gone
    pub async fn is_muted(&self) -> Option<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AlertCommand::IsMuted { respond_to: tx })
            .await
            .ok()?;
        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(AlertCommand::Shutdown).await;
    }
}
