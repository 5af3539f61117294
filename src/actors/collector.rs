//! CollectorActor - Drives the poll cycle on a fixed cadence
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → PollCycle::run_once → Publish CycleEvent → [AlertActor, ...]
//!     ↑
//!     └─── Commands (PollNow, UpdateInterval, Shutdown)
//! ```
//!
//! The actor owns the register client, so the controller session is never
//! touched from anywhere else.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, trace, warn};

use crate::{cycle::PollCycle, register::RegisterClient};

use super::messages::{CollectorCommand, CycleEvent};

fn poll_ticker(period: Duration, start: Instant) -> Interval {
    let mut ticker = interval_at(start, period);
    // a slow cycle pushes the schedule back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

pub struct CollectorActor<C> {
    cycle: PollCycle<C>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<CollectorCommand>,

    /// Broadcast sender for publishing cycle reports
    event_tx: broadcast::Sender<CycleEvent>,

    interval_duration: Duration,
}

impl<C: RegisterClient + 'static> CollectorActor<C> {
    pub fn new(
        cycle: PollCycle<C>,
        interval: Duration,
        command_rx: mpsc::Receiver<CollectorCommand>,
        event_tx: broadcast::Sender<CycleEvent>,
    ) -> Self {
        Self {
            cycle,
            command_rx,
            event_tx,
            interval_duration: interval,
        }
    }

    /// Run until a Shutdown command arrives or every handle is dropped
    ///
    /// The first cycle runs immediately.
    #[instrument(skip(self), name = "collector")]
    pub async fn run(mut self) {
        debug!(
            "starting collector actor, polling every {:?}",
            self.interval_duration
        );

        let mut ticker = poll_ticker(self.interval_duration, Instant::now());

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        CollectorCommand::PollNow { respond_to } => {
                            debug!("received PollNow command");
                            let event = self.poll().await;
                            let _ = respond_to.send(event);
                        }

                        CollectorCommand::UpdateInterval { interval_secs } => {
                            if interval_secs == 0 {
                                warn!("ignoring zero poll interval");
                                continue;
                            }
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = poll_ticker(
                                self.interval_duration,
                                Instant::now() + self.interval_duration,
                            );
                        }

                        CollectorCommand::Shutdown { respond_to } => {
                            debug!("received shutdown command");
                            self.cycle.shutdown().await;
                            let _ = respond_to.send(());
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    self.cycle.shutdown().await;
                    break;
                }
            }
        }

        info!("collector stopped, controller session closed");
    }

    async fn poll(&mut self) -> CycleEvent {
        let event = Arc::new(self.cycle.run_once().await);

        // no subscribers is fine
        match self.event_tx.send(event.clone()) {
            Ok(num_receivers) => {
                trace!("published cycle event to {num_receivers} receivers");
            }
            Err(_) => {
                trace!("no receivers for cycle event");
            }
        }

        event
    }
}

/// Handle for controlling a CollectorActor
#[derive(Clone)]
pub struct CollectorHandle {
    sender: mpsc::Sender<CollectorCommand>,
}

impl CollectorHandle {
    /// Spawn the actor as a tokio task
    pub fn spawn<C: RegisterClient + 'static>(
        cycle: PollCycle<C>,
        interval: Duration,
        event_tx: broadcast::Sender<CycleEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = CollectorActor::new(cycle, interval, cmd_rx, event_tx);
        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Run a cycle now and wait for its report
    pub async fn poll_now(&self) -> Result<CycleEvent> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectorCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive cycle report")
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(CollectorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Stop the actor, returning once the controller session is closed
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CollectorCommand::Shutdown { respond_to: tx })
            .await
            .context("failed to send Shutdown command")?;

        rx.await.context("collector stopped without acknowledging")
    }
}
