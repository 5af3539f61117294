//! API shared state

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

use crate::{
    actors::{alert::AlertHandle, collector::CollectorHandle, messages::CycleEvent},
    cycle::ConnectionOutcome,
    snapshot::SnapshotReadModel,
};

/// Controller reachability as seen by the most recent cycle
#[derive(Debug, Clone, Default)]
pub struct ControllerStatus {
    pub last_cycle: Option<u64>,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub connected: Option<bool>,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
}

/// Controller status fed from cycle events
#[derive(Debug, Default)]
pub struct ControllerStatusStore {
    status: RwLock<ControllerStatus>,
}

impl ControllerStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> ControllerStatus {
        self.status.read().await.clone()
    }

    pub async fn handle_event(&self, event: &CycleEvent) {
        let mut status = self.status.write().await;

        status.last_cycle = Some(event.cycle);
        status.last_cycle_at = Some(event.started_at);

        match &event.connection {
            ConnectionOutcome::Failed {
                error,
                consecutive_failures,
            } => {
                status.connected = Some(false);
                status.consecutive_failures = *consecutive_failures;
                status.last_error = Some(error.to_string());
            }
            ConnectionOutcome::Established | ConnectionOutcome::Reused => {
                status.connected = Some(true);
                status.consecutive_failures = 0;
                status.last_success_at = Some(event.started_at);
                status.last_error = event
                    .readings
                    .iter()
                    .find_map(|r| r.result.as_ref().err())
                    .map(|e| e.to_string());
            }
        }
    }

    /// Keep the store current until the event channel closes
    pub fn spawn_tracker(self: Arc<Self>, mut event_rx: broadcast::Receiver<CycleEvent>) {
        tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => self.handle_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("status tracker lagged, skipped {skipped} cycle events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("status tracker stopped");
        });
    }
}

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub read_model: SnapshotReadModel,

    /// Handle to the collector for on-demand polls
    pub collector: CollectorHandle,

    pub alerts: AlertHandle,

    pub status: Arc<ControllerStatusStore>,

    /// Title used when the report request does not name one
    pub report_title: String,
}

impl ApiState {
    pub fn new(
        read_model: SnapshotReadModel,
        collector: CollectorHandle,
        alerts: AlertHandle,
        event_rx: broadcast::Receiver<CycleEvent>,
        report_title: String,
    ) -> Self {
        let status = Arc::new(ControllerStatusStore::new());
        status.clone().spawn_tracker(event_rx);

        Self {
            read_model,
            collector,
            alerts,
            status,
            report_title,
        }
    }
}
