//! Wiring of aggregates, actors and the optional API for one controller

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::{
    actors::{
        alert::AlertHandle, collector::CollectorHandle, messages::CycleEvent,
        reporter::ReportHandle,
    },
    aggregate::ChannelAggregate,
    alerts::AlertManager,
    config::Config,
    cycle::PollCycle,
    notify::{Notifier, build_notifier},
    register::RegisterClient,
    snapshot::SnapshotReadModel,
};

const EVENT_CAPACITY: usize = 64;

/// Running monitor, stopped with [`Monitor::shutdown`]
pub struct Monitor {
    pub read_model: SnapshotReadModel,
    pub collector: CollectorHandle,
    pub alerts: AlertHandle,
    pub reporters: Vec<ReportHandle>,
    event_tx: broadcast::Sender<CycleEvent>,
    #[cfg(feature = "api")]
    api_addr: Option<std::net::SocketAddr>,
}

impl Monitor {
    /// Start with the notifier described by the config
    pub async fn start<C: RegisterClient + 'static>(config: &Config, client: C) -> Result<Self> {
        let notifier =
            build_notifier(config.notifier.as_ref()).context("failed to set up notifier")?;
        Self::start_with_notifier(config, client, notifier).await
    }

    pub async fn start_with_notifier<C: RegisterClient + 'static>(
        config: &Config,
        client: C,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let aggregates: Vec<Arc<ChannelAggregate>> = config
            .channels
            .iter()
            .map(|channel| Arc::new(ChannelAggregate::new(channel.clone(), config.window)))
            .collect();

        let read_model = SnapshotReadModel::new(aggregates.clone());
        let alert_manager = AlertManager::new(notifier);

        let cycle = PollCycle::new(
            client,
            aggregates,
            config.controller.unit_id,
            config.controller.reconnect,
        )
        .context("invalid alert thresholds")?;

        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        // subscribe before the collector runs its first cycle
        let alerts = AlertHandle::spawn(alert_manager.clone(), event_tx.subscribe());
        #[cfg(feature = "api")]
        let api_events = event_tx.subscribe();

        let collector = CollectorHandle::spawn(
            cycle,
            Duration::from_secs(config.interval),
            event_tx.clone(),
        );

        let reporters = config
            .reports
            .times
            .iter()
            .map(|&at| {
                debug!("scheduling daily report at {} UTC", at.format("%H:%M"));
                ReportHandle::spawn(
                    at,
                    config.reports.title.clone(),
                    read_model.clone(),
                    alert_manager.clone(),
                )
            })
            .collect();

        #[cfg(feature = "api")]
        let api_addr = match &config.api {
            Some(settings) => {
                let state = crate::api::ApiState::new(
                    read_model.clone(),
                    collector.clone(),
                    alerts.clone(),
                    api_events,
                    config.reports.title.clone(),
                );
                Some(crate::api::spawn_api_server(settings.clone().into(), state).await?)
            }
            None => None,
        };

        info!(
            "monitoring {} channels on {}, polling every {}s",
            config.channels.len(),
            config.controller.endpoint(),
            config.interval
        );

        Ok(Self {
            read_model,
            collector,
            alerts,
            reporters,
            event_tx,
            #[cfg(feature = "api")]
            api_addr,
        })
    }

    /// Receive every cycle report from now on
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.event_tx.subscribe()
    }

    /// Address the API server is bound to, if enabled
    #[cfg(feature = "api")]
    pub fn api_addr(&self) -> Option<std::net::SocketAddr> {
        self.api_addr
    }

    /// Stop every actor; returns after the controller session is closed
    pub async fn shutdown(self) -> Result<()> {
        for reporter in &self.reporters {
            reporter.shutdown().await;
        }
        self.alerts.shutdown().await;
        self.collector.shutdown().await?;
        info!("monitor stopped");
        Ok(())
    }
}
