//! Read-only projection over all channel aggregates

use std::sync::Arc;

use chrono::Utc;

use crate::{
    aggregate::{ChannelAggregate, ChannelSnapshot},
    report,
};

/// Cheap to clone, shared by the report actors and the API
#[derive(Debug, Clone)]
pub struct SnapshotReadModel {
    channels: Arc<[Arc<ChannelAggregate>]>,
}

impl SnapshotReadModel {
    pub fn new(channels: Vec<Arc<ChannelAggregate>>) -> Self {
        Self {
            channels: channels.into(),
        }
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    /// Snapshots of every channel, in configuration order
    pub async fn snapshot(&self) -> Vec<ChannelSnapshot> {
        let mut snapshots = Vec::with_capacity(self.channels.len());
        for channel in self.channels.iter() {
            snapshots.push(channel.snapshot().await);
        }
        snapshots
    }

    pub async fn channel(&self, name: &str) -> Option<ChannelSnapshot> {
        let channel = self.channels.iter().find(|c| c.name() == name)?;
        Some(channel.snapshot().await)
    }

    /// Render a report of the current state, without side effects
    pub async fn generate_report(&self, title: &str) -> String {
        report::render(title, Utc::now(), &self.snapshot().await)
    }
}
