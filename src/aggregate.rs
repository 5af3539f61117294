//! Rolling-window aggregation per channel
//!
//! Each channel owns a fixed-capacity FIFO of its most recent samples. The
//! average is always recomputed from the retained samples, never kept as a
//! running sum, so it cannot drift.
//!
//! [`ChannelAggregate`] puts the window, the last sample and the mirrored
//! alert state behind a single lock. The poll path is the only writer; the
//! report, alert and query paths only read.

use std::collections::VecDeque;

use tokio::sync::RwLock;

use crate::{Sample, config::ChannelConfig, monitors::hysteresis::AlertState};

/// Fixed-capacity FIFO of sample values
#[derive(Debug, Clone)]
pub struct RollingWindow {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest one when full
    pub fn push(&mut self, value: f32) {
        if self.capacity == 0 {
            return;
        }

        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    /// Arithmetic mean of the retained samples, `None` when empty
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }

        let sum: f64 = self.samples.iter().map(|&value| f64::from(value)).sum();
        Some(sum / self.samples.len() as f64)
    }

    pub fn last(&self) -> Option<f32> {
        self.samples.back().copied()
    }

    /// Retained values, oldest first
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }
}

/// Point-in-time view of a single channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSnapshot {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub last: Option<Sample>,
    pub average: Option<f64>,
    pub count: usize,
    pub capacity: usize,

    /// `None` when alerting is disabled for the channel
    pub alert_state: Option<AlertState>,
}

impl ChannelSnapshot {
    pub fn last_value(&self) -> Option<f32> {
        self.last.map(|sample| sample.value)
    }

    pub fn has_full_history(&self) -> bool {
        self.count >= self.capacity
    }
}

#[derive(Debug)]
struct ChannelData {
    window: RollingWindow,
    last: Option<Sample>,
    alert_state: Option<AlertState>,
}

/// Shared, lock-protected state of one channel
#[derive(Debug)]
pub struct ChannelAggregate {
    config: ChannelConfig,
    capacity: usize,
    data: RwLock<ChannelData>,
}

impl ChannelAggregate {
    pub fn new(config: ChannelConfig, capacity: usize) -> Self {
        let alert_state = config.alert.as_ref().map(|_| AlertState::Normal);

        Self {
            config,
            capacity,
            data: RwLock::new(ChannelData {
                window: RollingWindow::new(capacity),
                last: None,
                alert_state,
            }),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn append(&self, sample: Sample) {
        let mut data = self.data.write().await;
        data.window.push(sample.value);
        data.last = Some(sample);
    }

    /// Current `(average, count)` pair
    pub async fn stats(&self) -> (Option<f64>, usize) {
        let data = self.data.read().await;
        (data.window.average(), data.window.len())
    }

    pub async fn last_value(&self) -> Option<f32> {
        self.data.read().await.last.map(|sample| sample.value)
    }

    pub async fn set_alert_state(&self, state: AlertState) {
        self.data.write().await.alert_state = Some(state);
    }

    pub async fn snapshot(&self) -> ChannelSnapshot {
        let data = self.data.read().await;

        ChannelSnapshot {
            name: self.config.name.clone(),
            display_name: self.config.display_name().to_string(),
            unit: self.config.unit.clone(),
            last: data.last,
            average: data.window.average(),
            count: data.window.len(),
            capacity: data.window.capacity(),
            alert_state: data.alert_state,
        }
    }
}
