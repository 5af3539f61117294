pub mod actors;
pub mod aggregate;
pub mod alerts;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod cycle;
pub mod monitors;
pub mod notify;
pub mod register;
pub mod report;
pub mod runtime;
pub mod schedule;
pub mod snapshot;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successfully decoded register reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f32,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            timestamp: Utc::now(),
        }
    }
}
