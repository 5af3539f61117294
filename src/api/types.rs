//! API request and response types

use serde::{Deserialize, Serialize};

use crate::{
    aggregate::ChannelSnapshot,
    cycle::CycleReport,
    monitors::hysteresis::AlertState,
};

/// Overall health derived from the last poll cycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ControllerHealth {
    /// Last cycle reached the controller
    Up,
    /// Last cycle could not connect
    Down,
    /// No cycle has completed yet
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub controller: ControllerHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_cycle: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_success: Option<String>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelResponse {
    pub name: String,
    pub display_name: String,
    pub unit: String,
    pub last_value: Option<f32>,
    pub last_sample_at: Option<String>,
    pub average: Option<f64>,
    pub count: usize,
    pub capacity: usize,
    pub full_history: bool,
    /// Absent when alerting is disabled for the channel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_state: Option<AlertState>,
}

impl From<ChannelSnapshot> for ChannelResponse {
    fn from(snapshot: ChannelSnapshot) -> Self {
        let full_history = snapshot.has_full_history();
        Self {
            last_value: snapshot.last_value(),
            last_sample_at: snapshot.last.map(|s| s.timestamp.to_rfc3339()),
            name: snapshot.name,
            display_name: snapshot.display_name,
            unit: snapshot.unit,
            average: snapshot.average,
            count: snapshot.count,
            capacity: snapshot.capacity,
            full_history,
            alert_state: snapshot.alert_state,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsResponse {
    pub channels: Vec<ChannelResponse>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadErrorResponse {
    pub channel: String,
    pub error: String,
}

/// Outcome of an on-demand poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    pub cycle: u64,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_error: Option<String>,
    pub successful_reads: usize,
    pub failed_reads: usize,
    pub errors: Vec<ReadErrorResponse>,
    pub transitions: usize,
}

impl From<&CycleReport> for PollResponse {
    fn from(report: &CycleReport) -> Self {
        let connection_error = match &report.connection {
            crate::cycle::ConnectionOutcome::Failed { error, .. } => Some(error.to_string()),
            _ => None,
        };

        Self {
            cycle: report.cycle,
            connected: report.connected(),
            connection_error,
            successful_reads: report.successful_reads(),
            failed_reads: report.failed_reads(),
            errors: report
                .readings
                .iter()
                .filter_map(|r| {
                    r.result.as_ref().err().map(|e| ReadErrorResponse {
                        channel: r.channel.clone(),
                        error: e.to_string(),
                    })
                })
                .collect(),
            transitions: report.transitions.len(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MuteRequest {
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MuteResponse {
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub title: Option<String>,
}
