//! One connect → read → aggregate → evaluate → release iteration
//!
//! ```text
//! ensure session ──fail──► record failure, skip reads, wait for next tick
//!      │
//!      ▼
//! read every channel in order (a failed read never blocks the next one)
//!      │
//!      ▼
//! evaluate hysteresis for alert-enabled channels
//!      │
//!      ▼
//! release session according to ReconnectPolicy
//! ```
//!
//! Nothing in here returns an error: every failure is logged and folded into
//! the [`CycleReport`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, instrument, trace, warn};

use crate::{
    aggregate::ChannelAggregate,
    config::ReconnectPolicy,
    monitors::hysteresis::{AlertStateMachine, AlertTransition, InvalidThresholds, Thresholds},
    register::{ConnectionError, ReadError, RegisterAddress, RegisterClient},
};

/// How the session was obtained at the start of a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionOutcome {
    /// A new session was opened
    Established,

    /// A persistent session from an earlier cycle was reused
    Reused,

    /// No session could be opened, reads were skipped
    Failed {
        error: ConnectionError,
        consecutive_failures: u32,
    },
}

/// Result of reading one channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelReading {
    pub channel: String,
    pub result: Result<f32, ReadError>,
}

/// Alert state change raised during a cycle
#[derive(Debug, Clone, PartialEq)]
pub struct AlertNotice {
    pub channel: String,
    pub display_name: String,
    pub unit: String,
    pub transition: AlertTransition,

    /// Whether a notification should be sent for this transition
    pub notify: bool,
}

/// Everything that happened during one poll cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Sequence number, starting at 1
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub connection: ConnectionOutcome,
    pub readings: Vec<ChannelReading>,
    pub transitions: Vec<AlertNotice>,
}

impl CycleReport {
    pub fn connected(&self) -> bool {
        !matches!(self.connection, ConnectionOutcome::Failed { .. })
    }

    pub fn successful_reads(&self) -> usize {
        self.readings.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed_reads(&self) -> usize {
        self.readings.iter().filter(|r| r.result.is_err()).count()
    }

    pub fn reading(&self, channel: &str) -> Option<&ChannelReading> {
        self.readings.iter().find(|r| r.channel == channel)
    }
}

struct PolledChannel {
    aggregate: Arc<ChannelAggregate>,
    address: RegisterAddress,
    alert: Option<AlertStateMachine>,
    notify_recovery: bool,
}

/// Drives a [`RegisterClient`] across all configured channels
pub struct PollCycle<C> {
    client: C,
    channels: Vec<PolledChannel>,
    policy: ReconnectPolicy,
    cycles: u64,
    consecutive_failures: u32,
}

impl<C: RegisterClient> PollCycle<C> {
    /// Channels are polled in the order given
    pub fn new(
        client: C,
        channels: Vec<Arc<ChannelAggregate>>,
        default_unit_id: u8,
        policy: ReconnectPolicy,
    ) -> Result<Self, InvalidThresholds> {
        let channels = channels
            .into_iter()
            .map(|aggregate| {
                let config = aggregate.config();
                let address = RegisterAddress::for_channel(config, default_unit_id);
                let alert = config
                    .alert
                    .as_ref()
                    .map(|alert| Thresholds::try_from(alert).map(AlertStateMachine::new))
                    .transpose()?;
                let notify_recovery = config
                    .alert
                    .as_ref()
                    .is_some_and(|alert| alert.notify_recovery);

                Ok(PolledChannel {
                    aggregate,
                    address,
                    alert,
                    notify_recovery,
                })
            })
            .collect::<Result<Vec<_>, InvalidThresholds>>()?;

        Ok(Self {
            client,
            channels,
            policy,
            cycles: 0,
            consecutive_failures: 0,
        })
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    /// Run one full cycle
    #[instrument(skip(self), fields(cycle = self.cycles + 1))]
    pub async fn run_once(&mut self) -> CycleReport {
        self.cycles += 1;
        let started_at = Utc::now();

        let connection = match self.ensure_connected().await {
            Ok(outcome) => outcome,
            Err(outcome) => {
                return CycleReport {
                    cycle: self.cycles,
                    started_at,
                    connection: outcome,
                    readings: Vec::new(),
                    transitions: Vec::new(),
                };
            }
        };

        let mut readings = Vec::with_capacity(self.channels.len());
        let mut session_broken = false;

        for channel in &self.channels {
            let name = channel.aggregate.name().to_string();

            let read = self.client.read_pair(channel.address).await.and_then(|sample| {
                if sample.value.is_finite() {
                    Ok(sample)
                } else {
                    Err(ReadError::NotFinite {
                        bits: sample.value.to_bits(),
                    })
                }
            });

            let result = match read {
                Ok(sample) => {
                    trace!("{name}: read {}", sample.value);
                    channel.aggregate.append(sample).await;
                    Ok(sample.value)
                }
                Err(e) => {
                    warn!("{name}: {e}");
                    session_broken |= e.is_transport();
                    Err(e)
                }
            };

            readings.push(ChannelReading {
                channel: name,
                result,
            });
        }

        let transitions = self.evaluate_alerts().await;

        self.release(session_broken).await;

        debug!(
            "cycle finished: {}/{} reads ok, {} alert transitions",
            readings.iter().filter(|r| r.result.is_ok()).count(),
            readings.len(),
            transitions.len()
        );

        CycleReport {
            cycle: self.cycles,
            started_at,
            connection,
            readings,
            transitions,
        }
    }

    /// Close the session, used on shutdown
    pub async fn shutdown(&mut self) {
        debug!("closing controller session");
        self.client.close().await;
    }

    async fn ensure_connected(&mut self) -> Result<ConnectionOutcome, ConnectionOutcome> {
        if self.client.is_connected() {
            return Ok(ConnectionOutcome::Reused);
        }

        match self.client.connect().await {
            Ok(()) => {
                if self.consecutive_failures > 0 {
                    debug!(
                        "connection restored after {} failed attempts",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                Ok(ConnectionOutcome::Established)
            }
            Err(error) => {
                self.consecutive_failures += 1;
                error!(
                    "{error} ({} consecutive failures), skipping cycle",
                    self.consecutive_failures
                );
                // leave nothing half-open behind
                self.client.close().await;
                Err(ConnectionOutcome::Failed {
                    error,
                    consecutive_failures: self.consecutive_failures,
                })
            }
        }
    }

    async fn evaluate_alerts(&mut self) -> Vec<AlertNotice> {
        let mut notices = Vec::new();

        for channel in &mut self.channels {
            let Some(machine) = channel.alert.as_mut() else {
                continue;
            };

            let (average, count) = channel.aggregate.stats().await;
            let capacity = channel.aggregate.capacity();

            let Some(transition) = machine.update(average, count, capacity) else {
                continue;
            };

            channel.aggregate.set_alert_state(machine.state()).await;

            let config = channel.aggregate.config();
            let notify = match transition {
                AlertTransition::Tripped { average, threshold } => {
                    warn!(
                        "{}: rolling average {average:.2} fell below {threshold}",
                        config.name
                    );
                    true
                }
                AlertTransition::Recovered { average, threshold } => {
                    debug!(
                        "{}: rolling average {average:.2} back above {threshold}",
                        config.name
                    );
                    channel.notify_recovery
                }
            };

            notices.push(AlertNotice {
                channel: config.name.clone(),
                display_name: config.display_name().to_string(),
                unit: config.unit.clone(),
                transition,
                notify,
            });
        }

        notices
    }

    async fn release(&mut self, session_broken: bool) {
        match self.policy {
            ReconnectPolicy::CloseAfterCycle => self.client.close().await,
            ReconnectPolicy::Persistent if session_broken => {
                debug!("dropping persistent session after transport error");
                self.client.close().await;
            }
            ReconnectPolicy::Persistent => {}
        }
    }
}
