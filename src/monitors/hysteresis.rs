//! Two-threshold alert gate over a rolling average
//!
//! ```text
//! Normal  + full window + average <  trip   → Tripped (one alarm)
//! Tripped + full window + average >= reset  → Normal  (recovery)
//! anything else                             → unchanged, silent
//! ```
//!
//! `reset` is strictly greater than `trip`, so an average hovering around a
//! single value cannot flip the state back and forth. A window that is not yet
//! full never changes the state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AlertConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    #[default]
    Normal,
    Tripped,
}

impl fmt::Display for AlertState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertState::Normal => write!(f, "normal"),
            AlertState::Tripped => write!(f, "tripped"),
        }
    }
}

/// Trip and reset thresholds with `reset > trip`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    trip: f64,
    reset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidThresholds {
    pub trip: f64,
    pub reset: f64,
}

impl fmt::Display for InvalidThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reset threshold ({}) must be greater than trip threshold ({})",
            self.reset, self.trip
        )
    }
}

impl std::error::Error for InvalidThresholds {}

impl Thresholds {
    pub fn new(trip: f64, reset: f64) -> Result<Self, InvalidThresholds> {
        // also rejects NaN on either side
        if reset > trip {
            Ok(Self { trip, reset })
        } else {
            Err(InvalidThresholds { trip, reset })
        }
    }

    pub fn trip(&self) -> f64 {
        self.trip
    }

    pub fn reset(&self) -> f64 {
        self.reset
    }
}

impl TryFrom<&AlertConfig> for Thresholds {
    type Error = InvalidThresholds;

    fn try_from(config: &AlertConfig) -> Result<Self, Self::Error> {
        Thresholds::new(config.trip, config.reset)
    }
}

/// Outcome of evaluating one rolling average against the thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvaluation {
    /// Window not yet full, state is held
    InsufficientHistory,

    /// Normal and staying normal
    Ok,

    /// Average just fell below `trip`
    Trips,

    /// Already tripped, average has not reached `reset`
    StillTripped,

    /// Average rose to or above `reset`
    Recovers,
}

impl AlertEvaluation {
    pub fn evaluate(
        state: AlertState,
        average: Option<f64>,
        count: usize,
        capacity: usize,
        thresholds: &Thresholds,
    ) -> AlertEvaluation {
        let Some(average) = average else {
            return AlertEvaluation::InsufficientHistory;
        };

        if count < capacity {
            return AlertEvaluation::InsufficientHistory;
        }

        match state {
            AlertState::Normal if average < thresholds.trip => AlertEvaluation::Trips,
            AlertState::Normal => AlertEvaluation::Ok,
            AlertState::Tripped if average >= thresholds.reset => AlertEvaluation::Recovers,
            AlertState::Tripped => AlertEvaluation::StillTripped,
        }
    }
}

/// Edge produced by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AlertTransition {
    Tripped { average: f64, threshold: f64 },
    Recovered { average: f64, threshold: f64 },
}

/// Per-channel hysteresis state
#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    state: AlertState,
    thresholds: Thresholds,
}

impl AlertStateMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            state: AlertState::Normal,
            thresholds,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Feed the current window statistics, returning a transition if one happened
    pub fn update(
        &mut self,
        average: Option<f64>,
        count: usize,
        capacity: usize,
    ) -> Option<AlertTransition> {
        let evaluation =
            AlertEvaluation::evaluate(self.state, average, count, capacity, &self.thresholds);

        match (evaluation, average) {
            (AlertEvaluation::Trips, Some(average)) => {
                self.state = AlertState::Tripped;
                Some(AlertTransition::Tripped {
                    average,
                    threshold: self.thresholds.trip,
                })
            }
            (AlertEvaluation::Recovers, Some(average)) => {
                self.state = AlertState::Normal;
                Some(AlertTransition::Recovered {
                    average,
                    threshold: self.thresholds.reset,
                })
            }
            _ => None,
        }
    }
}
