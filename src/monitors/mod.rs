pub mod hysteresis;

pub use hysteresis::{AlertEvaluation, AlertState, AlertStateMachine, AlertTransition, Thresholds};
