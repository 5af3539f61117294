//! Error types for register access

use std::fmt;

/// The session to the controller could not be established
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Host name did not resolve to any address
    Resolve(String),

    /// TCP connect was refused or failed
    Refused(String),

    /// Handshake did not finish within the connect timeout
    Timeout,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Resolve(msg) => write!(f, "failed to resolve controller address: {msg}"),
            ConnectionError::Refused(msg) => write!(f, "failed to connect to controller: {msg}"),
            ConnectionError::Timeout => write!(f, "timed out connecting to controller"),
        }
    }
}

impl std::error::Error for ConnectionError {}

/// A single register read failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The controller answered with a protocol exception
    Protocol(String),

    /// The response did not carry exactly two registers
    Malformed { expected: usize, received: usize },

    /// The registers decoded to NaN or infinity, usually a sensor fault code
    NotFinite { bits: u32 },

    /// The session broke, timed out or was never opened
    Transport(String),
}

impl ReadError {
    /// Whether the session should be considered unusable after this error
    pub fn is_transport(&self) -> bool {
        matches!(self, ReadError::Transport(_))
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Protocol(msg) => write!(f, "controller returned exception: {msg}"),
            ReadError::Malformed { expected, received } => write!(
                f,
                "malformed register payload: expected {expected} registers, got {received}"
            ),
            ReadError::NotFinite { bits } => {
                write!(f, "decoded value is not finite (0x{bits:08X})")
            }
            ReadError::Transport(msg) => write!(f, "transport error during read: {msg}"),
        }
    }
}

impl std::error::Error for ReadError {}
