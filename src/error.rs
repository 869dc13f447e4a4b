use thiserror::Error;

use crate::types::Nibble;

pub type SimResult<T> = Result<T, SimError>;

/// Failures surfaced by the bench, configuration and CLI layers.
///
/// The controller model itself never fails; busy requests and unused inputs are
/// silent no-ops in hardware and only become errors when a bench asks for them.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON config '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("protocol violation at cycle {cycle}: {kind} (ui_in={ui_in:#04x})")]
    ProtocolViolation {
        cycle: u64,
        ui_in: u8,
        kind: ViolationKind,
    },

    #[error("data mismatch at cycle {cycle}: wrote {expected:X}, read back {actual:X}")]
    DataMismatch {
        cycle: u64,
        expected: Nibble,
        actual: Nibble,
    },

    #[error("expectation failed at cycle {cycle}: {message}")]
    ExpectationFailed { cycle: u64, message: String },

    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// `enable` asserted while `ready` was low; the request was dropped.
    RequestWhileBusy,
    /// A bitline had two drivers asserting different levels.
    BusContention,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::RequestWhileBusy => write!(f, "request while busy"),
            ViolationKind::BusContention => write!(f, "bitline contention"),
        }
    }
}
