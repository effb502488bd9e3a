//! Engine error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lifecycle phase of a simulation episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EpisodeState {
    /// Constructed, never reset.
    Idle,
    /// Reset, no step taken yet.
    Ready,
    Running,
    /// Data exhausted or halted. Absorbing until the next reset.
    Terminated,
}

impl std::fmt::Display for EpisodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EpisodeState::Idle => "idle",
            EpisodeState::Ready => "ready",
            EpisodeState::Running => "running",
            EpisodeState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Why an aligned series was rejected at reset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("tick series is empty")]
    Empty,

    #[error("timestamps not strictly increasing at index {index} ({previous} -> {current})")]
    NonMonotonic {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("close at index {index} is not a positive finite number: {close}")]
    InvalidClose { index: usize, close: f64 },

    #[error("gap of {gap_secs}s at index {index} exceeds the tolerance of {max_gap_secs}s")]
    GapTooLarge {
        index: usize,
        gap_secs: i64,
        max_gap_secs: i64,
    },
}

/// Contract violations against the episode state machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{operation} is not allowed while the episode is {state}")]
    InvalidState {
        operation: &'static str,
        state: EpisodeState,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}
