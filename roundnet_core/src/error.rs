//! Error types for the round engine.
//!
//! Only two failures can come out of `play_round`, and both leave the engine
//! exactly as it was before the call.

use crate::topology::PositionId;
use thiserror::Error;

/// A rejected `play_round` request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoundError {
    /// Fewer participants in the lobby than positions in the topology.
    /// Recoverable by adding participants and retrying.
    #[error("Not enough users in the lobby. Need at least {required}.")]
    InsufficientParticipants { present: usize, required: usize },

    /// Every round the topology declares has been played.
    /// Recoverable only through `reset`.
    #[error("Experiment has already ended. Round limit reached.")]
    RoundLimitReached { max_rounds: u32 },
}

impl RoundError {
    /// Stable machine-readable code for callers mapping errors to UI.
    pub fn code(&self) -> &'static str {
        match self {
            RoundError::InsufficientParticipants { .. } => "insufficient-participants",
            RoundError::RoundLimitReached { .. } => "round-limit-reached",
        }
    }

    /// True if adding participants can make the next attempt succeed.
    pub fn is_capacity(&self) -> bool {
        matches!(self, RoundError::InsufficientParticipants { .. })
    }
}

/// A malformed topology descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Topology has no positions")]
    NoPositions,

    #[error("Position {0} declared more than once")]
    DuplicatePosition(PositionId),

    #[error("Connection references unknown position {0}")]
    UnknownPosition(PositionId),

    #[error("Connection from position {0} to itself")]
    SelfLoop(PositionId),

    #[error("Connection {from}-{to} is tagged with round 0; rounds start at 1")]
    RoundZero { from: PositionId, to: PositionId },

    #[error("Connection {from}-{to} declared twice in round {round}")]
    DuplicateConnection {
        from: PositionId,
        to: PositionId,
        round: u32,
    },
}

/// Failure to load an experiment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("max_rounds {requested} exceeds the {declared} rounds the topology declares")]
    TooManyRounds { requested: u32, declared: u32 },

    #[error("max_rounds must be at least 1")]
    NoRounds,
}
