//! roundnet Core - round-based participant assignment over a fixed topology
//!
//! Participants wait in a lobby. Each round, free positions of the topology
//! are filled from the lobby by seniority (oldest arrival first) with random
//! placement, and the connections tagged with that round decide who interacts
//! with whom. Departures free their position for the next most senior
//! participant; the run ends when the topology's rounds are exhausted.
//!
//! ```text
//!  add/remove ──► Lobby ──┐
//!                         ▼
//!  play_round ──► Allocator ──► Seating ──► Topology.interactions(round)
//!                                                   │
//!                                                   ▼
//!                                             RoundRecord
//! ```

pub mod allocator;
pub mod config;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod lobby;
pub mod round;
pub mod seating;
pub mod shared;
pub mod topology;

#[cfg(test)]
mod test_support;

// Re-export key types for convenience
pub use config::ExperimentConfig;
pub use engine::{EngineState, RoundEngine};
pub use error::{ConfigError, RoundError, TopologyError};
pub use experiment::NetworkExperiment;
pub use lobby::{Lobby, Participant};
pub use round::{Interaction, RoundRecord};
pub use shared::SharedExperiment;
pub use topology::{Connection, PositionId, Topology, TopologyDescriptor};
