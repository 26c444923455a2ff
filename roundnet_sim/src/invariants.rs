//! Invariant checks run against a live engine.
//!
//! These play the role of ground truth: the engine under test is inspected
//! through its public accessors only, and every broken property is reported
//! as a [`Violation`].

use roundnet_core::{RoundEngine, RoundRecord, Topology};
use roundnet_env::{ExperimentContext, ParticipantId};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("round {round}: {participant} paired with itself")]
    SelfPair { round: u32, participant: ParticipantId },

    #[error("round {round}: pair {a}/{b} appears twice")]
    RepeatedPair {
        round: u32,
        a: ParticipantId,
        b: ParticipantId,
    },

    #[error("round {round}: {actual} interactions, topology declares {expected}")]
    InteractionCount {
        round: u32,
        expected: usize,
        actual: usize,
    },

    #[error("{free} free + {seated} seated positions != {total}")]
    SeatCount {
        free: usize,
        seated: usize,
        total: usize,
    },

    #[error("{0} holds a position but is not in the lobby")]
    SeatedOutsideLobby(ParticipantId),

    #[error("{0} is not the occupant of the position it is assigned to")]
    SeatMismatch(ParticipantId),

    #[error("{0} should have been seated by seniority")]
    SeniorityBypassed(ParticipantId),

    #[error("{0} was seated ahead of a more senior participant")]
    SeatedOutOfTurn(ParticipantId),

    #[error("{participant} met {actual} distinct partners, topology dictates {expected}")]
    PartnerCount {
        participant: ParticipantId,
        expected: usize,
        actual: usize,
    },

    #[error("round counter is {actual}, expected {expected}")]
    RoundCounter { expected: u32, actual: u32 },

    #[error("unexpected engine result: {0}")]
    Unexpected(String),
}

/// Checks one record against the topology it came from.
pub fn check_record(record: &RoundRecord, topology: &Topology) -> Result<(), Violation> {
    let expected = topology.interactions(record.round).len();
    if record.interactions.len() != expected {
        return Err(Violation::InteractionCount {
            round: record.round,
            expected,
            actual: record.interactions.len(),
        });
    }

    let mut seen = HashSet::new();
    for interaction in &record.interactions {
        if interaction.source.id == interaction.target.id {
            return Err(Violation::SelfPair {
                round: record.round,
                participant: interaction.source.id.clone(),
            });
        }
        let (a, b) = interaction.unordered_ids();
        if !seen.insert((a.clone(), b.clone())) {
            return Err(Violation::RepeatedPair {
                round: record.round,
                a: a.clone(),
                b: b.clone(),
            });
        }
    }
    Ok(())
}

/// Checks that seating and lobby agree.
pub fn check_consistency<C: ExperimentContext>(engine: &RoundEngine<C>) -> Result<(), Violation> {
    let total = engine.topology().position_count();
    let free = engine.free_positions().len();
    let seated = engine.assignments().count();
    if free + seated != total {
        return Err(Violation::SeatCount { free, seated, total });
    }

    for (id, position) in engine.assignments() {
        if !engine.lobby().contains(id) {
            return Err(Violation::SeatedOutsideLobby(id.clone()));
        }
        if engine.occupant(position) != Some(id) || engine.free_positions().contains(&position) {
            return Err(Violation::SeatMismatch(id.clone()));
        }
    }
    Ok(())
}

/// Checks the allocation a round made.
///
/// `waiting_before` is the seniority-ordered waiting list and `free_before`
/// the free position count, both captured just before `play_round`.
pub fn check_seniority<C: ExperimentContext>(
    engine: &RoundEngine<C>,
    waiting_before: &[ParticipantId],
    free_before: usize,
) -> Result<(), Violation> {
    let admitted = free_before.min(waiting_before.len());
    for id in &waiting_before[..admitted] {
        if engine.position_of(id).is_none() {
            return Err(Violation::SeniorityBypassed(id.clone()));
        }
    }
    for id in &waiting_before[admitted..] {
        if engine.position_of(id).is_some() {
            return Err(Violation::SeatedOutOfTurn(id.clone()));
        }
    }
    Ok(())
}

/// Checks partner counts over an uninterrupted run (no departures).
///
/// Every seated participant must have met exactly the occupants of the
/// positions its own position connects to.
pub fn check_partners<C: ExperimentContext>(engine: &RoundEngine<C>) -> Result<(), Violation> {
    let topology = engine.topology();
    let mut met: HashMap<&ParticipantId, HashSet<&ParticipantId>> = HashMap::new();
    for record in engine.history() {
        for interaction in &record.interactions {
            met.entry(&interaction.source.id)
                .or_default()
                .insert(&interaction.target.id);
            met.entry(&interaction.target.id)
                .or_default()
                .insert(&interaction.source.id);
        }
    }

    for (id, position) in engine.assignments() {
        let expected = topology
            .connections()
            .iter()
            .filter(|c| c.round <= engine.round())
            .filter_map(|c| c.other(position))
            .collect::<HashSet<_>>()
            .len();
        let actual = met.get(id).map(HashSet::len).unwrap_or(0);
        if actual != expected {
            return Err(Violation::PartnerCount {
                participant: id.clone(),
                expected,
                actual,
            });
        }
    }
    Ok(())
}
