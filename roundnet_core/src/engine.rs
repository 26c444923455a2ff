//! Round Engine - orchestrates lobby, allocator and topology per round.
//!
//! # State machine
//!
//! ```text
//!   ┌──────┐ play_round ┌─────────────┐ play_round (round == max) ┌───────┐
//!   │ Idle │───────────►│ In progress │──────────────────────────►│ Ended │
//!   └──────┘            └─────────────┘                           └───────┘
//!      ▲                                                              │
//!      └──────────────────────────── reset ───────────────────────────┘
//! ```
//!
//! A rejected `play_round` never mutates anything.

use crate::allocator::fill_vacancies;
use crate::error::RoundError;
use crate::experiment::NetworkExperiment;
use crate::lobby::{Lobby, Participant};
use crate::round::{Interaction, RoundRecord};
use crate::seating::Seating;
use crate::topology::{Connection, PositionId, Topology};

use roundnet_env::{ExperimentContext, ParticipantId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the engine is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No round played yet
    Idle,
    /// At least one round played, more remain
    InProgress,
    /// Round limit reached; only `reset` moves on
    Ended,
}

/// Runs one experiment over a fixed topology.
///
/// Generic over the context so the same engine runs on OS entropy in
/// production and on a seeded RNG in simulation.
pub struct RoundEngine<C: ExperimentContext> {
    context: Arc<C>,
    topology: Arc<Topology>,
    max_rounds: u32,

    lobby: Lobby,
    seating: Seating,
    round: u32,
    history: Vec<RoundRecord>,
}

impl<C: ExperimentContext> RoundEngine<C> {
    /// Creates an engine that plays every round the topology declares.
    pub fn new(context: Arc<C>, topology: Arc<Topology>) -> Self {
        let max_rounds = topology.max_round();
        Self::with_max_rounds(context, topology, max_rounds)
    }

    /// Creates an engine with an explicit round limit.
    ///
    /// The limit is clamped to the topology's declared rounds.
    pub fn with_max_rounds(context: Arc<C>, topology: Arc<Topology>, max_rounds: u32) -> Self {
        let max_rounds = max_rounds.min(topology.max_round());
        let seating = Seating::new(&topology);
        Self {
            context,
            topology,
            max_rounds,
            lobby: Lobby::new(),
            seating,
            round: 0,
            history: Vec::new(),
        }
    }

    /// Engine over the six-position, two-round dyadic reference topology.
    pub fn six_node_dyadic(context: Arc<C>) -> Self {
        Self::new(context, Arc::new(Topology::six_node_dyadic()))
    }

    /// Plays the next round.
    ///
    /// Fills vacated positions by seniority, then pairs the occupants of every
    /// connection tagged with the new round number.
    pub fn play_round(&mut self) -> Result<RoundRecord, RoundError> {
        let required = self.topology.position_count();
        if self.lobby.len() < required {
            warn!(
                "Round rejected: {} participants in lobby, {} required",
                self.lobby.len(),
                required
            );
            return Err(RoundError::InsufficientParticipants {
                present: self.lobby.len(),
                required,
            });
        }

        if self.round >= self.max_rounds {
            warn!("Round rejected: limit of {} rounds reached", self.max_rounds);
            return Err(RoundError::RoundLimitReached {
                max_rounds: self.max_rounds,
            });
        }

        self.round += 1;

        let placements = fill_vacancies(&self.lobby, &mut self.seating, self.context.as_ref());
        if !placements.is_empty() {
            debug!("Round {}: seated {} participants", self.round, placements.len());
        }

        let interactions: Vec<Interaction> = self
            .topology
            .interactions(self.round)
            .iter()
            .filter_map(|connection| self.resolve(connection))
            .collect();

        let record = RoundRecord {
            round: self.round,
            interactions,
        };
        info!(
            "Round {}/{} played: {} interactions",
            record.round,
            self.max_rounds,
            record.interactions.len()
        );

        self.history.push(record.clone());
        Ok(record)
    }

    /// Maps a connection's endpoints to their current occupants.
    fn resolve(&self, connection: &Connection) -> Option<Interaction> {
        let source = self.occupant_participant(connection.source);
        let target = self.occupant_participant(connection.target);
        match (source, target) {
            (Some(source), Some(target)) => Some(Interaction {
                source: source.clone(),
                target: target.clone(),
                source_position: connection.source,
                target_position: connection.target,
            }),
            _ => {
                warn!(
                    "Connection {}-{} has an empty endpoint in round {}",
                    connection.source, connection.target, self.round
                );
                None
            }
        }
    }

    fn occupant_participant(&self, position: PositionId) -> Option<&Participant> {
        self.seating
            .occupant(position)
            .and_then(|id| self.lobby.get(id))
    }

    /// Returns the current state of the run.
    pub fn state(&self) -> EngineState {
        if self.round >= self.max_rounds {
            EngineState::Ended
        } else if self.round == 0 {
            EngineState::Idle
        } else {
            EngineState::InProgress
        }
    }

    /// Number of the last round played (0 before the first).
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Every round played since the last reset, oldest first.
    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn lobby(&self) -> &Lobby {
        &self.lobby
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn position_of(&self, id: &ParticipantId) -> Option<PositionId> {
        self.seating.position_of(id)
    }

    pub fn occupant(&self, position: PositionId) -> Option<&ParticipantId> {
        self.seating.occupant(position)
    }

    /// Current participant -> position assignments, in no particular order.
    pub fn assignments(&self) -> impl Iterator<Item = (&ParticipantId, PositionId)> {
        self.seating.assignments()
    }

    pub fn free_positions(&self) -> &[PositionId] {
        self.seating.free_positions()
    }

    /// Participants not holding a position, most senior first.
    pub fn waiting(&self) -> Vec<&Participant> {
        self.lobby.by_seniority(|id| !self.seating.is_seated(id))
    }
}

impl<C: ExperimentContext> NetworkExperiment for RoundEngine<C> {
    fn add_participant(&mut self, participant: Participant) {
        debug!("Participant {} joined the lobby", participant.id);
        self.lobby.insert(participant);
    }

    fn remove_participant(&mut self, id: &ParticipantId) -> Option<Participant> {
        let removed = self.lobby.remove(id)?;
        match self.seating.release(id) {
            Some(position) => info!("Participant {} left; position {} is free", id, position),
            None => debug!("Participant {} left the lobby", id),
        }
        Some(removed)
    }

    fn reset(&mut self) {
        info!(
            "Resetting experiment after {} rounds ({} participants kept)",
            self.round,
            self.lobby.len()
        );
        self.round = 0;
        self.history.clear();
        self.seating.clear(&self.topology);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{user, ScriptedContext, SeededContext};
    use std::collections::HashSet;

    fn dyadic<C: ExperimentContext>(ctx: C) -> RoundEngine<C> {
        RoundEngine::six_node_dyadic(Arc::new(ctx))
    }

    fn fill(engine: &mut RoundEngine<impl ExperimentContext>, count: u64) {
        for i in 0..count {
            engine.add_participant(user(i));
        }
    }

    fn seated_ids<C: ExperimentContext>(engine: &RoundEngine<C>) -> HashSet<String> {
        engine
            .assignments()
            .map(|(id, _)| id.as_str().to_string())
            .collect()
    }

    fn assert_pairs_unique(record: &RoundRecord) {
        let mut seen = HashSet::new();
        for interaction in &record.interactions {
            assert_ne!(interaction.source.id, interaction.target.id);
            let (a, b) = interaction.unordered_ids();
            assert!(seen.insert((a.clone(), b.clone())), "pair repeated in round");
        }
    }

    #[test]
    fn test_rejects_round_without_enough_participants() {
        let mut engine = dyadic(SeededContext::new(1));
        assert_eq!(
            engine.play_round(),
            Err(RoundError::InsufficientParticipants { present: 0, required: 6 })
        );

        fill(&mut engine, 5);
        let err = engine.play_round().unwrap_err();
        assert_eq!(err.code(), "insufficient-participants");
        assert_eq!(engine.round(), 0);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.history().is_empty());
        assert_eq!(engine.free_positions().len(), 6);
    }

    #[test]
    fn test_six_participants_play_two_rounds() {
        let mut engine = dyadic(SeededContext::new(42));
        fill(&mut engine, 6);

        let first = engine.play_round().unwrap();
        assert_eq!(first.round, 1);
        assert_eq!(first.interactions.len(), 3);
        let everyone: HashSet<_> = first.participants().into_iter().cloned().collect();
        assert_eq!(everyone.len(), 6);
        assert_pairs_unique(&first);
        assert_eq!(engine.state(), EngineState::InProgress);

        let second = engine.play_round().unwrap();
        assert_eq!(second.round, 2);
        assert_eq!(second.interactions.len(), 3);
        assert_pairs_unique(&second);
        for interaction in &second.interactions {
            assert!(!first.pairs(&interaction.source.id, &interaction.target.id));
        }
        assert_eq!(engine.state(), EngineState::Ended);

        assert_eq!(
            engine.play_round(),
            Err(RoundError::RoundLimitReached { max_rounds: 2 })
        );
        assert_eq!(engine.round(), 2);
        assert_eq!(engine.history().len(), 2);
    }

    #[test]
    fn test_each_participant_meets_two_distinct_partners() {
        let mut engine = dyadic(SeededContext::new(7));
        fill(&mut engine, 6);
        let first = engine.play_round().unwrap();
        let second = engine.play_round().unwrap();

        for i in 0..6 {
            let id = user(i).id;
            let mut partners: Vec<&ParticipantId> = first.partners_of(&id);
            partners.extend(second.partners_of(&id));
            assert_eq!(partners.len(), 2);
            assert_ne!(partners[0], partners[1]);
        }
    }

    #[test]
    fn test_most_senior_participants_are_seated() {
        let mut engine = dyadic(ScriptedContext::always_last());
        // Newest first, so insertion order disagrees with seniority
        for i in (0..12).rev() {
            engine.add_participant(user(i));
        }
        engine.play_round().unwrap();

        let expected: HashSet<String> = (0..6).map(|i| format!("user-{}", i)).collect();
        assert_eq!(seated_ids(&engine), expected);

        let waiting: Vec<&str> = engine.waiting().into_iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            waiting,
            vec!["user-6", "user-7", "user-8", "user-9", "user-10", "user-11"]
        );
    }

    #[test]
    fn test_departure_is_backfilled_by_seniority() {
        let mut engine = dyadic(SeededContext::new(3));
        fill(&mut engine, 9);
        engine.play_round().unwrap();

        let leaving = user(4).id;
        let freed = engine.position_of(&leaving).unwrap();
        assert!(engine.remove_participant(&leaving).is_some());
        assert!(engine.position_of(&leaving).is_none());
        assert!(engine.free_positions().contains(&freed));

        let record = engine.play_round().unwrap();
        assert_eq!(engine.position_of(&user(6).id), Some(freed));
        assert!(engine.position_of(&user(7).id).is_none());
        assert!(record.participants().contains(&&user(6).id));
        assert!(!record.participants().contains(&&leaving));
    }

    #[test]
    fn test_removing_waiting_participant_has_no_side_effect() {
        let mut engine = dyadic(SeededContext::new(5));
        fill(&mut engine, 8);
        engine.play_round().unwrap();
        let before = seated_ids(&engine);

        assert!(engine.remove_participant(&user(7).id).is_some());
        assert_eq!(seated_ids(&engine), before);
        assert!(engine.free_positions().is_empty());
        assert_eq!(engine.lobby().len(), 7);
    }

    #[test]
    fn test_removing_unknown_participant_is_noop() {
        let mut engine = dyadic(SeededContext::new(5));
        fill(&mut engine, 6);
        assert!(engine.remove_participant(&ParticipantId::new("ghost")).is_none());
        assert_eq!(engine.lobby().len(), 6);
    }

    #[test]
    fn test_departure_below_capacity_blocks_next_round() {
        let mut engine = dyadic(SeededContext::new(9));
        fill(&mut engine, 6);
        engine.play_round().unwrap();

        engine.remove_participant(&user(0).id);
        let err = engine.play_round().unwrap_err();
        assert!(err.is_capacity());
        assert_eq!(engine.round(), 1);

        engine.add_participant(user(6));
        let record = engine.play_round().unwrap();
        assert_eq!(record.round, 2);
        assert!(record.participants().contains(&&user(6).id));
    }

    #[test]
    fn test_reset_keeps_lobby() {
        let mut engine = dyadic(SeededContext::new(11));
        fill(&mut engine, 6);
        engine.play_round().unwrap();
        engine.play_round().unwrap();

        engine.reset();
        assert_eq!(engine.round(), 0);
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(engine.history().is_empty());
        assert_eq!(engine.free_positions().len(), 6);
        assert_eq!(engine.assignments().count(), 0);
        assert_eq!(engine.lobby().len(), 6);

        // Same participants, no re-adding
        let record = engine.play_round().unwrap();
        assert_eq!(record.round, 1);
    }

    #[test]
    fn test_clean_up_is_reset() {
        let mut engine = dyadic(SeededContext::new(12));
        fill(&mut engine, 6);
        engine.play_round().unwrap();
        engine.clean_up();
        assert_eq!(engine.round(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn test_capacity_checked_before_round_limit() {
        let mut engine = dyadic(SeededContext::new(13));
        fill(&mut engine, 6);
        engine.play_round().unwrap();
        engine.play_round().unwrap();
        engine.remove_participant(&user(0).id);

        assert!(engine.play_round().unwrap_err().is_capacity());
    }

    #[test]
    fn test_max_rounds_is_clamped() {
        let ctx = Arc::new(SeededContext::new(1));
        let topology = Arc::new(Topology::six_node_dyadic());

        let short = RoundEngine::with_max_rounds(ctx.clone(), topology.clone(), 1);
        assert_eq!(short.max_rounds(), 1);

        let long = RoundEngine::with_max_rounds(ctx, topology, 10);
        assert_eq!(long.max_rounds(), 2);
    }

    #[test]
    fn test_zero_round_limit_is_ended() {
        let ctx = Arc::new(SeededContext::new(1));
        let mut engine =
            RoundEngine::with_max_rounds(ctx, Arc::new(Topology::six_node_dyadic()), 0);
        fill(&mut engine, 6);

        assert_eq!(engine.state(), EngineState::Ended);
        assert_eq!(
            engine.play_round(),
            Err(RoundError::RoundLimitReached { max_rounds: 0 })
        );
        assert_eq!(engine.state(), EngineState::Ended);
        assert_eq!(engine.round(), 0);
    }

    #[test]
    fn test_engines_share_topology_not_state() {
        let topology = Arc::new(Topology::six_node_dyadic());
        let mut a = RoundEngine::new(Arc::new(SeededContext::new(1)), topology.clone());
        let b = RoundEngine::new(Arc::new(SeededContext::new(2)), topology.clone());

        fill(&mut a, 6);
        a.play_round().unwrap();

        assert_eq!(b.round(), 0);
        assert!(b.lobby().is_empty());
        assert_eq!(Arc::strong_count(&topology), 3);
    }
}
