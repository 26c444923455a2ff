//! Position occupancy: the Assignment Table and the Free Position Set.
//!
//! Both views are kept in one struct so that they can only change together:
//! a participant is in `seat_of` iff exactly one position lists it in
//! `occupant_of`, and a position is in `free` iff it has no occupant.

use crate::topology::{PositionId, Topology};
use roundnet_env::ParticipantId;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Seating {
    occupant_of: HashMap<PositionId, ParticipantId>,
    seat_of: HashMap<ParticipantId, PositionId>,

    /// Unoccupied positions; released positions are appended
    free: Vec<PositionId>,
}

impl Seating {
    /// All positions of `topology` free.
    pub fn new(topology: &Topology) -> Self {
        Self {
            occupant_of: HashMap::with_capacity(topology.position_count()),
            seat_of: HashMap::with_capacity(topology.position_count()),
            free: topology.positions().to_vec(),
        }
    }

    /// Frees every position of `topology`.
    pub fn clear(&mut self, topology: &Topology) {
        self.occupant_of.clear();
        self.seat_of.clear();
        self.free = topology.positions().to_vec();
    }

    pub fn free_positions(&self) -> &[PositionId] {
        &self.free
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Removes and returns the free position at `index`.
    pub(crate) fn take_free(&mut self, index: usize) -> Option<PositionId> {
        if index < self.free.len() {
            Some(self.free.remove(index))
        } else {
            None
        }
    }

    /// Seats `participant` at a position previously taken with `take_free`.
    pub(crate) fn occupy(&mut self, position: PositionId, participant: ParticipantId) {
        self.seat_of.insert(participant.clone(), position);
        self.occupant_of.insert(position, participant);
    }

    /// Drops `participant`'s assignment and returns its position to the free set.
    pub fn release(&mut self, participant: &ParticipantId) -> Option<PositionId> {
        let position = self.seat_of.remove(participant)?;
        self.occupant_of.remove(&position);
        self.free.push(position);
        Some(position)
    }

    pub fn position_of(&self, participant: &ParticipantId) -> Option<PositionId> {
        self.seat_of.get(participant).copied()
    }

    pub fn occupant(&self, position: PositionId) -> Option<&ParticipantId> {
        self.occupant_of.get(&position)
    }

    pub fn is_seated(&self, participant: &ParticipantId) -> bool {
        self.seat_of.contains_key(participant)
    }

    pub fn seated_count(&self) -> usize {
        self.seat_of.len()
    }

    /// Current assignments, in no particular order.
    pub fn assignments(&self) -> impl Iterator<Item = (&ParticipantId, PositionId)> {
        self.seat_of.iter().map(|(id, position)| (id, *position))
    }
}
