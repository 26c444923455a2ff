//! Round Records - the immutable result of one played round.

use crate::lobby::Participant;
use crate::topology::PositionId;
use roundnet_env::ParticipantId;
use serde::{Deserialize, Serialize};

/// Two participants brought together by a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub source: Participant,
    pub target: Participant,
    pub source_position: PositionId,
    pub target_position: PositionId,
}

impl Interaction {
    /// The pair's identities, smaller id first.
    pub fn unordered_ids(&self) -> (&ParticipantId, &ParticipantId) {
        if self.source.id <= self.target.id {
            (&self.source.id, &self.target.id)
        } else {
            (&self.target.id, &self.source.id)
        }
    }

    pub fn involves(&self, id: &ParticipantId) -> bool {
        &self.source.id == id || &self.target.id == id
    }
}

/// Snapshot of one round: its number and the interactions it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub interactions: Vec<Interaction>,
}

impl RoundRecord {
    /// Every participant that appears in this round, in interaction order.
    pub fn participants(&self) -> Vec<&ParticipantId> {
        self.interactions
            .iter()
            .flat_map(|i| [&i.source.id, &i.target.id])
            .collect()
    }

    /// Returns true if `a` and `b` interacted in this round (either direction).
    pub fn pairs(&self, a: &ParticipantId, b: &ParticipantId) -> bool {
        self.interactions
            .iter()
            .any(|i| i.involves(a) && i.involves(b))
    }

    /// The partner `id` was paired with, if any.
    pub fn partners_of(&self, id: &ParticipantId) -> Vec<&ParticipantId> {
        self.interactions
            .iter()
            .filter_map(|i| {
                if &i.source.id == id {
                    Some(&i.target.id)
                } else if &i.target.id == id {
                    Some(&i.source.id)
                } else {
                    None
                }
            })
            .collect()
    }
}
