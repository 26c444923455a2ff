//! The Participant Pool ("lobby").
//!
//! Keyed by identity. Insertion order carries no meaning of its own; the
//! ordering that matters is seniority: oldest `created_at` first, ties broken
//! by the order in which identities first entered the lobby.

use roundnet_env::{ExperimentContext, ParticipantId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// A participant known to the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,

    /// Creation time; earlier means more senior
    pub created_at: SystemTime,
}

impl Participant {
    pub fn new(id: impl Into<ParticipantId>, created_at: SystemTime) -> Self {
        Self {
            id: id.into(),
            created_at,
        }
    }

    /// Creates a participant stamped with the context's current time.
    pub fn arriving_now<C>(id: impl Into<ParticipantId>, ctx: &C) -> Self
    where
        C: ExperimentContext + ?Sized,
    {
        Self::new(id, ctx.system_time())
    }
}

#[derive(Debug, Clone)]
struct LobbyEntry {
    participant: Participant,

    /// Sequence number of the identity's first arrival (tie-break)
    arrival: u64,
}

/// The set of known participants.
#[derive(Debug, Clone, Default)]
pub struct Lobby {
    entries: HashMap<ParticipantId, LobbyEntry>,
    next_arrival: u64,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a participant. Returns the previous value.
    ///
    /// Overwriting keeps the identity's original arrival sequence.
    pub fn insert(&mut self, participant: Participant) -> Option<Participant> {
        match self.entries.get_mut(&participant.id) {
            Some(entry) => Some(std::mem::replace(&mut entry.participant, participant)),
            None => {
                let arrival = self.next_arrival;
                self.next_arrival += 1;
                self.entries.insert(
                    participant.id.clone(),
                    LobbyEntry {
                        participant,
                        arrival,
                    },
                );
                None
            }
        }
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.entries.remove(id).map(|entry| entry.participant)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.entries.get(id).map(|entry| &entry.participant)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates participants in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.entries.values().map(|entry| &entry.participant)
    }

    /// Participants for which `keep` holds, most senior first.
    pub fn by_seniority<F>(&self, mut keep: F) -> Vec<&Participant>
    where
        F: FnMut(&ParticipantId) -> bool,
    {
        let mut entries: Vec<&LobbyEntry> = self
            .entries
            .values()
            .filter(|entry| keep(&entry.participant.id))
            .collect();
        entries.sort_by_key(|entry| (entry.participant.created_at, entry.arrival));
        entries.into_iter().map(|entry| &entry.participant).collect()
    }
}
