//! Thread-safe handle serializing calls to one engine.
//!
//! Seating and lobby updates are multi-step, so every operation runs inside
//! one lock region per engine instance.

use crate::engine::RoundEngine;
use crate::error::RoundError;
use crate::experiment::NetworkExperiment;
use crate::lobby::Participant;
use crate::round::RoundRecord;
use roundnet_env::{ExperimentContext, ParticipantId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cloneable handle to an engine behind a mutex.
pub struct SharedExperiment<C: ExperimentContext> {
    inner: Arc<Mutex<RoundEngine<C>>>,
}

impl<C: ExperimentContext> Clone for SharedExperiment<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ExperimentContext> SharedExperiment<C> {
    pub fn new(engine: RoundEngine<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Locks the engine. Every operation ran to completion before any panic
    /// could poison the lock, so a poisoned engine is still consistent.
    pub fn lock(&self) -> MutexGuard<'_, RoundEngine<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_participant(&self, participant: Participant) {
        self.lock().add_participant(participant);
    }

    pub fn remove_participant(&self, id: &ParticipantId) -> Option<Participant> {
        self.lock().remove_participant(id)
    }

    pub fn play_round(&self) -> Result<RoundRecord, RoundError> {
        self.lock().play_round()
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn round(&self) -> u32 {
        self.lock().round()
    }

    /// Copy of the round history.
    pub fn history(&self) -> Vec<RoundRecord> {
        self.lock().history().to_vec()
    }

    /// Copy of the lobby contents, most senior first.
    pub fn lobby_snapshot(&self) -> Vec<Participant> {
        self.lock()
            .lobby()
            .by_seniority(|_| true)
            .into_iter()
            .cloned()
            .collect()
    }
}
