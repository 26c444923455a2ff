//! The experiment contract every topology-specific engine implements.

use crate::lobby::Participant;
use roundnet_env::ParticipantId;

/// Lobby-facing surface of a network experiment.
///
/// Transports deliver arrivals and departures through this trait without
/// knowing which topology is behind it.
pub trait NetworkExperiment {
    /// Adds a participant to the lobby, overwriting any entry with the same id.
    fn add_participant(&mut self, participant: Participant);

    /// Removes a participant, freeing its position if it held one.
    ///
    /// Unknown ids are ignored. Returns the removed participant.
    fn remove_participant(&mut self, id: &ParticipantId) -> Option<Participant>;

    /// Restarts the experiment while keeping the lobby.
    fn reset(&mut self);

    /// Alias for [`reset`](Self::reset).
    fn clean_up(&mut self) {
        self.reset();
    }
}
