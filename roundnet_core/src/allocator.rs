//! The Assignment Allocator.
//!
//! Who gets admitted is decided purely by seniority; where they sit is
//! decided by the context's random source. Each step draws one free position
//! uniformly at random and hands it to the most senior waiting participant.

use crate::lobby::Lobby;
use crate::seating::Seating;
use crate::topology::PositionId;
use roundnet_env::{ExperimentContext, ParticipantId};
use tracing::debug;

/// One seat handed out by [`fill_vacancies`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub participant: ParticipantId,
    pub position: PositionId,
}

/// Fills free positions with waiting participants, most senior first.
///
/// Stops when either runs out. Positions left over when the waiting list is
/// exhausted simply stay free.
///
/// Returns the placements in the order they were made (seniority order).
pub fn fill_vacancies<C>(lobby: &Lobby, seating: &mut Seating, ctx: &C) -> Vec<Placement>
where
    C: ExperimentContext + ?Sized,
{
    let waiting: Vec<ParticipantId> = lobby
        .by_seniority(|id| !seating.is_seated(id))
        .into_iter()
        .map(|participant| participant.id.clone())
        .collect();

    let mut placements = Vec::with_capacity(seating.free_count().min(waiting.len()));

    for participant in waiting {
        if seating.free_count() == 0 {
            break;
        }
        let index = ctx.pick_index(seating.free_count());
        let Some(position) = seating.take_free(index) else {
            break;
        };

        debug!("Seating {} at position {}", participant, position);
        seating.occupy(position, participant.clone());
        placements.push(Placement {
            participant,
            position,
        });
    }

    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lobby::Participant;
    use crate::test_support::ScriptedContext;
    use crate::topology::Topology;
    use std::time::{Duration, UNIX_EPOCH};

    fn lobby_of(count: u64) -> Lobby {
        let mut lobby = Lobby::new();
        // Insert newest first so insertion order disagrees with seniority
        for i in (0..count).rev() {
            lobby.insert(Participant::new(
                format!("user-{}", i),
                UNIX_EPOCH + Duration::from_secs(60 * i),
            ));
        }
        lobby
    }

    #[test]
    fn test_fills_every_free_position() {
        let topology = Topology::six_node_dyadic();
        let lobby = lobby_of(6);
        let mut seating = Seating::new(&topology);

        let placements = fill_vacancies(&lobby, &mut seating, &ScriptedContext::always_first());

        assert_eq!(placements.len(), 6);
        assert_eq!(seating.free_count(), 0);
        assert_eq!(seating.seated_count(), 6);
    }

    #[test]
    fn test_most_senior_are_admitted() {
        let topology = Topology::six_node_dyadic();
        let lobby = lobby_of(12);
        let mut seating = Seating::new(&topology);

        let placements = fill_vacancies(&lobby, &mut seating, &ScriptedContext::always_first());

        let admitted: Vec<&str> = placements.iter().map(|p| p.participant.as_str()).collect();
        assert_eq!(
            admitted,
            vec!["user-0", "user-1", "user-2", "user-3", "user-4", "user-5"]
        );
        for i in 6..12 {
            assert!(!seating.is_seated(&ParticipantId::new(format!("user-{}", i))));
        }
    }

    #[test]
    fn test_random_draw_only_moves_positions() {
        let topology = Topology::six_node_dyadic();
        let lobby = lobby_of(12);

        let mut first = Seating::new(&topology);
        let mut last = Seating::new(&topology);
        let a = fill_vacancies(&lobby, &mut first, &ScriptedContext::always_first());
        let b = fill_vacancies(&lobby, &mut last, &ScriptedContext::always_last());

        let admitted_a: Vec<_> = a.iter().map(|p| p.participant.clone()).collect();
        let admitted_b: Vec<_> = b.iter().map(|p| p.participant.clone()).collect();
        assert_eq!(admitted_a, admitted_b);

        // Same people, mirrored seats
        assert_eq!(a[0].position, PositionId(1));
        assert_eq!(b[0].position, PositionId(6));
    }

    #[test]
    fn test_leaves_positions_free_when_short() {
        let topology = Topology::six_node_dyadic();
        let lobby = lobby_of(4);
        let mut seating = Seating::new(&topology);

        let placements = fill_vacancies(&lobby, &mut seating, &ScriptedContext::always_first());

        assert_eq!(placements.len(), 4);
        assert_eq!(seating.free_count(), 2);
    }

    #[test]
    fn test_backfill_takes_most_senior_waiting() {
        let topology = Topology::six_node_dyadic();
        let mut lobby = lobby_of(8);
        let mut seating = Seating::new(&topology);
        fill_vacancies(&lobby, &mut seating, &ScriptedContext::always_first());

        let leaving = ParticipantId::new("user-2");
        let freed = seating.release(&leaving).unwrap();
        lobby.remove(&leaving);

        let placements = fill_vacancies(&lobby, &mut seating, &ScriptedContext::always_first());

        assert_eq!(
            placements,
            vec![Placement {
                participant: ParticipantId::new("user-6"),
                position: freed,
            }]
        );
    }
}
