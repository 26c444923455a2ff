//! The Topology Descriptor - positions and round-tagged connections.
//!
//! A topology is a static graph. Each connection carries the round number in
//! which it is active, so "who talks to whom in round R" is a lookup, not a
//! computation. Descriptors are validated once at construction and never
//! mutated afterwards; engines share them through an `Arc`.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Identifier of a slot in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(pub u32);

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge between two positions, active only in `round`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source: PositionId,
    pub target: PositionId,
    pub round: u32,
}

impl Connection {
    pub fn new(source: u32, target: u32, round: u32) -> Self {
        Self {
            source: PositionId(source),
            target: PositionId(target),
            round,
        }
    }

    /// Returns true if `position` is one of the two endpoints.
    pub fn touches(&self, position: PositionId) -> bool {
        self.source == position || self.target == position
    }

    /// Returns the endpoint opposite to `position`, if it is an endpoint.
    pub fn other(&self, position: PositionId) -> Option<PositionId> {
        if self.source == position {
            Some(self.target)
        } else if self.target == position {
            Some(self.source)
        } else {
            None
        }
    }

    fn unordered(&self) -> (PositionId, PositionId) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }
}

/// Raw, unvalidated form of a topology (as found in config files).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    pub positions: Vec<PositionId>,
    pub connections: Vec<Connection>,
}

/// Immutable interaction topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    positions: Vec<PositionId>,
    connections: Vec<Connection>,

    /// Round number -> connections active in that round
    by_round: BTreeMap<u32, Vec<Connection>>,
}

impl Topology {
    /// Builds a topology, rejecting malformed descriptors.
    pub fn new(
        positions: Vec<PositionId>,
        connections: Vec<Connection>,
    ) -> Result<Self, TopologyError> {
        if positions.is_empty() {
            return Err(TopologyError::NoPositions);
        }

        let mut known = HashSet::with_capacity(positions.len());
        for position in &positions {
            if !known.insert(*position) {
                return Err(TopologyError::DuplicatePosition(*position));
            }
        }

        let mut by_round: BTreeMap<u32, Vec<Connection>> = BTreeMap::new();
        let mut seen = HashSet::with_capacity(connections.len());
        for connection in &connections {
            for endpoint in [connection.source, connection.target] {
                if !known.contains(&endpoint) {
                    return Err(TopologyError::UnknownPosition(endpoint));
                }
            }
            if connection.source == connection.target {
                return Err(TopologyError::SelfLoop(connection.source));
            }
            if connection.round == 0 {
                return Err(TopologyError::RoundZero {
                    from: connection.source,
                    to: connection.target,
                });
            }
            let (a, b) = connection.unordered();
            if !seen.insert((a, b, connection.round)) {
                return Err(TopologyError::DuplicateConnection {
                    from: a,
                    to: b,
                    round: connection.round,
                });
            }
            by_round.entry(connection.round).or_default().push(*connection);
        }

        Ok(Self {
            positions,
            connections,
            by_round,
        })
    }

    /// Builds a topology from its serialized form.
    pub fn from_descriptor(descriptor: TopologyDescriptor) -> Result<Self, TopologyError> {
        Self::new(descriptor.positions, descriptor.connections)
    }

    /// Returns the serializable form of this topology.
    pub fn descriptor(&self) -> TopologyDescriptor {
        TopologyDescriptor {
            positions: self.positions.clone(),
            connections: self.connections.clone(),
        }
    }

    /// The reference topology: six positions, two rounds, every position
    /// meets exactly one partner per round and never the same partner twice.
    ///
    /// ```text
    /// round 1:  1-4  2-5  3-6
    /// round 2:  1-5  2-6  3-4
    /// ```
    pub fn six_node_dyadic() -> Self {
        let positions = (1..=6).map(PositionId).collect();
        let connections = vec![
            Connection::new(1, 4, 1),
            Connection::new(1, 5, 2),
            Connection::new(2, 5, 1),
            Connection::new(2, 6, 2),
            Connection::new(3, 6, 1),
            Connection::new(3, 4, 2),
        ];
        Self {
            by_round: Self::index_rounds(&connections),
            positions,
            connections,
        }
    }

    fn index_rounds(connections: &[Connection]) -> BTreeMap<u32, Vec<Connection>> {
        let mut by_round: BTreeMap<u32, Vec<Connection>> = BTreeMap::new();
        for connection in connections {
            by_round.entry(connection.round).or_default().push(*connection);
        }
        by_round
    }

    /// All positions, in declaration order.
    pub fn positions(&self) -> &[PositionId] {
        &self.positions
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// All connections, in declaration order.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections active in `round`. Empty for rounds without connections.
    pub fn interactions(&self, round: u32) -> &[Connection] {
        self.by_round.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Highest round number any connection is tagged with (0 if none).
    pub fn max_round(&self) -> u32 {
        self.by_round.keys().next_back().copied().unwrap_or(0)
    }

    /// Number of connections touching `position` in `round`.
    pub fn round_degree(&self, position: PositionId, round: u32) -> usize {
        self.interactions(round)
            .iter()
            .filter(|c| c.touches(position))
            .count()
    }

    /// Every position `position` is connected to, across all rounds.
    pub fn partners(&self, position: PositionId) -> Vec<PositionId> {
        let mut partners: Vec<PositionId> = self
            .connections
            .iter()
            .filter_map(|c| c.other(position))
            .collect();
        partners.sort();
        partners.dedup();
        partners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_topology_shape() {
        let topology = Topology::six_node_dyadic();

        assert_eq!(topology.position_count(), 6);
        assert_eq!(topology.max_round(), 2);
        assert_eq!(topology.interactions(1).len(), 3);
        assert_eq!(topology.interactions(2).len(), 3);
        assert!(topology.interactions(3).is_empty());
        assert!(topology.interactions(0).is_empty());
    }

    #[test]
    fn test_reference_topology_degree() {
        let topology = Topology::six_node_dyadic();

        for position in topology.positions() {
            assert_eq!(topology.round_degree(*position, 1), 1);
            assert_eq!(topology.round_degree(*position, 2), 1);
            // Two distinct partners over the whole run
            assert_eq!(topology.partners(*position).len(), 2);
        }
    }

    #[test]
    fn test_reference_topology_passes_validation() {
        let reference = Topology::six_node_dyadic();
        let rebuilt = Topology::from_descriptor(reference.descriptor()).unwrap();
        assert_eq!(rebuilt, reference);
    }

    #[test]
    fn test_rejects_empty_positions() {
        assert_eq!(Topology::new(vec![], vec![]), Err(TopologyError::NoPositions));
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        let result = Topology::new(
            vec![PositionId(1), PositionId(2)],
            vec![Connection::new(1, 3, 1)],
        );
        assert_eq!(result, Err(TopologyError::UnknownPosition(PositionId(3))));
    }

    #[test]
    fn test_rejects_self_loop_and_round_zero() {
        let positions = vec![PositionId(1), PositionId(2)];
        assert_eq!(
            Topology::new(positions.clone(), vec![Connection::new(1, 1, 1)]),
            Err(TopologyError::SelfLoop(PositionId(1)))
        );
        assert!(matches!(
            Topology::new(positions, vec![Connection::new(1, 2, 0)]),
            Err(TopologyError::RoundZero { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_connection_in_round() {
        let result = Topology::new(
            vec![PositionId(1), PositionId(2)],
            vec![Connection::new(1, 2, 1), Connection::new(2, 1, 1)],
        );
        assert!(matches!(
            result,
            Err(TopologyError::DuplicateConnection { round: 1, .. })
        ));

        // Same pair in different rounds is fine
        let ok = Topology::new(
            vec![PositionId(1), PositionId(2)],
            vec![Connection::new(1, 2, 1), Connection::new(2, 1, 2)],
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_rejects_duplicate_position() {
        let result = Topology::new(vec![PositionId(1), PositionId(1)], vec![]);
        assert_eq!(result, Err(TopologyError::DuplicatePosition(PositionId(1))));
    }
}
