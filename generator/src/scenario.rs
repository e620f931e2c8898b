//! Data model of the scenarios under enumeration: the node set with its
//! twin pairing, per-round partition assignments, and whole scenarios.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a node, in `[0, nodes)`. Twins are ordinary nodes that
/// happen to share a cryptographic identity with another node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

/// Label of a network partition within one round, in `[0, partitions)`.
/// Labels carry no meaning beyond grouping, which is what makes scenarios
/// that differ only by a relabeling equivalent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionId(pub usize);

impl fmt::Display for PartitionId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

/// A node of the cluster under test.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Identifier of the node.
    pub id: NodeId,
    /// The node whose identity this node duplicates, if it is a twin.
    pub twin_of: Option<NodeId>,
}

impl Node {
    /// Whether this node is a twin of another node.
    pub fn is_twin(&self) -> bool {
        self.twin_of.is_some()
    }
}

/// All nodes of the cluster, twins included. The last `num_twins` node ids
/// are the twins, pairing up positionally with the first `num_twins` ids.
/// Immutable once the run starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeSet {
    nodes: Vec<Node>,
    num_twins: usize,
}

impl NodeSet {
    /// Builds the node set for a cluster of `num_nodes` nodes of which
    /// `num_twins` duplicate an identity.
    pub fn new(num_nodes: usize, num_twins: usize) -> Self {
        assert!(num_twins <= num_nodes, "more twins than nodes");
        let first_twin = num_nodes - num_twins;
        let nodes = (0..num_nodes)
            .map(|i| Node {
                id: NodeId(i),
                // With every node a twin the positional partner is the node
                // itself, which is no pairing at all.
                twin_of: (i >= first_twin && first_twin > 0).then(|| NodeId(i - first_twin)),
            })
            .collect();
        Self { nodes, num_twins }
    }

    /// The number of nodes, twins included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The number of twins.
    pub fn num_twins(&self) -> usize {
        self.num_twins
    }

    /// All nodes, originals first, twins last.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The node sharing the identity of `id`, in either direction of the
    /// pairing. None for unpaired nodes.
    pub fn twin(&self, id: NodeId) -> Option<NodeId> {
        let first_twin = self.nodes.len() - self.num_twins;
        let other = if id.0 >= first_twin {
            NodeId(id.0 - first_twin)
        } else if id.0 < self.num_twins {
            NodeId(id.0 + first_twin)
        } else {
            return None;
        };
        (other != id).then_some(other)
    }

    /// Whether `id` is a twin.
    pub fn is_twin(&self, id: NodeId) -> bool {
        id.0 >= self.nodes.len() - self.num_twins
    }
}

/// Assignment of every node to a partition for one round. The node ids are
/// the positions, so the assignment doubles as the per-round digit sequence
/// of the scenario.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionAssignment(Vec<PartitionId>);

impl PartitionAssignment {
    /// Wraps a complete list of labels, one per node in id order.
    pub fn new(labels: Vec<PartitionId>) -> Self {
        Self(labels)
    }

    /// The number of nodes assigned.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The partition label of one node.
    pub fn label(&self, node: NodeId) -> PartitionId {
        self.0[node.0]
    }

    /// Labels in node id order.
    pub fn iter(&self) -> impl Iterator<Item = PartitionId> + '_ {
        self.0.iter().copied()
    }

    /// The member nodes of every partition, by label. Labels with no nodes
    /// yield empty groups. `num_partitions` must be the partition count the
    /// assignment was built against.
    pub fn groups(&self, num_partitions: usize) -> Vec<Vec<NodeId>> {
        let mut groups = vec![Vec::new(); num_partitions];
        for (node, label) in self.0.iter().enumerate() {
            groups[label.0].push(NodeId(node));
        }
        groups
    }
}

/// One consensus round of a scenario: who can talk to whom, and who leads.
/// The leader's partition is allowed to be too small to make progress, that
/// is a fault condition under test, not a modeling error.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Round {
    /// Partition assignment of the round.
    pub partition: PartitionAssignment,
    /// Leader of the round. Any node may lead, twins included.
    pub leader: NodeId,
}

/// A full scenario: one round per consensus round, in round order. The node
/// set is shared by all scenarios of a space and lives there.
///
/// The derived ordering (rounds in order, partition before leader within a
/// round) coincides with the ordering of scenario indexes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scenario {
    /// The rounds, in play order.
    pub rounds: Vec<Round>,
}

impl Scenario {
    /// The number of rounds.
    pub fn num_rounds(&self) -> usize {
        self.rounds.len()
    }
}
