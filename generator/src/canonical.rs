//! Deduplication of scenarios that differ only by a renaming of their
//! partition labels.
//!
//! Relabeling every round of a scenario by one fixed permutation of the
//! partition labels yields a behaviorally identical test case, so out of
//! each relabeling class only one member is emitted: the one whose
//! round-by-round, node-by-node label sequence is lexicographically
//! smallest. Leaders are node ids, not labels, and are left alone.
use std::cmp::Ordering;

use crate::scenario::{PartitionAssignment, PartitionId, Round, Scenario};

/// A scenario that is the smallest member of its relabeling class, the only
/// kind ever handed to an output sink. Constructed by [`Canonicalizer`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalScenario(Scenario);

impl CanonicalScenario {
    /// The underlying scenario.
    pub fn scenario(&self) -> &Scenario {
        &self.0
    }

    /// Unwraps the underlying scenario.
    pub fn into_inner(self) -> Scenario {
        self.0
    }
}

/// Decides canonicity by checking a scenario against every permutation of
/// its partition labels.
///
/// The permutation table is built once and holds `partitions!` entries, and
/// a single check walks all of them, so for large partition counts this is
/// the dominant cost center of a run.
#[derive(Debug)]
pub struct Canonicalizer {
    /// Every permutation of `[0, partitions)`, identity first.
    permutations: Vec<Vec<PartitionId>>,
}

impl Canonicalizer {
    /// Builds the permutation table for `num_partitions` labels.
    pub fn new(num_partitions: usize) -> Self {
        let mut permutations = Vec::new();
        let mut labels: Vec<_> = (0..num_partitions).map(PartitionId).collect();
        generate(&mut labels, num_partitions, &mut permutations);
        debug_assert!(permutations[0].iter().enumerate().all(|(i, l)| l.0 == i));
        Self { permutations }
    }

    /// Whether `scenario` is the canonical representative of its class,
    /// that is, no relabeling of it has a smaller label sequence.
    pub fn is_canonical(&self, scenario: &Scenario) -> bool {
        !self.permutations[1..]
            .iter()
            .any(|perm| image_cmp(perm, scenario) == Ordering::Less)
    }

    /// Admits a scenario iff it is its own canonical representative.
    pub fn filter(&self, scenario: Scenario) -> Option<CanonicalScenario> {
        self.is_canonical(&scenario)
            .then(|| CanonicalScenario(scenario))
    }

    /// The canonical representative of the class of `scenario`. Idempotent,
    /// and its result always passes [`Canonicalizer::is_canonical`].
    pub fn canonicalize(&self, scenario: &Scenario) -> CanonicalScenario {
        let mut best = &self.permutations[0];
        for perm in &self.permutations[1..] {
            if images_cmp(perm, best, scenario) == Ordering::Less {
                best = perm;
            }
        }
        let rounds = scenario
            .rounds
            .iter()
            .map(|round| Round {
                partition: PartitionAssignment::new(
                    round.partition.iter().map(|label| best[label.0]).collect(),
                ),
                leader: round.leader,
            })
            .collect();
        CanonicalScenario(Scenario { rounds })
    }
}

/// Compares the relabeling of `scenario` under `perm` with `scenario`
/// itself, in label sequence order.
fn image_cmp(perm: &[PartitionId], scenario: &Scenario) -> Ordering {
    for round in &scenario.rounds {
        for label in round.partition.iter() {
            match perm[label.0].cmp(&label) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
    }
    Ordering::Equal
}

/// Compares the relabelings of `scenario` under two permutations.
fn images_cmp(a: &[PartitionId], b: &[PartitionId], scenario: &Scenario) -> Ordering {
    for round in &scenario.rounds {
        for label in round.partition.iter() {
            match a[label.0].cmp(&b[label.0]) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
    }
    Ordering::Equal
}

/// Heap's algorithm over the first `k` positions of `labels`, emitting the
/// current order first.
fn generate(labels: &mut [PartitionId], k: usize, out: &mut Vec<Vec<PartitionId>>) {
    if k <= 1 {
        out.push(labels.to_vec());
        return;
    }
    for i in 0..k - 1 {
        generate(labels, k - 1, out);
        if k % 2 == 0 {
            labels.swap(i, k - 1);
        } else {
            labels.swap(0, k - 1);
        }
    }
    generate(labels, k - 1, out);
}
