//! The scenario space: its cardinalities and the bijection between integer
//! ranks and concrete scenarios.
use std::fmt;

use crate::{
    config::{Config, ConfigError},
    scenario::{NodeId, NodeSet, PartitionAssignment, PartitionId, Round, Scenario},
};

/// Rank of a scenario within its space, in `[0, raw_count)`. The primary
/// handle for sharding and resumability: ranges of indexes can be handed out
/// and re-run without any record of what was generated before.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScenarioIndex(pub u128);

impl ScenarioIndex {
    /// Get the next index.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ScenarioIndex {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, formatter)
    }
}

/// Contract violation of the index bijection. Seen during normal operation
/// it indicates a bug in shard planning, not a recoverable condition.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IndexError {
    /// Index at or beyond the raw count of the space.
    #[error("Scenario index {index} out of range, the space has {count} scenarios")]
    OutOfRange {
        /// The offending index.
        index: ScenarioIndex,
        /// Raw cardinality of the space.
        count: u128,
    },
    /// A scenario whose shape does not match the space: wrong round count,
    /// unknown node, or a partition label out of range.
    #[error("Scenario does not belong to this space")]
    ForeignScenario,
}

/// The combinatorial domain of one generator run: the node set, the
/// partition and round counts, and the derived cardinalities.
///
/// The space orders its scenarios as a mixed-radix number: one digit in
/// `[0, partitions^nodes * nodes)` per round, round 0 most significant.
/// Within a round digit the partition assignment (node 0 most significant)
/// is more significant than the leader. [`ScenarioSpace::unrank`] and
/// [`ScenarioSpace::rank`] convert between ranks and scenarios in
/// `O(nodes * rounds)`, with no enumeration of prior ranks.
#[derive(Clone, Debug)]
pub struct ScenarioSpace {
    nodes: NodeSet,
    num_partitions: usize,
    num_rounds: usize,
    /// `partitions^nodes * nodes`, the radix of one round digit.
    per_round: u128,
    /// `per_round^rounds`.
    raw: u128,
}

impl ScenarioSpace {
    /// Validates the configuration and computes the cardinalities of the
    /// space it describes. Pure: same configuration, same space.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let assignments = checked_pow(config.partitions as u128, config.nodes)
            .ok_or(ConfigError::SpaceOverflow)?;
        let per_round = assignments
            .checked_mul(config.nodes as u128)
            .ok_or(ConfigError::SpaceOverflow)?;
        let raw = checked_pow(per_round, config.rounds).ok_or(ConfigError::SpaceOverflow)?;
        Ok(Self {
            nodes: NodeSet::new(config.nodes, config.twins),
            num_partitions: config.partitions,
            num_rounds: config.rounds,
            per_round,
            raw,
        })
    }

    /// The node set shared by every scenario of the space.
    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    /// The number of nodes, twins included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// The maximum number of partitions per round.
    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }

    /// The number of rounds per scenario.
    pub fn num_rounds(&self) -> usize {
        self.num_rounds
    }

    /// The number of raw scenarios, canonical or not.
    pub fn raw_count(&self) -> u128 {
        self.raw
    }

    /// The number of (partition assignment, leader) pairs of a single
    /// round.
    pub fn per_round_count(&self) -> u128 {
        self.per_round
    }

    /// The number of canonical scenarios, for progress estimation.
    ///
    /// Computed in closed form with Burnside's lemma over the group of
    /// partition relabelings: a permutation with `c` fixed labels fixes
    /// `c^(nodes * rounds)` label sequences, and there are
    /// `C(p, c) * derangements(p - c)` such permutations. Leaders do not
    /// take part in the symmetry and contribute a free `nodes^rounds`.
    pub fn canonical_count(&self) -> Result<u128, ConfigError> {
        let digits = self
            .num_nodes()
            .checked_mul(self.num_rounds)
            .ok_or(ConfigError::SpaceOverflow)?;
        let mut sum = 0u128;
        for fixed in 0..=self.num_partitions {
            // Sequences fixed by the permutations with `fixed` fixed labels.
            let term = binomial(self.num_partitions, fixed)
                .and_then(|b| b.checked_mul(derangements(self.num_partitions - fixed)?))
                .and_then(|b| b.checked_mul(checked_pow(fixed as u128, digits)?))
                .ok_or(ConfigError::SpaceOverflow)?;
            sum = sum.checked_add(term).ok_or(ConfigError::SpaceOverflow)?;
        }
        let order = factorial(self.num_partitions).ok_or(ConfigError::SpaceOverflow)?;
        // Burnside guarantees the division is exact.
        debug_assert_eq!(sum % order, 0);
        let leaders = checked_pow(self.num_nodes() as u128, self.num_rounds)
            .ok_or(ConfigError::SpaceOverflow)?;
        (sum / order)
            .checked_mul(leaders)
            .ok_or(ConfigError::SpaceOverflow)
    }

    /// Materializes the scenario of rank `index`.
    pub fn unrank(&self, index: ScenarioIndex) -> Result<Scenario, IndexError> {
        if index.0 >= self.raw {
            return Err(IndexError::OutOfRange {
                index,
                count: self.raw,
            });
        }
        let mut round_digits = vec![0u128; self.num_rounds];
        let mut rest = index.0;
        for digit in round_digits.iter_mut().rev() {
            *digit = rest % self.per_round;
            rest /= self.per_round;
        }
        let num_nodes = self.num_nodes() as u128;
        let num_partitions = self.num_partitions as u128;
        let rounds = round_digits
            .into_iter()
            .map(|digit| {
                let leader = NodeId((digit % num_nodes) as usize);
                let mut assignment = digit / num_nodes;
                let mut labels = vec![PartitionId(0); self.num_nodes()];
                for label in labels.iter_mut().rev() {
                    *label = PartitionId((assignment % num_partitions) as usize);
                    assignment /= num_partitions;
                }
                Round {
                    partition: PartitionAssignment::new(labels),
                    leader,
                }
            })
            .collect();
        Ok(Scenario { rounds })
    }

    /// The rank of a scenario, inverse of [`ScenarioSpace::unrank`].
    pub fn rank(&self, scenario: &Scenario) -> Result<ScenarioIndex, IndexError> {
        if scenario.num_rounds() != self.num_rounds {
            return Err(IndexError::ForeignScenario);
        }
        let mut rank = 0u128;
        for round in &scenario.rounds {
            if round.partition.len() != self.num_nodes() || round.leader.0 >= self.num_nodes() {
                return Err(IndexError::ForeignScenario);
            }
            let mut assignment = 0u128;
            for label in round.partition.iter() {
                if label.0 >= self.num_partitions {
                    return Err(IndexError::ForeignScenario);
                }
                assignment = assignment * self.num_partitions as u128 + label.0 as u128;
            }
            // Bounded by the raw count, which fits by construction.
            rank = rank * self.per_round
                + assignment * self.num_nodes() as u128
                + round.leader.0 as u128;
        }
        Ok(ScenarioIndex(rank))
    }
}

/// `base^exp` without overflowing, `None` if it does not fit.
fn checked_pow(base: u128, exp: usize) -> Option<u128> {
    let mut power = 1u128;
    for _ in 0..exp {
        power = power.checked_mul(base)?;
    }
    Some(power)
}

/// `k!`, `None` on overflow.
fn factorial(k: usize) -> Option<u128> {
    let mut product = 1u128;
    for i in 2..=k {
        product = product.checked_mul(i as u128)?;
    }
    Some(product)
}

/// Binomial coefficient `C(n, k)`, `None` on overflow.
fn binomial(n: usize, k: usize) -> Option<u128> {
    let mut value = 1u128;
    for i in 1..=k {
        // Exact at every step: C(n, i) = C(n, i-1) * (n - i + 1) / i.
        value = value.checked_mul((n - i + 1) as u128)? / i as u128;
    }
    Some(value)
}

/// The number of permutations of `k` elements without a fixed point,
/// `None` on overflow.
fn derangements(k: usize) -> Option<u128> {
    let (mut prev, mut current) = (1u128, 0u128);
    for i in 2..=k {
        let next = (i as u128 - 1).checked_mul(current.checked_add(prev)?)?;
        prev = current;
        current = next;
    }
    Some(if k == 0 { prev } else { current })
}
