//! Deterministic splitting of the index space into disjoint, gap free
//! ranges: once across machines, once more across the workers of one
//! machine. Every participant computes the same plan from the same counts,
//! so no coordination happens at generation time.
use std::fmt;

use crate::space::ScenarioIndex;

/// A half-open range `[start, end)` of scenario indexes. `start <= end`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexRange {
    /// First index of the range.
    pub start: ScenarioIndex,
    /// One past the last index of the range.
    pub end: ScenarioIndex,
}

impl IndexRange {
    /// The number of indexes in the range.
    pub fn len(&self) -> u128 {
        self.end.0 - self.start.0
    }

    /// Whether the range holds no indexes.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `index` falls within the range.
    pub fn contains(&self, index: ScenarioIndex) -> bool {
        self.start <= index && index < self.end
    }

    /// Splits the range into `pieces` contiguous sub-ranges covering it
    /// exactly: the first `len % pieces` of them get `len / pieces + 1`
    /// indexes, the rest `len / pieces`. `pieces` must be positive.
    pub fn split(&self, pieces: usize) -> Vec<IndexRange> {
        assert!(pieces > 0, "cannot split a range into zero pieces");
        let base = self.len() / pieces as u128;
        let extra = self.len() % pieces as u128;
        let mut ranges = Vec::with_capacity(pieces);
        let mut start = self.start;
        for piece in 0..pieces as u128 {
            let end = ScenarioIndex(start.0 + base + u128::from(piece < extra));
            ranges.push(IndexRange { start, end });
            start = end;
        }
        ranges
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {})", self.start, self.end)
    }
}

/// The machine-level plan: `[0, raw_count)` split into `shard_count`
/// near-equal shards. Pure in its inputs, so every machine derives the same
/// plan and only needs to be told its own shard index out of band.
pub fn plan_shards(raw_count: u128, shard_count: usize) -> Vec<IndexRange> {
    let all = IndexRange {
        start: ScenarioIndex(0),
        end: ScenarioIndex(raw_count),
    };
    all.split(shard_count)
}

/// The worker-level plan within one shard, one range per worker.
pub fn worker_ranges(shard: IndexRange, workers: usize) -> Vec<IndexRange> {
    shard.split(workers)
}
