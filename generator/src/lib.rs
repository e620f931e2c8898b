//! Enumeration of twins scenarios for BFT consensus tests: every way to
//! partition a set of replicas (some of them with twins) and pick round
//! leaders, across a fixed number of rounds. The space is indexed by a
//! bijection, so it can be deduplicated up to partition relabeling and
//! sharded across machines and worker threads without materializing it.
mod canonical;
mod config;
mod metrics;
mod output;
mod run;
mod scenario;
mod shard;
mod space;
pub mod testonly;

pub use crate::{
    canonical::{CanonicalScenario, Canonicalizer},
    config::{Config, ConfigError},
    output::{EmitError, JsonBatcher, NullSink, ScenarioSink},
    run::{run_range, run_split, RangeOutcome, RangeResult},
    scenario::{Node, NodeId, NodeSet, PartitionAssignment, PartitionId, Round, Scenario},
    shard::{plan_shards, worker_ranges, IndexRange},
    space::{IndexError, ScenarioIndex, ScenarioSpace},
};
