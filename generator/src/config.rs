//! Run configuration and its validation.

/// Configuration of a generator run. Constructed once at startup and
/// read-only afterwards; every component derives its inputs from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Total number of nodes, twins included.
    pub nodes: usize,
    /// Number of twins among the nodes. The last `twins` node ids share
    /// the identities of the first `twins` node ids.
    pub twins: usize,
    /// Maximum number of network partitions per round.
    pub partitions: usize,
    /// Number of consensus rounds per scenario.
    pub rounds: usize,
    /// Total number of shards the index space is split into, one per
    /// participating machine.
    pub shard_count: usize,
    /// Which shard this run generates. Zero based, must be smaller than
    /// `shard_count`.
    pub shard_index: usize,
    /// Number of parallel workers within this shard.
    pub workers: usize,
    /// Maximum number of scenarios per output file.
    pub max_per_file: usize,
}

impl Config {
    /// Checks every bound of the configuration surface.
    /// A valid configuration never changes and is never re-checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes < 1 {
            return Err(ConfigError::NodeCount);
        }
        if self.partitions < 1 || self.partitions > self.nodes {
            return Err(ConfigError::PartitionCount {
                partitions: self.partitions,
                nodes: self.nodes,
            });
        }
        if self.rounds < 1 {
            return Err(ConfigError::RoundCount);
        }
        if self.twins > self.nodes {
            return Err(ConfigError::TwinCount {
                twins: self.twins,
                nodes: self.nodes,
            });
        }
        if self.workers < 1 {
            return Err(ConfigError::WorkerCount);
        }
        if self.shard_count < 1 {
            return Err(ConfigError::ShardCount);
        }
        if self.shard_index >= self.shard_count {
            return Err(ConfigError::ShardIndex {
                index: self.shard_index,
                count: self.shard_count,
            });
        }
        if self.max_per_file < 1 {
            return Err(ConfigError::MaxPerFile);
        }
        Ok(())
    }
}

/// Rejection of an invalid configuration. Raised before any enumeration
/// begins and never retried.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Node count below 1.
    #[error("Number of nodes must be at least 1")]
    NodeCount,
    /// Partition count outside `[1, nodes]`.
    #[error("Number of partitions must be between 1 and the number of nodes, got {partitions} for {nodes} nodes")]
    PartitionCount {
        /// Requested partition count.
        partitions: usize,
        /// Configured node count.
        nodes: usize,
    },
    /// Round count below 1.
    #[error("Number of rounds must be at least 1")]
    RoundCount,
    /// More twins than nodes.
    #[error("Number of twins ({twins}) exceeds the number of nodes ({nodes})")]
    TwinCount {
        /// Requested twin count.
        twins: usize,
        /// Configured node count.
        nodes: usize,
    },
    /// Worker count below 1.
    #[error("Number of workers must be at least 1")]
    WorkerCount,
    /// Shard count below 1.
    #[error("Number of shards must be at least 1")]
    ShardCount,
    /// Shard index outside `[0, shard_count)`.
    #[error("Shard index {index} out of range for {count} shards")]
    ShardIndex {
        /// Requested shard index.
        index: usize,
        /// Configured shard count.
        count: usize,
    },
    /// Scenarios-per-file cap below 1.
    #[error("Scenarios per output file must be at least 1")]
    MaxPerFile,
    /// The scenario space does not fit the 128 bit index type.
    #[error("Scenario space exceeds 2^128 indexes")]
    SpaceOverflow,
}
