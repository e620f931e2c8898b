//! Output side of the generator: the sink seam the workers emit into, and
//! the JSON file implementation of it understood by the twins executor.
use std::{collections::BTreeMap, fs, mem, path::PathBuf};

use anyhow::Context as _;

use crate::{
    canonical::CanonicalScenario,
    scenario::{NodeId, NodeSet},
    space::ScenarioSpace,
};

/// Error reported by a sink. It becomes the failure of the emitting
/// worker's range; sibling ranges are unaffected.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct EmitError(#[from] anyhow::Error);

/// Destination of canonical scenarios. Each worker owns one sink
/// exclusively and feeds it in ascending index order. The sink owns
/// serialization, batching and file layout; the enumeration core knows
/// nothing about any of it.
pub trait ScenarioSink {
    /// Consumes one canonical scenario.
    fn emit(&mut self, scenario: &CanonicalScenario) -> Result<(), EmitError>;

    /// Flushes whatever the sink still buffers. Called once, after the
    /// last `emit` of a fully processed range.
    fn finish(&mut self) -> Result<(), EmitError>;
}

/// A sink that discards everything. Stands in where a run exercises the
/// enumeration path alone.
#[derive(Debug, Default)]
pub struct NullSink;

impl ScenarioSink for NullSink {
    fn emit(&mut self, _scenario: &CanonicalScenario) -> Result<(), EmitError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}

/// One scenario in the output format.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ScenarioRecord {
    /// Leaders per 1-based round: the chosen leader first, then the node
    /// sharing its identity if there is one.
    round_leaders: BTreeMap<u64, Vec<NodeId>>,
    /// Partition membership per 1-based round, one list of node ids per
    /// partition label, empty labels included.
    round_partitions: BTreeMap<u64, Vec<Vec<NodeId>>>,
}

/// The top-level object of one output file.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct TestcaseFile {
    num_of_nodes: usize,
    num_of_twins: usize,
    scenarios: Vec<ScenarioRecord>,
}

/// Writes scenarios to JSON files of at most `max_per_file` scenarios each,
/// named `testcases-<shard>-<worker>-<seq>.json` under the output
/// directory. Nothing touches the disk until the first full batch, so a
/// sink that never receives a scenario leaves no trace.
#[derive(Debug)]
pub struct JsonBatcher {
    dir: PathBuf,
    nodes: NodeSet,
    num_partitions: usize,
    shard_index: usize,
    worker: usize,
    max_per_file: usize,
    buffer: Vec<ScenarioRecord>,
    files_written: usize,
}

impl JsonBatcher {
    /// Creates a batcher for one worker's output stream.
    pub fn new(
        dir: PathBuf,
        space: &ScenarioSpace,
        shard_index: usize,
        worker: usize,
        max_per_file: usize,
    ) -> Self {
        Self {
            dir,
            nodes: space.nodes().clone(),
            num_partitions: space.num_partitions(),
            shard_index,
            worker,
            max_per_file,
            buffer: Vec::new(),
            files_written: 0,
        }
    }

    /// The number of files written so far.
    pub fn files_written(&self) -> usize {
        self.files_written
    }

    fn record(&self, scenario: &CanonicalScenario) -> ScenarioRecord {
        let mut round_leaders = BTreeMap::new();
        let mut round_partitions = BTreeMap::new();
        for (i, round) in scenario.scenario().rounds.iter().enumerate() {
            let round_number = i as u64 + 1;
            let mut leaders = vec![round.leader];
            if let Some(twin) = self.nodes.twin(round.leader) {
                leaders.push(twin);
            }
            round_leaders.insert(round_number, leaders);
            round_partitions.insert(round_number, round.partition.groups(self.num_partitions));
        }
        ScenarioRecord {
            round_leaders,
            round_partitions,
        }
    }

    fn flush(&mut self) -> Result<(), EmitError> {
        let testcases = TestcaseFile {
            num_of_nodes: self.nodes.len(),
            num_of_twins: self.nodes.num_twins(),
            scenarios: mem::take(&mut self.buffer),
        };
        let name = format!(
            "testcases-{}-{}-{}.json",
            self.shard_index, self.worker, self.files_written
        );
        let path = self.dir.join(name);
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating output directory {:?}", self.dir))?;
        let data = serde_json::to_string(&testcases).context("serializing testcases")?;
        fs::write(&path, data).with_context(|| format!("writing {path:?}"))?;
        tracing::debug!(
            "wrote {:?} with {} scenarios",
            path,
            testcases.scenarios.len()
        );
        self.files_written += 1;
        crate::metrics::METRICS.files_written.inc();
        Ok(())
    }
}

impl ScenarioSink for JsonBatcher {
    fn emit(&mut self, scenario: &CanonicalScenario) -> Result<(), EmitError> {
        let record = self.record(scenario);
        self.buffer.push(record);
        if self.buffer.len() >= self.max_per_file {
            self.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(())
    }
}
