//! Test helpers: reference implementations to check the fast paths
//! against, and in-memory sinks.
use crate::{
    canonical::CanonicalScenario,
    config::Config,
    output::{EmitError, ScenarioSink},
    scenario::{NodeId, PartitionAssignment, PartitionId, Round, Scenario},
    space::ScenarioSpace,
};

/// A valid configuration with the given space dimensions, one shard and
/// one worker.
pub fn config(nodes: usize, twins: usize, partitions: usize, rounds: usize) -> Config {
    Config {
        nodes,
        twins,
        partitions,
        rounds,
        shard_count: 1,
        shard_index: 0,
        workers: 1,
        max_per_file: 1000,
    }
}

/// The space of [`config`].
pub fn space(nodes: usize, twins: usize, partitions: usize, rounds: usize) -> ScenarioSpace {
    ScenarioSpace::new(&config(nodes, twins, partitions, rounds)).unwrap()
}

/// Every (assignment, leader) pair of one round in digit order, enumerated
/// with an odometer over the labels rather than through the bijection.
pub fn naive_rounds(space: &ScenarioSpace) -> Vec<Round> {
    let mut rounds = Vec::new();
    let mut labels = vec![0usize; space.num_nodes()];
    loop {
        for leader in 0..space.num_nodes() {
            rounds.push(Round {
                partition: PartitionAssignment::new(
                    labels.iter().copied().map(PartitionId).collect(),
                ),
                leader: NodeId(leader),
            });
        }
        // Odometer step, last node fastest.
        let mut position = space.num_nodes();
        loop {
            if position == 0 {
                return rounds;
            }
            position -= 1;
            labels[position] += 1;
            if labels[position] < space.num_partitions() {
                break;
            }
            labels[position] = 0;
        }
    }
}

/// Every scenario of a space in index order, as the cartesian product of
/// [`naive_rounds`] across rounds. Only for spaces small enough to hold in
/// memory.
pub fn naive_scenarios(space: &ScenarioSpace) -> Vec<Scenario> {
    let per_round = naive_rounds(space);
    let mut scenarios = vec![Scenario { rounds: Vec::new() }];
    for _ in 0..space.num_rounds() {
        let mut grown = Vec::with_capacity(scenarios.len() * per_round.len());
        for scenario in &scenarios {
            for round in &per_round {
                let mut scenario = scenario.clone();
                scenario.rounds.push(round.clone());
                grown.push(scenario);
            }
        }
        scenarios = grown;
    }
    scenarios
}

/// A sink collecting everything it receives.
#[derive(Debug, Default)]
pub struct CollectSink {
    /// Scenarios received, in emission order.
    pub scenarios: Vec<Scenario>,
    /// Whether the stream was finished.
    pub finished: bool,
}

impl ScenarioSink for CollectSink {
    fn emit(&mut self, scenario: &CanonicalScenario) -> Result<(), EmitError> {
        self.scenarios.push(scenario.scenario().clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        self.finished = true;
        Ok(())
    }
}

/// A sink that accepts a fixed number of scenarios and then fails.
#[derive(Debug)]
pub struct FailingSink {
    /// Emits left before the sink starts failing.
    pub remaining: usize,
}

impl ScenarioSink for FailingSink {
    fn emit(&mut self, _scenario: &CanonicalScenario) -> Result<(), EmitError> {
        if self.remaining == 0 {
            return Err(EmitError::from(anyhow::anyhow!("sink ran out of space")));
        }
        self.remaining -= 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EmitError> {
        Ok(())
    }
}
