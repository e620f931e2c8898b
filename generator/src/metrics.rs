//! Metrics for the enumeration pipeline.

use vise::{Counter, Global, Metrics};

/// Metrics defined by the generator.
#[derive(Debug, Metrics)]
#[metrics(prefix = "twins_generator")]
pub(crate) struct GeneratorMetrics {
    /// Number of scenario indexes unranked.
    pub(crate) indexes_unranked: Counter,
    /// Number of canonical scenarios found, whether written out or only
    /// counted in a dry run.
    pub(crate) scenarios_emitted: Counter,
    /// Number of non-canonical scenarios skipped.
    pub(crate) scenarios_skipped: Counter,
    /// Number of output files written.
    pub(crate) files_written: Counter,
}

#[vise::register]
pub(crate) static METRICS: Global<GeneratorMetrics> = Global::new();
