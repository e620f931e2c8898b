//! The worker loop driving `unrank` -> canonical filter -> emit over one
//! index range, and the orchestrator fanning a shard's ranges out to
//! parallel blocking workers.
use zksync_concurrency::{ctx, scope};

use crate::{
    canonical::Canonicalizer,
    metrics::METRICS,
    output::{EmitError, ScenarioSink},
    shard::IndexRange,
    space::{ScenarioIndex, ScenarioSpace},
};

/// How a worker's range ended.
#[derive(Debug)]
pub enum RangeOutcome {
    /// Every index of the range was processed.
    Completed,
    /// A stop was requested: indexes below the watermark were processed,
    /// the rest of the range was skipped. A graceful truncation, not a
    /// failure.
    Cancelled,
    /// The sink failed. Indexes below the watermark were fully processed
    /// and re-running the remainder of the range is safe.
    Failed(EmitError),
}

/// Completion report of one worker range.
#[derive(Debug)]
pub struct RangeResult {
    /// The range the worker was assigned.
    pub range: IndexRange,
    /// Watermark: every index in `[range.start, completed_to)` was
    /// processed, no index at or above `completed_to` was.
    pub completed_to: ScenarioIndex,
    /// Canonical scenarios found below the watermark. In a dry run, the
    /// scenarios a normal run would have emitted.
    pub emitted: u64,
    /// How the range ended.
    pub outcome: RangeOutcome,
}

impl RangeResult {
    /// Whether the whole range was processed and emitted.
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RangeOutcome::Completed)
    }
}

/// Drives one worker range: unranks each index in ascending order, keeps
/// the canonical scenarios and hands them to the sink, or only counts them
/// when `dry_run` is set. Cancellation and sink failure are reported in the
/// outcome together with the watermark of how far the range got, so a
/// caller can re-run exactly the remainder.
///
/// `range` must lie within the space.
pub fn run_range(
    ctx: &ctx::Ctx,
    space: &ScenarioSpace,
    range: IndexRange,
    sink: &mut dyn ScenarioSink,
    dry_run: bool,
) -> RangeResult {
    assert!(
        range.end.0 <= space.raw_count(),
        "worker range beyond the scenario space"
    );
    let canonicalizer = Canonicalizer::new(space.num_partitions());
    let mut emitted = 0u64;
    let mut index = range.start;
    while index < range.end {
        // One cancellation check per index: a stop request finishes the
        // index at hand and truncates the rest of the range.
        if !ctx.is_active() {
            return RangeResult {
                range,
                completed_to: index,
                emitted,
                outcome: RangeOutcome::Cancelled,
            };
        }
        // In range by the assert above.
        let scenario = space.unrank(index).expect("index within the space");
        METRICS.indexes_unranked.inc();
        match canonicalizer.filter(scenario) {
            Some(scenario) => {
                if !dry_run {
                    if let Err(err) = sink.emit(&scenario) {
                        tracing::warn!("sink failed at index {index}: {err:#}");
                        return RangeResult {
                            range,
                            completed_to: index,
                            emitted,
                            outcome: RangeOutcome::Failed(err),
                        };
                    }
                }
                METRICS.scenarios_emitted.inc();
                emitted += 1;
            }
            None => {
                METRICS.scenarios_skipped.inc();
            }
        }
        index = index.next();
    }
    if !dry_run {
        if let Err(err) = sink.finish() {
            tracing::warn!("sink failed to finish {range}: {err:#}");
            return RangeResult {
                range,
                completed_to: range.end,
                emitted,
                outcome: RangeOutcome::Failed(err),
            };
        }
    }
    RangeResult {
        range,
        completed_to: range.end,
        emitted,
        outcome: RangeOutcome::Completed,
    }
}

/// Runs every worker range of a shard in parallel, one blocking task per
/// range, each emitting into its own sink built by `make_sink`. Workers
/// share nothing but the read-only space, so they never block each other.
///
/// Returns one result per range, in range order, whatever mix of outcomes
/// the ranges ended with: a failed or cancelled range never aborts its
/// siblings, and a cancelled run still reports every watermark.
pub async fn run_split<F>(
    ctx: &ctx::Ctx,
    space: &ScenarioSpace,
    ranges: &[IndexRange],
    make_sink: F,
    dry_run: bool,
) -> anyhow::Result<Vec<RangeResult>>
where
    F: Fn(usize) -> anyhow::Result<Box<dyn ScenarioSink + Send>> + Sync,
{
    tracing::info!(
        "running {} worker ranges, dry_run = {dry_run}",
        ranges.len()
    );
    let mut results: Vec<Option<RangeResult>> = Vec::new();
    results.resize_with(ranges.len(), || None);
    let make_sink = &make_sink;
    let slots = &mut results;
    scope::run!(ctx, |ctx, s| async move {
        for ((worker, range), slot) in ranges.iter().enumerate().zip(slots.iter_mut()) {
            let range = *range;
            s.spawn_blocking(move || {
                tracing::debug!("worker {worker} starting on {range}");
                let result = match make_sink(worker) {
                    Ok(mut sink) => run_range(ctx, space, range, sink.as_mut(), dry_run),
                    // A sink that cannot even be built is that range's
                    // failure, with nothing processed.
                    Err(err) => RangeResult {
                        range,
                        completed_to: range.start,
                        emitted: 0,
                        outcome: RangeOutcome::Failed(EmitError::from(err)),
                    },
                };
                *slot = Some(result);
                Ok(())
            });
        }
        anyhow::Ok(())
    })
    .await?;
    // Every worker task fills its slot before completing.
    Ok(results
        .into_iter()
        .map(|result| result.expect("worker result"))
        .collect())
}
