//! Main binary of the scenario generator. It parses the command line,
//! plans this machine's shard of the scenario space, fans the shard out to
//! the workers and reports the per-range outcomes at the end.
use std::{fs, io::IsTerminal as _, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{prelude::*, Registry};
use twins_generator::{
    plan_shards, run_split, worker_ranges, Config, JsonBatcher, NullSink, RangeOutcome,
    ScenarioSink, ScenarioSpace,
};
use zksync_concurrency::{ctx, scope};

/// Command-line application enumerating twins scenarios into JSON files.
#[derive(Debug, Parser)]
struct Args {
    /// Total number of nodes, twins included.
    #[arg(long, default_value_t = 4)]
    nodes: usize,
    /// Number of twins among the nodes.
    #[arg(long, default_value_t = 1)]
    twins: usize,
    /// Maximum number of network partitions per round.
    #[arg(long, default_value_t = 2)]
    partitions: usize,
    /// Number of consensus rounds per scenario.
    #[arg(long, default_value_t = 7)]
    rounds: usize,
    /// Number of parallel workers.
    #[arg(long, default_value_t = 1)]
    workers: usize,
    /// Maximum number of scenarios per output file.
    #[arg(long, default_value_t = 1000)]
    max_per_file: usize,
    /// Which shard of the scenario space this machine generates.
    #[arg(long, default_value_t = 0)]
    shard_index: usize,
    /// Total number of shards the space is split into.
    #[arg(long, default_value_t = 1)]
    shard_count: usize,
    /// Output directory for the testcase files.
    #[arg(long, default_value = "testcases")]
    path: PathBuf,
    /// Enumerate and count without writing any files.
    #[arg(long)]
    dry_run: bool,
    /// Log at debug level.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Extracts the generator configuration from these args.
    fn config(&self) -> Config {
        Config {
            nodes: self.nodes,
            twins: self.twins,
            partitions: self.partitions,
            rounds: self.rounds,
            shard_count: self.shard_count,
            shard_index: self.shard_index,
            workers: self.workers,
            max_per_file: self.max_per_file,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    let ctx = &ctx::root();

    // Human-readable logs on stdout, debug level on request.
    let log_level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal())
        .with_file(false)
        .with_line_number(false)
        .with_filter(log_level);
    tracing::subscriber::set_global_default(Registry::default().with(stdout_log)).unwrap();
    tracing::debug!(?args, "starting the generator");

    let config = args.config();
    let space = ScenarioSpace::new(&config).context("invalid configuration")?;
    let raw = space.raw_count();
    tracing::info!("the scenario space holds {raw} raw scenarios");
    match space.canonical_count() {
        Ok(count) => tracing::info!("expecting {count} canonical scenarios across all shards"),
        Err(_) => tracing::warn!("the canonical scenario count does not fit 128 bits"),
    }
    if raw >= 1_000_000_000 {
        tracing::warn!(
            "enumerating over a billion scenarios, consider more shards or fewer rounds"
        );
    }

    let shard = plan_shards(raw, config.shard_count)[config.shard_index];
    let ranges = worker_ranges(shard, config.workers);
    tracing::info!(
        "shard {} of {} covers {shard}, split across {} workers",
        config.shard_index,
        config.shard_count,
        config.workers
    );
    if !args.dry_run {
        // Fail on an unwritable destination before enumerating anything.
        fs::create_dir_all(&args.path)
            .with_context(|| format!("creating output directory {:?}", args.path))?;
    }

    let results = scope::run!(ctx, |ctx, s| async {
        s.spawn_bg(async {
            if ctx.wait(tokio::signal::ctrl_c()).await.is_ok() {
                tracing::info!("received Ctrl-C, stopping after the indexes in flight");
                s.cancel();
            }
            Ok(())
        });
        run_split(
            ctx,
            &space,
            &ranges,
            |worker| {
                Ok(if args.dry_run {
                    Box::new(NullSink) as Box<dyn ScenarioSink + Send>
                } else {
                    Box::new(JsonBatcher::new(
                        args.path.clone(),
                        &space,
                        config.shard_index,
                        worker,
                        config.max_per_file,
                    ))
                })
            },
            args.dry_run,
        )
        .await
    })
    .await?;

    let mut emitted = 0u64;
    let mut failed = false;
    for result in &results {
        match &result.outcome {
            RangeOutcome::Completed => {
                tracing::info!(
                    "range {} completed with {} scenarios",
                    result.range,
                    result.emitted
                );
            }
            RangeOutcome::Cancelled => {
                tracing::warn!(
                    "range {} stopped at {} with {} scenarios out, resume from there",
                    result.range,
                    result.completed_to,
                    result.emitted
                );
            }
            RangeOutcome::Failed(err) => {
                failed = true;
                tracing::error!(
                    "range {} failed at {}: {err:#}",
                    result.range,
                    result.completed_to
                );
            }
        }
        emitted += result.emitted;
    }
    if args.dry_run {
        tracing::info!("dry run found {emitted} canonical scenarios in this shard");
    } else {
        tracing::info!("emitted {emitted} canonical scenarios");
    }
    anyhow::ensure!(!failed, "at least one worker range failed");
    Ok(())
}
