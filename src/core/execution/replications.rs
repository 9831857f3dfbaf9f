use super::config::{ConcurrencyMode, SimulationConfig};
use crate::core::builder::{NetworkSpec, SimulationBuilder};
use crate::core::errors::SimError;
use crate::core::stats::{ReplicationSummary, StatisticsSnapshot};
use crate::core::types::SimTime;
use log::info;
use rand::RngCore;
use rayon::prelude::*;

/// Outcome of several independent runs of one network
#[derive(Debug, Clone)]
pub struct Replications {
    /// Seed of each run, in run order
    pub seeds: Vec<u64>,
    pub snapshots: Vec<StatisticsSnapshot>,
    pub summary: ReplicationSummary,
}

/// Run `runs` independent copies of `network` until `until`.
///
/// Run `i` is seeded with `base + i`, where the base is the configured seed or, for
/// an unseeded configuration, a fresh draw. Each run is its own [`Simulation`], so the
/// Rayon mode only parallelises across runs.
///
/// [`Simulation`]: super::Simulation
pub fn run_replications(
    network: &NetworkSpec,
    config: &SimulationConfig,
    runs: usize,
    until: SimTime,
) -> Result<Replications, SimError> {
    let base = config.seed.unwrap_or_else(|| rand::thread_rng().next_u64());
    let seeds: Vec<u64> = (0..runs as u64).map(|i| base.wrapping_add(i)).collect();
    info!(
        "Running {} replications until t={} ({:?})",
        runs, until, config.concurrency_mode
    );

    let run_one = |seed: u64| -> Result<StatisticsSnapshot, SimError> {
        let mut simulation = SimulationBuilder::from_spec(network.clone())
            .with_config(config.clone().with_seed(seed))
            .build()?;
        simulation.simulate(until)
    };

    let snapshots = match config.concurrency_mode {
        ConcurrencyMode::Sequential => seeds
            .iter()
            .map(|&seed| run_one(seed))
            .collect::<Result<Vec<_>, _>>()?,
        ConcurrencyMode::Rayon => {
            let mut pool = rayon::ThreadPoolBuilder::new();
            if let Some(threads) = config.thread_pool_size {
                pool = pool.num_threads(threads);
            }
            let pool = pool
                .build()
                .map_err(|e| SimError::ThreadPool(e.to_string()))?;
            pool.install(|| {
                seeds
                    .par_iter()
                    .map(|&seed| run_one(seed))
                    .collect::<Result<Vec<_>, _>>()
            })?
        }
    };

    let summary = ReplicationSummary::from_snapshots(&snapshots);
    Ok(Replications {
        seeds,
        snapshots,
        summary,
    })
}
