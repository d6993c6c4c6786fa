use crate::error::{CfResult, CipherForgeError};
use crate::sequence::TransformStep;
use crate::transform::{CryptoEngine, Key};
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PairTiming {
    pub forward_id: u8,
    pub inverse_id: u8,
    pub name: String,
    /// Fastest encrypt+decrypt observed across iterations.
    pub best: Duration,
    pub reversible: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    pub pairs: Vec<PairTiming>,
    pub total_best: Duration,
    pub threads: usize,
}

pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Times one encrypt/decrypt round trip per forward/inverse pair.
///
/// Pairs run on a pool of `threads` workers, so at most that many are timed at
/// once. Each pair keeps its own minimum; the grand total is summed after join.
pub fn benchmark_transforms(
    engine: &dyn CryptoEngine,
    key: &Key,
    input: &[u8],
    iterations: usize,
    threads: usize,
) -> CfResult<BenchmarkReport> {
    let registry = engine.registry();
    let work: Vec<(u8, u8, String)> = registry
        .iter()
        .filter(|(_, t)| !t.exclude_from_permutations)
        .map(|(&id, t)| (id, t.inverse_id, t.name.clone()))
        .collect();

    let threads = threads.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| CipherForgeError::Config(format!("Could not build worker pool: {}", e)))?;

    let iterations = iterations.max(1);
    info!(
        "Benchmark: {} transform pairs, {} iterations, {} workers",
        work.len(),
        iterations,
        threads
    );

    let slots: Vec<CfResult<PairTiming>> = pool.install(|| {
        work.par_iter()
            .map(|(id, inverse_id, name)| {
                let steps = [TransformStep::new(*id, 1)];
                let mut best = Duration::MAX;
                let mut reversible = true;
                for _ in 0..iterations {
                    let start = Instant::now();
                    let ct = engine.encrypt(&steps, 1, key, input)?;
                    let pt = engine.decrypt(key, &ct)?;
                    best = best.min(start.elapsed());
                    reversible &= pt == input;
                }
                debug!("Benchmark: {} best {:?}", name, best);
                Ok(PairTiming {
                    forward_id: *id,
                    inverse_id: *inverse_id,
                    name: name.clone(),
                    best,
                    reversible,
                })
            })
            .collect()
    });

    let pairs = slots.into_iter().collect::<CfResult<Vec<_>>>()?;
    let total_best = pairs.iter().map(|p| p.best).sum();
    Ok(BenchmarkReport {
        pairs,
        total_best,
        threads,
    })
}
