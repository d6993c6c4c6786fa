use crate::reports;
use cipherforge::bench::{benchmark_transforms, default_threads};
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::session::Session;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(long, default_value_t = 200)]
    pub iterations: usize,

    /// Worker count; defaults to available parallelism.
    #[arg(long)]
    pub threads: Option<usize>,
}

pub fn run(args: &BenchArgs, session: &Session) -> CfResult<OperationStatus> {
    info!("🏎️  Benchmarking transform pairs...");
    let report = benchmark_transforms(
        session.engine(),
        session.key(),
        session.input(),
        args.iterations,
        args.threads.unwrap_or_else(default_threads),
    )?;
    reports::print_benchmark(&report);

    let lossy = report.pairs.iter().filter(|p| !p.reversible).count();
    Ok(OperationStatus::ok(format!(
        "Benchmarked {} pairs on {} workers, total best {:?} ({} not reversible)",
        report.pairs.len(),
        report.threads,
        report.total_best,
        lossy
    )))
}
