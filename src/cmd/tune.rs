use crate::reports;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::report::TracingSink;
use cipherforge::seeds;
use cipherforge::session::Session;
use cipherforge::tuner::{TunerOptions, WeightTuner};
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug, Clone)]
pub struct TuneArgs {
    #[command(flatten)]
    pub config: Config,

    /// Log of top sequences from an earlier large run, one per line.
    #[arg(long)]
    pub seeds: Option<PathBuf>,
}

pub fn run(args: &TuneArgs, config: &Config, mut session: Session) -> CfResult<OperationStatus> {
    let registry = session.engine().registry();
    let pool = match &args.seeds {
        Some(path) => {
            info!("📂 Loading seed log: {}", path.display());
            let top =
                seeds::load_top_sequences_from_path(path, registry, config.tuning.seed_top_n)?;
            seeds::extract_transform_pool(&top, registry)
        }
        None => {
            warn!("⚠️  No seed log given. Tuning over every searchable transform.");
            registry.permutable_ids()
        }
    };

    let tuner = WeightTuner::new(TunerOptions::from_config(config)?);
    let outcome = tuner.run(&mut session, &pool, &mut TracingSink)?;

    reports::print_weights(&outcome.best_weights);
    Ok(outcome.status())
}
