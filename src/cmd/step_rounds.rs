use super::parse_sequence;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::report::TracingSink;
use cipherforge::search::{tune_step_rounds, tune_step_rounds_parallel, StepRoundOptions};
use cipherforge::session::Session;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct StepRoundsArgs {
    #[command(flatten)]
    pub config: Config,

    #[arg(short = 's', long)]
    pub sequence: String,

    /// Worker threads; 1 runs the single-threaded search.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Also try swapping neighbouring steps.
    #[arg(long, default_value_t = false)]
    pub reorder: bool,

    #[arg(long, default_value_t = 2)]
    pub patience: usize,
}

pub fn run(
    args: &StepRoundsArgs,
    config: &Config,
    mut session: Session,
) -> CfResult<OperationStatus> {
    let start = parse_sequence(
        session.engine().registry(),
        &args.sequence,
        config.search.rounds_per_step,
        config.search.global_rounds,
    )?;
    let options = StepRoundOptions {
        max_step_rounds: config.search.max_step_rounds,
        patience: args.patience,
        allow_reorder: args.reorder,
    };

    let outcome = if args.threads > 1 {
        info!("🧵 Tuning step rounds on {} threads", args.threads);
        tune_step_rounds_parallel(&mut session, &start, &options, args.threads, &mut TracingSink)
    } else {
        tune_step_rounds(&mut session, &start, &options, &mut TracingSink)
    };

    if let Some(best) = &outcome.best {
        info!(
            "🏆 Best: {} score={:.4}",
            best.sequence.describe(session.engine().registry()),
            best.score
        );
    }
    Ok(outcome.status())
}
