use super::{parse_rounds, parse_transforms};
use crate::reports;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::report::TracingSink;
use cipherforge::search::{best_fit_search, BestFitOptions};
use cipherforge::session::Session;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct BestFitArgs {
    #[command(flatten)]
    pub config: Config,

    /// The fixed transform set whose orderings are swept, e.g. "xor-key,sbox,chain-mix".
    #[arg(short = 't', long)]
    pub transforms: String,

    /// Per-transform round counts matching `--transforms`, e.g. "1,2,1".
    #[arg(long)]
    pub step_rounds: Option<String>,

    /// Global rounds for this sweep only.
    #[arg(long)]
    pub sweep_global_rounds: Option<u32>,

    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn run(args: &BestFitArgs, mut session: Session) -> CfResult<OperationStatus> {
    let ids = parse_transforms(session.engine().registry(), &args.transforms)?;
    let options = BestFitOptions {
        step_rounds: args.step_rounds.as_deref().map(parse_rounds).transpose()?,
        global_rounds: args.sweep_global_rounds,
    };

    let outcome = best_fit_search(&mut session, &ids, &options, &mut TracingSink)?;
    reports::print_candidates(
        "Best-Fit Orderings",
        &outcome.ranked,
        session.engine().registry(),
        args.top,
    );
    Ok(outcome.status())
}
