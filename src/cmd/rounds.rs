use super::parse_sequence;
use crate::reports;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::report::TracingSink;
use cipherforge::search::optimize_global_rounds;
use cipherforge::session::Session;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct RoundsArgs {
    #[command(flatten)]
    pub config: Config,

    /// Fixed transform chain, e.g. "xor-key,sbox,rotl-bits".
    #[arg(short = 's', long)]
    pub sequence: String,
}

pub fn run(args: &RoundsArgs, config: &Config, mut session: Session) -> CfResult<OperationStatus> {
    let seq = parse_sequence(
        session.engine().registry(),
        &args.sequence,
        config.search.rounds_per_step,
        config.search.global_rounds,
    )?;

    info!(
        "🔁 Sweeping global rounds 1..={} for {}",
        config.search.max_global_rounds,
        seq.describe(session.engine().registry())
    );
    let outcome = optimize_global_rounds(
        &mut session,
        &seq.steps,
        config.search.max_global_rounds,
        &mut TracingSink,
    );
    reports::print_round_sweep(&outcome);
    info!(
        "Active global rounds: {}",
        session.settings.global_rounds
    );
    Ok(outcome.status())
}
