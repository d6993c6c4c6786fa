use super::parse_transforms;
use crate::reports;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::search::mini_search;
use cipherforge::session::Session;
use clap::Args;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub config: Config,

    /// Transform names to draw from; every searchable transform when absent.
    #[arg(short = 't', long)]
    pub transforms: Option<String>,

    /// Rows of the ranking to print.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn run(args: &SearchArgs, config: &Config, mut session: Session) -> CfResult<OperationStatus> {
    let registry = session.engine().registry();
    let pool = match &args.transforms {
        Some(list) => parse_transforms(registry, list)?,
        None => registry.permutable_ids(),
    };

    info!(
        "🔍 Mini search: {} transforms, up to {} steps",
        pool.len(),
        config.search.max_sequence_len
    );
    session.pool.initialize();
    let outcome = mini_search(&mut session, &pool, config.search.max_sequence_len, None);

    let registry = session.engine().registry();
    reports::print_candidates("Mini Search", &outcome.ranked, registry, args.top);
    reports::print_contenders(&session.pool.ranked(), registry);
    Ok(outcome.status())
}
