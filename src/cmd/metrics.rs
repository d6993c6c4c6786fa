use crate::reports;
use cipherforge::config::Config;
use cipherforge::error::{CfResult, OperationStatus};
use cipherforge::session::Session;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub config: Config,
}

pub fn run(session: &Session) -> CfResult<OperationStatus> {
    reports::print_metric_catalog(&session.registry);
    Ok(OperationStatus::ok(format!(
        "{} metrics registered",
        session.registry.len()
    )))
}
