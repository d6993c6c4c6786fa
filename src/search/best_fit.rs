use super::{run_candidates, SearchOutcome};
use crate::error::{CfResult, CipherForgeError};
use crate::report::ReportSink;
use crate::sequence::{CandidateSequence, TransformStep};
use crate::session::Session;
use itertools::Itertools;
use tracing::info;

/// 8! orderings is the most an exhaustive sweep is allowed to enumerate.
pub const MAX_BEST_FIT_LEN: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct BestFitOptions {
    /// Rounds for each entry of the transform set; defaults to the session's uniform count.
    pub step_rounds: Option<Vec<u8>>,
    /// Global rounds used only for this sweep; the session setting is restored afterwards.
    pub global_rounds: Option<u32>,
}

/// Exhaustively evaluates every distinct ordering of a fixed transform multiset.
/// Each transform keeps its own round count as it moves through the chain.
pub fn best_fit_search(
    session: &mut Session,
    transforms: &[u8],
    options: &BestFitOptions,
    sink: &mut dyn ReportSink,
) -> CfResult<SearchOutcome> {
    if transforms.is_empty() {
        let outcome = SearchOutcome::empty("Best-fit search: no transforms available");
        sink.section("Best-Fit Search", vec![outcome.message.clone()]);
        return Ok(outcome);
    }
    if transforms.len() > MAX_BEST_FIT_LEN {
        return Err(CipherForgeError::Validation(format!(
            "Best-fit search takes at most {} transforms, got {}",
            MAX_BEST_FIT_LEN,
            transforms.len()
        )));
    }

    let mut scope = session.scoped();
    if let Some(g) = options.global_rounds {
        scope.settings.global_rounds = g.max(1);
    }

    let rounds: Vec<u8> = match &options.step_rounds {
        Some(r) if r.len() != transforms.len() => {
            return Err(CipherForgeError::Validation(format!(
                "{} step round counts given for {} transforms",
                r.len(),
                transforms.len()
            )));
        }
        Some(r) => r.clone(),
        None => vec![scope.settings.rounds_per_step; transforms.len()],
    };

    let global_rounds = scope.settings.global_rounds;
    let steps: Vec<TransformStep> = transforms
        .iter()
        .zip(&rounds)
        .map(|(&id, &r)| TransformStep::new(id, r))
        .collect();

    let candidates: Vec<CandidateSequence> = steps
        .iter()
        .copied()
        .permutations(steps.len())
        .unique()
        .map(|ordering| CandidateSequence::new(ordering, global_rounds))
        .collect();

    info!(
        "Best-fit search: {} orderings of {} transforms",
        candidates.len(),
        steps.len()
    );
    let outcome = run_candidates(&mut scope, candidates, "Best-fit search");

    let registry = scope.engine().registry();
    let mut lines = vec![
        format!("Orderings evaluated: {}", outcome.evaluated_count()),
        format!("Rejected (not reversible): {}", outcome.rejected.len()),
    ];
    match &outcome.best {
        Some(best) => {
            lines.push(format!("Best score: {:.4}", best.score));
            lines.push(format!("Best sequence: {}", best.sequence.describe(registry)));
        }
        None => lines.push(outcome.message.clone()),
    }
    sink.section("Best-Fit Search", lines);

    Ok(outcome)
}
