pub mod best_fit;
pub mod mini;
pub mod rounds;

pub use self::best_fit::{best_fit_search, BestFitOptions};
pub use self::mini::mini_search;
pub use self::rounds::{
    optimize_global_rounds, tune_step_rounds, tune_step_rounds_parallel, RoundSweepOutcome,
    StepRoundOptions, StepRoundOutcome,
};

use crate::error::OperationStatus;
use crate::sequence::CandidateSequence;
use crate::session::{CandidateOutcome, EvaluatedCandidate, Session};
use tracing::debug;

/// Every candidate a search looked at, ranked, plus the single best.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Reversible candidates, best first. Equal scores keep evaluation order.
    pub ranked: Vec<EvaluatedCandidate>,
    pub best: Option<EvaluatedCandidate>,
    pub rejected: Vec<(CandidateSequence, String)>,
    pub message: String,
}

impl SearchOutcome {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best.as_ref().map(|b| b.score)
    }

    pub fn evaluated_count(&self) -> usize {
        self.ranked.len()
    }

    pub fn status(&self) -> OperationStatus {
        if self.best.is_some() {
            OperationStatus::ok(self.message.clone())
        } else {
            OperationStatus::failed(self.message.clone())
        }
    }
}

/// Evaluates candidates one at a time, feeding survivors to the pool.
/// The running best only moves on a strictly higher score.
pub(crate) fn run_candidates(
    session: &mut Session,
    candidates: Vec<CandidateSequence>,
    label: &str,
) -> SearchOutcome {
    if candidates.is_empty() {
        return SearchOutcome::empty(format!("{}: no candidate sequences to evaluate", label));
    }

    let total = candidates.len();
    let mut outcome = SearchOutcome::default();
    for candidate in candidates {
        match session.evaluate(&candidate) {
            CandidateOutcome::Evaluated(evaluated) => {
                let better = outcome
                    .best
                    .as_ref()
                    .map_or(true, |b| evaluated.score > b.score);
                if better {
                    debug!("{}: new best {:.4} {}", label, evaluated.score, candidate);
                    outcome.best = Some(evaluated.clone());
                }
                outcome.ranked.push(evaluated);
            }
            CandidateOutcome::Rejected { sequence, reason } => {
                outcome.rejected.push((sequence, reason));
            }
        }
    }

    outcome.ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    outcome.message = match &outcome.best {
        Some(best) => format!(
            "{}: evaluated {} of {} candidates ({} rejected), best {:.4}",
            label,
            outcome.ranked.len(),
            total,
            outcome.rejected.len(),
            best.score
        ),
        None => format!(
            "{}: no results, all {} candidates failed the reversibility check",
            label, total
        ),
    };
    outcome
}
