use crate::error::OperationStatus;
use crate::report::ReportSink;
use crate::sequence::{CandidateSequence, TransformStep};
use crate::session::{CandidateOutcome, EvaluatedCandidate, Session};
use rayon::prelude::*;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct RoundSweepOutcome {
    /// `(rounds, score)`; `None` where the round count failed reversibility.
    pub per_round: Vec<(u32, Option<f64>)>,
    pub best_rounds: Option<u32>,
    pub best: Option<EvaluatedCandidate>,
    pub message: String,
}

impl RoundSweepOutcome {
    pub fn status(&self) -> OperationStatus {
        match self.best_rounds {
            Some(_) => OperationStatus::ok(self.message.clone()),
            None => OperationStatus::failed(self.message.clone()),
        }
    }
}

/// Sweeps `global_rounds` over 1..=`max_rounds` with ordering and step rounds fixed.
///
/// On success the winning count becomes the session's active global rounds.
pub fn optimize_global_rounds(
    session: &mut Session,
    steps: &[TransformStep],
    max_rounds: u32,
    sink: &mut dyn ReportSink,
) -> RoundSweepOutcome {
    let mut outcome = RoundSweepOutcome::default();
    if steps.is_empty() || max_rounds == 0 {
        outcome.message = "Global round sweep: no sequence or round range to test".to_string();
        sink.section("Global Round Sweep", vec![outcome.message.clone()]);
        return outcome;
    }

    for rounds in 1..=max_rounds {
        let candidate = CandidateSequence::new(steps.to_vec(), rounds);
        match session.evaluate(&candidate) {
            CandidateOutcome::Evaluated(evaluated) => {
                outcome.per_round.push((rounds, Some(evaluated.score)));
                let better = outcome
                    .best
                    .as_ref()
                    .map_or(true, |b| evaluated.score > b.score);
                if better {
                    outcome.best_rounds = Some(rounds);
                    outcome.best = Some(evaluated);
                }
            }
            CandidateOutcome::Rejected { reason, .. } => {
                warn!("Global round sweep: {} rounds skipped ({})", rounds, reason);
                outcome.per_round.push((rounds, None));
            }
        }
    }

    let mut lines: Vec<String> = outcome
        .per_round
        .iter()
        .map(|(r, s)| match s {
            Some(score) => format!("rounds={:<3} score={:.4}", r, score),
            None => format!("rounds={:<3} not reversible", r),
        })
        .collect();

    match (outcome.best_rounds, &outcome.best) {
        (Some(rounds), Some(best)) => {
            session.settings.global_rounds = rounds;
            info!(
                "Global round sweep: applying {} rounds (score {:.4})",
                rounds, best.score
            );
            outcome.message = format!(
                "Global round sweep: best {} rounds with score {:.4}",
                rounds, best.score
            );
        }
        _ => {
            outcome.message = format!(
                "Global round sweep: no reversible round count in 1..={}",
                max_rounds
            );
        }
    }
    lines.push(outcome.message.clone());
    sink.section("Global Round Sweep", lines);
    outcome
}

#[derive(Debug, Clone)]
pub struct StepRoundOptions {
    pub max_step_rounds: u8,
    /// Consecutive non-improving passes before giving up.
    pub patience: usize,
    /// Also try swapping neighbouring steps.
    pub allow_reorder: bool,
}

impl Default for StepRoundOptions {
    fn default() -> Self {
        Self {
            max_step_rounds: 4,
            patience: 2,
            allow_reorder: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StepRoundOutcome {
    pub start_score: Option<f64>,
    pub best: Option<EvaluatedCandidate>,
    pub accepted_moves: usize,
    pub passes: usize,
    pub message: String,
}

impl StepRoundOutcome {
    pub fn status(&self) -> OperationStatus {
        match self.best {
            Some(_) => OperationStatus::ok(self.message.clone()),
            None => OperationStatus::failed(self.message.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepMove {
    Raise { step: usize, by: u8 },
    Swap { step: usize },
}

impl StepMove {
    fn apply(self, seq: &CandidateSequence, max: u8) -> Option<CandidateSequence> {
        let mut next = seq.clone();
        match self {
            StepMove::Raise { step, by } => {
                let s = next.steps.get_mut(step)?;
                let raised = s.rounds_per_step.checked_add(by)?;
                if raised > max {
                    return None;
                }
                s.rounds_per_step = raised;
            }
            StepMove::Swap { step } => {
                if step + 1 >= next.steps.len() || next.steps[step] == next.steps[step + 1] {
                    return None;
                }
                next.steps.swap(step, step + 1);
            }
        }
        Some(next)
    }
}

/// Moves tried in one pass. Raises grow with the number of failed passes so a
/// stalled search reaches further before stopping; rounds only ever go up.
fn pass_moves(
    current: &CandidateSequence,
    options: &StepRoundOptions,
    stalled: usize,
) -> Vec<CandidateSequence> {
    let by = (stalled + 1).min(u8::MAX as usize) as u8;
    let mut moves: Vec<StepMove> = (0..current.len())
        .map(|step| StepMove::Raise { step, by })
        .collect();
    if options.allow_reorder && stalled == 0 {
        moves.extend((0..current.len().saturating_sub(1)).map(|step| StepMove::Swap { step }));
    }
    moves
        .into_iter()
        .filter_map(|m| m.apply(current, options.max_step_rounds))
        .collect()
}

/// Shared "best so far" for one pass. Workers offer their candidates as they
/// finish; only a strictly higher score (or an equal score from an earlier move
/// index) replaces the holder, so the winner does not depend on which worker
/// reports first.
struct BestSlot {
    floor: f64,
    inner: Mutex<Option<(f64, usize, EvaluatedCandidate)>>,
}

impl BestSlot {
    fn new(floor: f64) -> Self {
        Self {
            floor,
            inner: Mutex::new(None),
        }
    }

    fn offer(&self, index: usize, outcome: &CandidateOutcome) {
        let CandidateOutcome::Evaluated(candidate) = outcome else {
            return;
        };
        if candidate.score <= self.floor {
            return;
        }
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let replace = match guard.as_ref() {
            None => true,
            Some((score, idx, _)) => {
                candidate.score > *score || (candidate.score == *score && index < *idx)
            }
        };
        if replace {
            *guard = Some((candidate.score, index, candidate.clone()));
        }
    }

    fn take(self) -> Option<EvaluatedCandidate> {
        let inner = match self.inner.into_inner() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.map(|(_, _, c)| c)
    }
}

/// Hill-climbs per-step round counts (and optionally neighbour order),
/// accepting a move only on strict improvement. Single-threaded baseline.
pub fn tune_step_rounds(
    session: &mut Session,
    start: &CandidateSequence,
    options: &StepRoundOptions,
    sink: &mut dyn ReportSink,
) -> StepRoundOutcome {
    tune_with(session, start, options, sink, "Per-Step Round Tuning", |s, batch, best| {
        batch
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let outcome = s.score_candidate(c);
                best.offer(i, &outcome);
                outcome
            })
            .collect()
    })
}

/// Same search as [`tune_step_rounds`] with each pass scored on `threads` workers.
/// Converges to the same answer as the single-threaded run.
pub fn tune_step_rounds_parallel(
    session: &mut Session,
    start: &CandidateSequence,
    options: &StepRoundOptions,
    threads: usize,
    sink: &mut dyn ReportSink,
) -> StepRoundOutcome {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
    {
        Ok(p) => p,
        Err(e) => {
            warn!("Could not build worker pool ({}), tuning single-threaded", e);
            return tune_step_rounds(session, start, options, sink);
        }
    };

    let title = "Per-Step Round Tuning (parallel)";
    tune_with(session, start, options, sink, title, |s, batch, best| {
        pool.install(|| {
            batch
                .par_iter()
                .enumerate()
                .map(|(i, c)| {
                    let outcome = s.score_candidate(c);
                    best.offer(i, &outcome);
                    outcome
                })
                .collect()
        })
    })
}

fn tune_with<F>(
    session: &mut Session,
    start: &CandidateSequence,
    options: &StepRoundOptions,
    sink: &mut dyn ReportSink,
    title: &str,
    score_batch: F,
) -> StepRoundOutcome
where
    F: Fn(&Session, &[CandidateSequence], &BestSlot) -> Vec<CandidateOutcome>,
{
    let mut outcome = StepRoundOutcome::default();

    let mut current = match session.evaluate(start) {
        CandidateOutcome::Evaluated(c) => c,
        CandidateOutcome::Rejected { reason, .. } => {
            outcome.message = format!("{}: starting sequence rejected ({})", title, reason);
            sink.section(title, vec![outcome.message.clone()]);
            return outcome;
        }
    };
    outcome.start_score = Some(current.score);

    let mut stalled = 0usize;
    let mut lines = vec![format!("start {} score={:.4}", current.sequence, current.score)];

    while stalled < options.patience.max(1) {
        let batch = pass_moves(&current.sequence, options, stalled);
        if batch.is_empty() {
            break;
        }
        outcome.passes += 1;

        let best = BestSlot::new(current.score);
        let results = score_batch(&*session, &batch, &best);

        for r in &results {
            if let CandidateOutcome::Evaluated(c) = r {
                session.admit(c);
            }
        }

        match best.take() {
            Some(winner) => {
                lines.push(format!(
                    "pass {}: accepted {} score={:.4}",
                    outcome.passes, winner.sequence, winner.score
                ));
                current = winner;
                outcome.accepted_moves += 1;
                stalled = 0;
            }
            None => stalled += 1,
        }
    }

    outcome.message = format!(
        "{}: {} accepted moves over {} passes, best {:.4}",
        title, outcome.accepted_moves, outcome.passes, current.score
    );
    lines.push(outcome.message.clone());
    sink.section(title, lines);
    info!("{}", outcome.message);
    outcome.best = Some(current);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> CandidateSequence {
        CandidateSequence::uniform(&[1, 8, 10], 1, 1)
    }

    #[test]
    fn raises_grow_with_stalled_passes() {
        let opts = StepRoundOptions::default();
        let first = pass_moves(&start(), &opts, 0);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].steps[0].rounds_per_step, 2);

        let later = pass_moves(&start(), &opts, 2);
        assert_eq!(later[1].steps[1].rounds_per_step, 4);
    }

    #[test]
    fn raises_stop_at_the_cap() {
        let opts = StepRoundOptions {
            max_step_rounds: 2,
            ..Default::default()
        };
        assert!(pass_moves(&start(), &opts, 1).is_empty());
    }

    #[test]
    fn swaps_only_on_fresh_passes() {
        let opts = StepRoundOptions {
            allow_reorder: true,
            ..Default::default()
        };
        let fresh = pass_moves(&start(), &opts, 0);
        assert_eq!(fresh.len(), 3 + 2);
        assert_eq!(fresh[3].ids(), vec![8, 1, 10]);
        assert_eq!(pass_moves(&start(), &opts, 1).len(), 3);
    }

    fn scored(ids: &[u8], score: f64) -> CandidateOutcome {
        CandidateOutcome::Evaluated(EvaluatedCandidate {
            sequence: CandidateSequence::uniform(ids, 1, 1),
            score,
            results: Vec::new(),
        })
    }

    #[test]
    fn best_slot_ignores_arrival_order() {
        let slot = BestSlot::new(10.0);
        slot.offer(3, &scored(&[3], 20.0));
        slot.offer(0, &scored(&[0], 5.0));
        slot.offer(1, &scored(&[1], 20.0));
        slot.offer(2, &scored(&[2], 20.0));
        slot.offer(
            4,
            &CandidateOutcome::Rejected {
                sequence: CandidateSequence::uniform(&[4], 1, 1),
                reason: "not reversible".to_string(),
            },
        );
        assert_eq!(slot.take().unwrap().sequence.ids(), vec![1]);
    }

    #[test]
    fn best_slot_needs_strict_improvement_over_floor() {
        let slot = BestSlot::new(20.0);
        slot.offer(0, &scored(&[0], 20.0));
        assert!(slot.take().is_none());
    }
}
