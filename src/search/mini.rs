use super::{run_candidates, SearchOutcome};
use crate::consts::MINI_SEARCH_MAX_LEN;
use crate::sequence::CandidateSequence;
use crate::session::Session;
use itertools::Itertools;
use tracing::info;

/// Builds every multiset of 1..=`max_len` transforms drawn (with repetition) from
/// `transform_pool` and evaluates them with the session's uniform round counts.
///
/// `previous_best`, when given, is evaluated first so a known-good chain anchors
/// the running best.
pub fn mini_search(
    session: &mut Session,
    transform_pool: &[u8],
    max_len: usize,
    previous_best: Option<&CandidateSequence>,
) -> SearchOutcome {
    let registry = session.engine().registry();
    let ids: Vec<u8> = transform_pool
        .iter()
        .copied()
        .filter(|&id| {
            registry
                .get(id)
                .is_some_and(|t| !t.exclude_from_permutations)
        })
        .unique()
        .collect();

    if ids.is_empty() {
        return SearchOutcome::empty("Mini search: no transforms available");
    }

    let max_len = max_len.clamp(1, MINI_SEARCH_MAX_LEN);
    let rounds = session.settings.rounds_per_step;
    let global_rounds = session.settings.global_rounds;

    let mut candidates = Vec::new();
    if let Some(prev) = previous_best {
        if !prev.is_empty() {
            candidates.push(CandidateSequence::new(prev.steps.clone(), global_rounds));
        }
    }
    for len in 1..=max_len {
        for combo in ids.iter().copied().combinations_with_replacement(len) {
            let candidate = CandidateSequence::uniform(&combo, rounds, global_rounds);
            if candidates.first() != Some(&candidate) {
                candidates.push(candidate);
            }
        }
    }

    info!(
        "Mini search: {} transforms, up to {} steps, {} candidates",
        ids.len(),
        max_len,
        candidates.len()
    );
    run_candidates(session, candidates, "Mini search")
}
