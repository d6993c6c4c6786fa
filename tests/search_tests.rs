mod common;

use cipherforge::error::CipherForgeError;
use cipherforge::metrics::{Metric, MetricOutcome, MetricRegistry};
use cipherforge::report::MemorySink;
use cipherforge::search::{best_fit_search, mini_search, BestFitOptions};
use cipherforge::transform::builtin::BuiltinTransform::*;
use common::{constant_registry, default_session, id, seq, session_with, test_config};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_mini_search_enumerates_multisets() {
    let mut session = default_session();
    let pool = [id(XorKey), id(Sbox), id(ChainMix)];
    let outcome = mini_search(&mut session, &pool, 2, None);

    // 3 singletons + 6 pairs with repetition.
    assert_eq!(outcome.evaluated_count(), 9);
    assert!(outcome.rejected.is_empty());
    assert!(outcome.status().success);

    let best = outcome.best.as_ref().unwrap();
    assert_eq!(best.score, outcome.ranked[0].score);
    for pair in outcome.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn test_mini_search_rejects_lossy_candidates() {
    let mut session = default_session();
    let outcome = mini_search(&mut session, &[id(XorKey), id(MaskLowBit)], 2, None);

    // xor, mask, xor+xor, xor+mask, mask+mask: everything touching mask fails.
    assert_eq!(outcome.evaluated_count(), 2);
    assert_eq!(outcome.rejected.len(), 3);
    for c in &outcome.ranked {
        assert!(!c.sequence.ids().contains(&id(MaskLowBit)));
    }
    for c in session.pool.contenders() {
        assert!(!c.sequence.ids().contains(&id(MaskLowBit)));
    }
}

#[test]
fn test_non_finite_scores_are_rejected_not_ranked() {
    // Every other evaluation comes back NaN; the rest climb so the best is unique.
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let flaky = Metric::custom("flaky", 0.6, 0.0, 50.0, move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        let score = if n % 2 == 1 { f64::NAN } else { 40.0 + n as f64 };
        MetricOutcome {
            score,
            passed: score >= 50.0,
            notes: None,
        }
    });
    let steady = Metric::custom("steady", 0.4, 0.0, 50.0, |_| MetricOutcome {
        score: 60.0,
        passed: true,
        notes: None,
    });
    let registry = MetricRegistry::from_metrics(vec![flaky, steady]).unwrap();
    let mut session = session_with(registry, test_config());

    let pool = [id(XorKey), id(Sbox), id(ChainMix), id(Reverse)];
    let outcome = mini_search(&mut session, &pool, 2, None);

    // 4 singletons + 10 pairs, half of them NaN.
    assert_eq!(calls.load(Ordering::SeqCst), 14);
    assert_eq!(outcome.evaluated_count(), 7);
    assert_eq!(outcome.rejected.len(), 7);
    for (_, reason) in &outcome.rejected {
        assert!(reason.contains("non-finite"), "{}", reason);
    }
    assert!(outcome.ranked.iter().all(|c| c.score.is_finite()));
    assert_eq!(outcome.best_score(), Some(outcome.ranked[0].score));

    assert!(session
        .pool
        .contenders()
        .iter()
        .all(|c| c.aggregate_score.is_finite()));
    assert_eq!(
        session.pool.best().unwrap().sequence,
        outcome.best.as_ref().unwrap().sequence
    );
}

#[test]
fn test_mini_search_skips_inverse_only_and_unknown_ids() {
    let mut session = default_session();
    let outcome = mini_search(&mut session, &[id(SubKey), id(InvSbox), 99], 3, None);
    assert!(outcome.best.is_none());
    assert!(!outcome.status().success);
    assert!(outcome.message.contains("no transforms available"));
}

#[test]
fn test_previous_best_is_explored_first() {
    // Constant metrics: every candidate ties, so the first evaluated stays best.
    let mut session = session_with(constant_registry(60.0), test_config());
    let previous = seq(&[(Reverse, 2), (AddKey, 1)], 5);
    let outcome = mini_search(&mut session, &[id(XorKey), id(Sbox)], 2, Some(&previous));

    let best = outcome.best.as_ref().unwrap();
    assert_eq!(best.sequence.ids(), previous.ids());
    assert_eq!(best.sequence.steps, previous.steps);
    // Re-run under the active global rounds, not the ones it was found with.
    assert_eq!(best.sequence.global_rounds, session.settings.global_rounds);
    assert_eq!(outcome.evaluated_count(), 1 + 2 + 3);
}

#[test]
fn test_best_fit_covers_every_distinct_ordering() {
    let mut session = default_session();
    let mut sink = MemorySink::new();

    let outcome = best_fit_search(
        &mut session,
        &[id(XorKey), id(Sbox), id(ChainMix)],
        &BestFitOptions::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(outcome.evaluated_count(), 6);

    let outcome = best_fit_search(
        &mut session,
        &[id(XorKey), id(XorKey), id(Sbox)],
        &BestFitOptions::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(outcome.evaluated_count(), 3);

    let section = sink.find("Best-Fit Search").unwrap();
    assert!(section.lines.iter().any(|l| l.starts_with("Best score")));
}

#[test]
fn test_best_fit_carries_per_step_rounds_and_restores_settings() {
    let mut session = default_session();
    let before = session.settings.clone();
    let options = BestFitOptions {
        step_rounds: Some(vec![2, 1]),
        global_rounds: Some(3),
    };
    let outcome = best_fit_search(
        &mut session,
        &[id(AddKey), id(RotlBits)],
        &options,
        &mut MemorySink::new(),
    )
    .unwrap();

    assert_eq!(outcome.evaluated_count(), 2);
    for c in &outcome.ranked {
        assert_eq!(c.sequence.global_rounds, 3);
        for step in &c.sequence.steps {
            let expected = if step.id == id(AddKey) { 2 } else { 1 };
            assert_eq!(step.rounds_per_step, expected);
        }
    }
    assert_eq!(session.settings, before);
}

#[test]
fn test_best_fit_input_validation() {
    let mut session = default_session();
    let mut sink = MemorySink::new();

    let empty = best_fit_search(&mut session, &[], &BestFitOptions::default(), &mut sink).unwrap();
    assert!(!empty.status().success);

    let too_many = [id(XorKey); 9];
    assert!(matches!(
        best_fit_search(&mut session, &too_many, &BestFitOptions::default(), &mut sink),
        Err(CipherForgeError::Validation(_))
    ));

    let mismatched = BestFitOptions {
        step_rounds: Some(vec![1]),
        global_rounds: None,
    };
    assert!(matches!(
        best_fit_search(&mut session, &[id(XorKey), id(Sbox)], &mismatched, &mut sink),
        Err(CipherForgeError::Validation(_))
    ));
}

#[test]
fn test_scoring_a_candidate_is_repeatable() {
    let session = default_session();
    let chain = seq(&[(Sbox, 1), (ChainMix, 2)], 2);
    let a = session.score_candidate(&chain).evaluated().unwrap();
    let b = session.score_candidate(&chain).evaluated().unwrap();
    assert_eq!(a.score.to_bits(), b.score.to_bits());
    assert_eq!(a.results, b.results);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_only_reversible_candidates_reach_the_pool(
        picks in proptest::collection::vec(0usize..8, 1..4),
    ) {
        let mut session = session_with(MetricRegistry::with_defaults(), test_config());
        let permutable = session.engine().registry().permutable_ids();
        let pool: Vec<u8> = picks.iter().map(|&i| permutable[i]).collect();

        let outcome = mini_search(&mut session, &pool, 2, None);
        for c in &outcome.ranked {
            prop_assert!(!c.sequence.ids().contains(&id(MaskLowBit)));
        }

        let engine = session.engine();
        for c in session.pool.contenders() {
            let ct = engine
                .encrypt(
                    &c.sequence.steps,
                    c.sequence.global_rounds,
                    session.key(),
                    session.input(),
                )
                .unwrap();
            prop_assert_eq!(engine.decrypt(session.key(), &ct).unwrap(), session.input().to_vec());
        }
    }
}
