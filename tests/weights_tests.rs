use cipherforge::error::CipherForgeError;
use cipherforge::metrics::MetricRegistry;
use cipherforge::tuner::{check_stability, generate_variations, TunerOptions};
use cipherforge::weights::{RankingRule, WeightConfig};
use proptest::prelude::*;
use rstest::rstest;
use std::collections::BTreeMap;

fn baseline() -> WeightConfig {
    MetricRegistry::with_defaults().current_config()
}

#[test]
fn test_adjusted_renormalizes() {
    let cfg = baseline().adjusted("entropy", 0.05).unwrap();
    assert!(cfg.is_normalized());
    assert!(cfg.get("entropy").unwrap() > 0.20);

    assert!(matches!(
        baseline().adjusted("periodicity", -0.5),
        Err(CipherForgeError::Validation(_))
    ));
    assert!(matches!(
        baseline().adjusted("unknown", 0.1),
        Err(CipherForgeError::Validation(_))
    ));
}

#[test]
fn test_rule_with_missing_metric_is_fatal() {
    let rule = RankingRule {
        higher: "entropy".to_string(),
        lower: "ghost".to_string(),
    };
    assert!(matches!(
        rule.holds(&baseline()),
        Err(CipherForgeError::InvariantViolation(_))
    ));
}

#[test]
fn test_signature_identifies_vector() {
    let a = baseline();
    let b = baseline().adjusted("runs", 0.01).unwrap();
    assert_ne!(a.signature(), b.signature());
    assert_eq!(a.signature(), baseline().signature());
}

#[test]
fn test_variations_respect_rules_and_floor() {
    let base = baseline();
    let rules = RankingRule::derive_all(&base);
    let opts = TunerOptions::builder().weight_floor(0.02).build();
    let variations = generate_variations(&base, &rules, &opts).unwrap();

    assert!(!variations.is_empty());
    for v in &variations {
        assert!(v.config.is_normalized());
        assert!(v.config.min_weight() >= 0.02);
        assert!(RankingRule::all_hold(&rules, &v.config).unwrap());
    }
    // Lowering entropy by 0.05 would drop it under avalanche.
    assert!(!variations
        .iter()
        .any(|v| v.metric == "entropy" && v.delta == -0.05));
}

fn avgs(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[rstest]
#[case(&[("a", 80.0)], &[("a", 79.0)], true)] // small drop, still above threshold
#[case(&[("a", 80.0)], &[("a", 70.0)], false)] // dropped more than 5%
#[case(&[("a", 51.0)], &[("a", 49.5)], false)] // crossed below threshold
#[case(&[("a", 40.0)], &[("a", 39.0)], true)] // was already failing, small drop
#[case(&[("a", 40.0)], &[], false)] // metric vanished
fn test_stability_check(
    #[case] before: &[(&str, f64)],
    #[case] after: &[(&str, f64)],
    #[case] stable: bool,
) {
    let thresholds = avgs(&[("a", 50.0)]);
    let verdict = check_stability(&avgs(before), &avgs(after), &thresholds, 0.05);
    assert_eq!(verdict.is_ok(), stable, "{:?}", verdict);
}

proptest! {
    #[test]
    fn prop_adjustments_stay_normalized(
        idx in 0usize..9,
        delta in -0.03f64..0.5,
    ) {
        let base = baseline();
        let name = base.sorted_desc()[idx].0.clone();
        if let Ok(cfg) = base.adjusted(&name, delta) {
            prop_assert!((cfg.sum() - 1.0).abs() <= 1e-9);
        }
    }

    #[test]
    fn prop_generated_variations_preserve_ranking(
        idx in 0usize..9,
        nudge in 0.001f64..0.01,
    ) {
        // Start from a vector that is already a small move away from baseline.
        let base = baseline();
        let rules = RankingRule::derive_all(&base);
        let name = base.sorted_desc()[idx].0.clone();
        let start = base.adjusted(&name, nudge).unwrap();
        prop_assume!(RankingRule::all_hold(&rules, &start).unwrap());

        let opts = TunerOptions::builder().build();
        for v in generate_variations(&start, &rules, &opts).unwrap() {
            prop_assert!((v.config.sum() - 1.0).abs() <= 1e-9);
            for rule in &rules {
                let higher = v.config.get(&rule.higher).unwrap();
                prop_assert!(higher > v.config.get(&rule.lower).unwrap());
            }
        }
    }
}
