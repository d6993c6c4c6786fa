use cipherforge::analysis::{metric_averages, pass_count, run_analysis, AnalysisResult};
use cipherforge::error::CipherForgeError;
use cipherforge::metrics::{Metric, MetricKind, MetricOutcome, MetricRegistry};
use cipherforge::scoring::{aggregate_score, weighted_sum, ScoringMode};
use cipherforge::weights::{RankingRule, WeightConfig};
use rstest::rstest;

fn result(name: &str, score: f64, passed: bool) -> AnalysisResult {
    AnalysisResult {
        name: name.to_string(),
        score,
        passed,
        notes: None,
    }
}

#[test]
fn test_default_catalog_is_normalized_and_strictly_ranked() {
    let registry = MetricRegistry::with_defaults();
    assert_eq!(registry.len(), 9);

    let cfg = registry.current_config();
    assert!(cfg.is_normalized());

    let names: Vec<&str> = registry.metrics().iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names[0], "entropy");
    assert_eq!(names[8], "periodicity");

    // All weights differ, so every unordered pair yields one rule.
    assert_eq!(RankingRule::derive_all(&cfg).len(), 9 * 8 / 2);
}

#[test]
fn test_analysis_yields_one_result_per_metric_in_order() {
    let registry = MetricRegistry::with_defaults();
    let payload: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
    let results = run_analysis(&registry, &payload, &payload, &payload, b"plain text");

    assert_eq!(results.len(), registry.len());
    for (r, m) in results.iter().zip(registry.metrics()) {
        assert_eq!(r.name, m.name);
        assert!((0.0..=100.0).contains(&r.score), "{} = {}", r.name, r.score);
        assert_eq!(r.passed, r.score >= m.threshold);
    }
}

#[rstest]
#[case(MetricKind::Entropy, true)]
#[case(MetricKind::Avalanche, false)]
#[case(MetricKind::KeyDependency, false)]
#[case(MetricKind::Periodicity, false)]
fn test_builtin_verdicts_on_uniform_counter(#[case] kind: MetricKind, #[case] expected: bool) {
    // A repeating 0..=255 counter has perfect entropy, but identical perturbed
    // payloads mean zero diffusion and every 4-byte window repeats.
    let payload: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
    let registry = MetricRegistry::from_metrics(vec![Metric::builtin(kind)]).unwrap();
    let results = run_analysis(&registry, &payload, &payload, &payload, &payload);
    assert_eq!(results[0].passed, expected, "{:?}", results[0]);
}

#[test]
fn test_custom_metrics_are_normalized_on_registration() {
    let metric = |name: &str, weight: f64| {
        Metric::custom(name, weight, 0.0, 1.0, |_| MetricOutcome {
            score: 1.0,
            passed: true,
            notes: None,
        })
    };
    let registry =
        MetricRegistry::from_metrics(vec![metric("a", 2.0), metric("b", 1.0), metric("c", 1.0)])
            .unwrap();
    let cfg = registry.current_config();
    assert!((cfg.get("a").unwrap() - 0.5).abs() < 1e-12);
    assert!((cfg.get("b").unwrap() - 0.25).abs() < 1e-12);

    let dup = MetricRegistry::from_metrics(vec![metric("a", 1.0), metric("a", 1.0)]);
    assert!(matches!(dup, Err(CipherForgeError::Validation(_))));
}

#[test]
fn test_apply_rejects_mismatched_config() {
    let mut registry = MetricRegistry::with_defaults();
    let partial = WeightConfig::from_pairs([("entropy", 1.0)]);
    assert!(matches!(
        registry.apply(&partial),
        Err(CipherForgeError::InvariantViolation(_))
    ));

    let mut renamed = registry.current_config().sorted_desc();
    renamed[0].0 = "not-a-metric".to_string();
    assert!(matches!(
        registry.apply(&WeightConfig::from_pairs(renamed)),
        Err(CipherForgeError::InvariantViolation(_))
    ));
    assert!(registry.current_config().is_normalized());
}

#[test]
fn test_metric_averages_across_runs() {
    let run_a = vec![result("x", 10.0, true), result("y", 0.0, false)];
    let run_b = vec![result("x", 20.0, true), result("y", 4.0, false)];
    let avgs = metric_averages([run_a.as_slice(), run_b.as_slice()]);
    assert_eq!(avgs["x"], 15.0);
    assert_eq!(avgs["y"], 2.0);
    assert_eq!(pass_count(&run_a), 1);
}

#[test]
fn test_scoring_is_deterministic_in_both_modes() {
    let weights = WeightConfig::from_pairs([("x", 0.7), ("y", 0.3)]);
    let results = vec![result("x", 91.3, true), result("y", 12.7, false)];

    for mode in [ScoringMode::MetricWeighted, ScoringMode::PracticalPassRatio] {
        let first = aggregate_score(&results, &weights, mode);
        let second = aggregate_score(&results, &weights, mode);
        assert_eq!(first.to_bits(), second.to_bits());
    }
    assert_eq!(results[0].score, 91.3);
}

#[test]
fn test_metric_weighted_is_the_weighted_sum() {
    let weights = WeightConfig::from_pairs([("x", 0.75), ("y", 0.25)]);
    let results = vec![result("x", 80.0, true), result("y", 40.0, false)];
    let score = aggregate_score(&results, &weights, ScoringMode::MetricWeighted);
    assert!((score - 70.0).abs() < 1e-12);
    assert_eq!(score, weighted_sum(&results, &weights));
}

#[test]
fn test_pass_ratio_dominates_weighted_sum() {
    let weights = WeightConfig::from_pairs([("x", 0.9), ("y", 0.1)]);
    // Strong on the heavy metric but only one pass...
    let strong = vec![result("x", 100.0, true), result("y", 0.0, false)];
    // ...loses to two bare passes.
    let broad = vec![result("x", 1.0, true), result("y", 1.0, true)];

    let s = aggregate_score(&strong, &weights, ScoringMode::PracticalPassRatio);
    let b = aggregate_score(&broad, &weights, ScoringMode::PracticalPassRatio);
    assert!(b > s, "{} vs {}", b, s);
    assert!(s >= 50.0 && s < 51.0);

    // Same pass count: the weighted sum breaks the tie.
    let weaker = vec![result("x", 50.0, true), result("y", 0.0, false)];
    let w = aggregate_score(&weaker, &weights, ScoringMode::PracticalPassRatio);
    assert!(s > w);
}

#[test]
fn test_empty_results_score_zero() {
    let weights = WeightConfig::default();
    assert_eq!(aggregate_score(&[], &weights, ScoringMode::MetricWeighted), 0.0);
    assert_eq!(aggregate_score(&[], &weights, ScoringMode::PracticalPassRatio), 0.0);
}
