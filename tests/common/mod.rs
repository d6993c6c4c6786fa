#![allow(dead_code)]

use cipherforge::config::Config;
use cipherforge::consts::DEFAULT_SAMPLE_INPUT;
use cipherforge::metrics::{Metric, MetricOutcome, MetricRegistry};
use cipherforge::scoring::ScoringMode;
use cipherforge::sequence::{CandidateSequence, TransformStep};
use cipherforge::session::{Session, SessionBuildParams};
use cipherforge::transform::builtin::{BuiltinTransform, ReferenceEngine};
use std::sync::Arc;

pub fn id(t: BuiltinTransform) -> u8 {
    t.id()
}

pub fn sample_input() -> Vec<u8> {
    DEFAULT_SAMPLE_INPUT.to_vec()
}

/// Config with a small pass gate so the built-in catalog admits contenders.
pub fn test_config() -> Config {
    let mut cfg = Config::default();
    cfg.search.pass_count_threshold = 1;
    cfg.search.desired_contenders = 5;
    cfg
}

pub fn session_with(registry: MetricRegistry, config: Config) -> Session {
    SessionBuildParams::builder()
        .engine(Arc::new(ReferenceEngine::new()))
        .registry(registry)
        .config(config)
        .input(sample_input())
        .build()
        .build_session()
        .expect("session")
}

pub fn default_session() -> Session {
    session_with(MetricRegistry::with_defaults(), test_config())
}

pub fn weighted_session() -> Session {
    let mut cfg = test_config();
    cfg.search.scoring_mode = ScoringMode::MetricWeighted;
    session_with(MetricRegistry::with_defaults(), cfg)
}

/// Three metrics that always score the same, whatever the payload.
pub fn constant_registry(score: f64) -> MetricRegistry {
    let make = |name: &str, weight: f64| {
        Metric::custom(name, weight, 0.0, 50.0, move |_| MetricOutcome {
            score,
            passed: score >= 50.0,
            notes: None,
        })
    };
    MetricRegistry::from_metrics(vec![make("alpha", 0.5), make("beta", 0.3), make("gamma", 0.2)])
        .expect("registry")
}

pub fn seq(ids: &[(BuiltinTransform, u8)], global_rounds: u32) -> CandidateSequence {
    CandidateSequence::new(
        ids.iter()
            .map(|&(t, r)| TransformStep::new(t.id(), r))
            .collect(),
        global_rounds,
    )
}
