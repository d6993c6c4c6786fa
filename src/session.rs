use crate::analysis::{run_analysis, AnalysisResult};
use crate::config::Config;
use crate::error::CfResult;
use crate::metrics::MetricRegistry;
use crate::pool::ContenderPool;
use crate::scoring::{aggregate_score, ScoringMode};
use crate::sequence::CandidateSequence;
use crate::transform::builtin::BitFlipHarness;
use crate::transform::{CryptoEngine, Key, SensitivityHarness};
use crate::weights::WeightConfig;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Mutable knobs the search layers read, and occasionally write back.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub global_rounds: u32,
    pub rounds_per_step: u8,
    pub scoring_mode: ScoringMode,
    pub profile: String,
}

impl From<&Config> for SessionSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            global_rounds: cfg.search.global_rounds.max(1),
            rounds_per_step: cfg.search.rounds_per_step.max(1),
            scoring_mode: cfg.search.scoring_mode,
            profile: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EvaluatedCandidate {
    pub sequence: CandidateSequence,
    pub score: f64,
    pub results: Vec<AnalysisResult>,
}

#[derive(Debug, Clone)]
pub enum CandidateOutcome {
    /// Failed the round trip (or the engine refused it). Never scored.
    Rejected {
        sequence: CandidateSequence,
        reason: String,
    },
    Evaluated(EvaluatedCandidate),
}

impl CandidateOutcome {
    pub fn evaluated(self) -> Option<EvaluatedCandidate> {
        match self {
            CandidateOutcome::Evaluated(c) => Some(c),
            CandidateOutcome::Rejected { .. } => None,
        }
    }
}

#[derive(TypedBuilder)]
pub struct SessionBuildParams {
    pub engine: Arc<dyn CryptoEngine>,
    #[builder(default = Arc::new(BitFlipHarness) as Arc<dyn SensitivityHarness>)]
    pub harness: Arc<dyn SensitivityHarness>,
    #[builder(default = MetricRegistry::with_defaults())]
    pub registry: MetricRegistry,
    #[builder(default)]
    pub config: Config,
    pub input: Vec<u8>,
    #[builder(default = "default".to_string())]
    pub profile: String,
}

impl SessionBuildParams {
    pub fn build_session(self) -> CfResult<Session> {
        self.config.validate()?;
        let mut settings = SessionSettings::from(&self.config);
        settings.profile = self.profile;
        debug!(
            "Session: {} metrics, {} transforms, input {} bytes",
            self.registry.len(),
            self.engine.registry().len(),
            self.input.len()
        );
        Ok(Session {
            engine: self.engine,
            harness: self.harness,
            registry: self.registry,
            pool: ContenderPool::new(
                self.config.search.desired_contenders,
                self.config.search.pass_count_threshold,
            ),
            settings,
            key: Key::from_password(&self.config.search.password),
            input: self.input,
        })
    }
}

/// Process-scoped evaluation context. Owns the metric registry and contender
/// pool; never shared between concurrent sessions.
pub struct Session {
    engine: Arc<dyn CryptoEngine>,
    harness: Arc<dyn SensitivityHarness>,
    pub registry: MetricRegistry,
    pub pool: ContenderPool,
    pub settings: SessionSettings,
    key: Key,
    input: Vec<u8>,
}

impl Session {
    pub fn engine(&self) -> &dyn CryptoEngine {
        self.engine.as_ref()
    }

    pub fn input(&self) -> &[u8] {
        &self.input
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn set_input(&mut self, input: Vec<u8>) {
        self.input = input;
    }

    /// Encrypt, verify the round trip, analyze, score. Does not touch the pool.
    pub fn score_candidate(&self, sequence: &CandidateSequence) -> CandidateOutcome {
        let weights = self.registry.current_config();
        self.score_with(sequence, &weights)
    }

    pub(crate) fn score_with(
        &self,
        sequence: &CandidateSequence,
        weights: &WeightConfig,
    ) -> CandidateOutcome {
        let reject = |reason: String| {
            debug!("Rejected {}: {}", sequence, reason);
            CandidateOutcome::Rejected {
                sequence: sequence.clone(),
                reason,
            }
        };

        let ciphertext = match self.engine.encrypt(
            &sequence.steps,
            sequence.global_rounds,
            &self.key,
            &self.input,
        ) {
            Ok(ct) => ct,
            Err(e) => return reject(format!("encrypt failed: {}", e)),
        };

        match self.engine.decrypt(&self.key, &ciphertext) {
            Ok(plain) if plain == self.input => {}
            Ok(_) => return reject("not reversible".to_string()),
            Err(e) => return reject(format!("decrypt failed: {}", e)),
        }

        let samples = match self.harness.derive(
            self.engine.as_ref(),
            sequence,
            &self.input,
            &self.key,
            &self.settings.profile,
        ) {
            Ok(s) => s,
            Err(e) => return reject(format!("sensitivity samples failed: {}", e)),
        };

        let payload = self.engine.payload_only(&ciphertext);
        let results = run_analysis(
            &self.registry,
            payload,
            &samples.avalanche,
            &samples.key_dependency,
            &self.input,
        );
        let score = aggregate_score(&results, weights, self.settings.scoring_mode);
        if !score.is_finite() {
            return reject(format!("non-finite score ({})", score));
        }

        CandidateOutcome::Evaluated(EvaluatedCandidate {
            sequence: sequence.clone(),
            score,
            results,
        })
    }

    /// Offers an evaluated candidate to the contender pool.
    pub fn admit(&mut self, candidate: &EvaluatedCandidate) -> bool {
        let weights = self.registry.current_config();
        self.pool.record_if_qualifying(
            &candidate.results,
            &candidate.sequence,
            &weights,
            self.settings.scoring_mode,
        )
    }

    /// `score_candidate` followed by `admit` for survivors.
    pub fn evaluate(&mut self, sequence: &CandidateSequence) -> CandidateOutcome {
        let outcome = self.score_candidate(sequence);
        if let CandidateOutcome::Evaluated(candidate) = &outcome {
            self.admit(candidate);
        }
        outcome
    }

    /// Snapshots settings and weights; both are restored when the guard drops.
    pub fn scoped(&mut self) -> SessionScope<'_> {
        let saved_settings = self.settings.clone();
        let restore_weights = self.registry.current_config();
        SessionScope {
            session: self,
            saved_settings,
            restore_weights,
        }
    }
}

pub struct SessionScope<'s> {
    session: &'s mut Session,
    saved_settings: SessionSettings,
    restore_weights: WeightConfig,
}

impl SessionScope<'_> {
    /// Changes the weight vector re-applied on exit.
    pub fn set_restore_weights(&mut self, config: WeightConfig) {
        self.restore_weights = config;
    }

    pub fn restore_weights(&self) -> &WeightConfig {
        &self.restore_weights
    }
}

impl Deref for SessionScope<'_> {
    type Target = Session;

    fn deref(&self) -> &Session {
        self.session
    }
}

impl DerefMut for SessionScope<'_> {
    fn deref_mut(&mut self) -> &mut Session {
        self.session
    }
}

impl Drop for SessionScope<'_> {
    fn drop(&mut self) {
        self.session.settings = self.saved_settings.clone();
        if let Err(e) = self.session.registry.apply(&self.restore_weights) {
            warn!("Failed to restore metric weights on scope exit: {}", e);
        }
    }
}
