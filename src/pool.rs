use crate::analysis::{pass_count, AnalysisResult};
use crate::consts::POOL_TRIM_FACTOR;
use crate::scoring::{aggregate_score, ScoringMode};
use crate::sequence::{CandidateSequence, Contender};
use crate::weights::WeightConfig;
use tracing::debug;

/// Score-ordered, capacity-bounded set of candidates that passed enough metrics.
#[derive(Debug, Clone)]
pub struct ContenderPool {
    desired: usize,
    pass_count_threshold: usize,
    contenders: Vec<Contender>,
}

impl ContenderPool {
    pub fn new(desired: usize, pass_count_threshold: usize) -> Self {
        Self {
            desired: desired.max(1),
            pass_count_threshold,
            contenders: Vec::new(),
        }
    }

    /// Drops all contenders. Called at the start of every independent session.
    pub fn initialize(&mut self) {
        self.contenders.clear();
    }

    pub fn desired(&self) -> usize {
        self.desired
    }

    pub fn pass_count_threshold(&self) -> usize {
        self.pass_count_threshold
    }

    /// Admits the candidate when enough metrics passed and its score is finite,
    /// scoring it under the caller's active mode. Trims only once the pool has grown past
    /// `POOL_TRIM_FACTOR` times its target.
    pub fn record_if_qualifying(
        &mut self,
        results: &[AnalysisResult],
        sequence: &CandidateSequence,
        weights: &WeightConfig,
        mode: ScoringMode,
    ) -> bool {
        let passes = pass_count(results);
        if passes < self.pass_count_threshold {
            debug!(
                "Pool: {} passed {}/{} (< {}), not admitted",
                sequence,
                passes,
                results.len(),
                self.pass_count_threshold
            );
            return false;
        }

        let aggregate_score = aggregate_score(results, weights, mode);
        if !aggregate_score.is_finite() {
            debug!("Pool: {} scored {}, not admitted", sequence, aggregate_score);
            return false;
        }
        self.contenders.push(Contender {
            sequence: sequence.clone(),
            aggregate_score,
            metrics: results.to_vec(),
        });

        if self.contenders.len() > self.desired * POOL_TRIM_FACTOR {
            self.trim(self.desired);
        }
        true
    }

    /// Sorts by aggregate score, best first, and keeps the top `n`.
    pub fn trim(&mut self, n: usize) {
        self.sort();
        self.contenders.truncate(n);
    }

    fn sort(&mut self) {
        self.contenders
            .sort_by(|a, b| b.aggregate_score.total_cmp(&a.aggregate_score));
    }

    /// Contenders ranked best first, at most `desired` of them.
    pub fn ranked(&self) -> Vec<Contender> {
        let mut view = self.contenders.clone();
        view.sort_by(|a, b| b.aggregate_score.total_cmp(&a.aggregate_score));
        view.truncate(self.desired);
        view
    }

    pub fn best(&self) -> Option<&Contender> {
        self.contenders
            .iter()
            .max_by(|a, b| a.aggregate_score.total_cmp(&b.aggregate_score))
    }

    pub fn contenders(&self) -> &[Contender] {
        &self.contenders
    }

    pub fn len(&self) -> usize {
        self.contenders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contenders.is_empty()
    }
}
