use crate::analysis::AnalysisResult;
use crate::transform::TransformRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One link of a candidate chain: a registered transform applied `rounds_per_step` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformStep {
    pub id: u8,
    pub rounds_per_step: u8,
}

impl TransformStep {
    pub fn new(id: u8, rounds_per_step: u8) -> Self {
        Self {
            id,
            rounds_per_step,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateSequence {
    pub steps: Vec<TransformStep>,
    pub global_rounds: u32,
}

impl CandidateSequence {
    pub fn new(steps: Vec<TransformStep>, global_rounds: u32) -> Self {
        Self {
            steps,
            global_rounds,
        }
    }

    /// Builds a sequence where every step shares the same round count.
    pub fn uniform(ids: &[u8], rounds_per_step: u8, global_rounds: u32) -> Self {
        Self {
            steps: ids
                .iter()
                .map(|&id| TransformStep::new(id, rounds_per_step))
                .collect(),
            global_rounds,
        }
    }

    pub fn ids(&self) -> Vec<u8> {
        self.steps.iter().map(|s| s.id).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Renders the chain with transform names, e.g. `xor-key(1) -> sbox(2) x3`.
    pub fn describe(&self, registry: &TransformRegistry) -> String {
        let chain = self
            .steps
            .iter()
            .map(|s| format!("{}({})", registry.name_of(s.id), s.rounds_per_step))
            .collect::<Vec<_>>()
            .join(" -> ");
        format!("{} x{}", chain, self.global_rounds)
    }
}

impl fmt::Display for CandidateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self
            .steps
            .iter()
            .map(|s| format!("{}:{}", s.id, s.rounds_per_step))
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{}] x{}", chain, self.global_rounds)
    }
}

/// A candidate that cleared the pass-count gate, owned by the contender pool.
#[derive(Debug, Clone)]
pub struct Contender {
    pub sequence: CandidateSequence,
    pub aggregate_score: f64,
    pub metrics: Vec<AnalysisResult>,
}

impl Contender {
    pub fn pass_count(&self) -> usize {
        self.metrics.iter().filter(|m| m.passed).count()
    }
}
