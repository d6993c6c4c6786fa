pub mod stats;

use crate::consts::MAX_QUALITY;
use crate::error::{CfResult, CipherForgeError};
use crate::weights::WeightConfig;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// The four buffers a metric may look at.
#[derive(Debug, Clone, Copy)]
pub struct SampleSet<'a> {
    pub payload: &'a [u8],
    pub avalanche: &'a [u8],
    pub key_dependency: &'a [u8],
    pub original: &'a [u8],
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub score: f64,
    pub passed: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum MetricKind {
    Entropy,
    Avalanche,
    KeyDependency,
    ChiSquare,
    BitFrequency,
    SerialCorrelation,
    Runs,
    InputCorrelation,
    Periodicity,
}

impl MetricKind {
    pub fn default_weight(self) -> f64 {
        match self {
            MetricKind::Entropy => 0.20,
            MetricKind::Avalanche => 0.18,
            MetricKind::KeyDependency => 0.16,
            MetricKind::ChiSquare => 0.12,
            MetricKind::BitFrequency => 0.10,
            MetricKind::SerialCorrelation => 0.09,
            MetricKind::Runs => 0.07,
            MetricKind::InputCorrelation => 0.05,
            MetricKind::Periodicity => 0.03,
        }
    }

    /// Ideal value of the raw statistic.
    pub fn baseline(self) -> f64 {
        match self {
            MetricKind::Entropy => 8.0,
            MetricKind::Avalanche | MetricKind::KeyDependency => 0.5,
            MetricKind::ChiSquare => 255.0,
            MetricKind::BitFrequency | MetricKind::Runs => 0.0,
            MetricKind::SerialCorrelation | MetricKind::InputCorrelation => 0.0,
            MetricKind::Periodicity => 0.0,
        }
    }

    /// Minimum quality score counted as a pass.
    pub fn threshold(self) -> f64 {
        match self {
            MetricKind::Entropy => 90.0,
            MetricKind::Avalanche | MetricKind::KeyDependency => 80.0,
            MetricKind::ChiSquare | MetricKind::BitFrequency | MetricKind::Runs => 50.0,
            MetricKind::SerialCorrelation | MetricKind::InputCorrelation => 80.0,
            MetricKind::Periodicity => 90.0,
        }
    }

    /// Returns (raw statistic, quality in 0..=100).
    pub fn measure(self, s: &SampleSet<'_>) -> (f64, f64) {
        match self {
            MetricKind::Entropy => {
                let h = stats::shannon_entropy(s.payload);
                let max = stats::max_entropy_for_len(s.payload.len());
                let q = if max > 0.0 { h / max * MAX_QUALITY } else { 0.0 };
                (h, q)
            }
            MetricKind::Avalanche => diffusion(s.payload, s.avalanche),
            MetricKind::KeyDependency => diffusion(s.payload, s.key_dependency),
            MetricKind::ChiSquare => {
                let chi = stats::chi_square(s.payload);
                if s.payload.is_empty() {
                    return (chi, 0.0);
                }
                let z = (chi - 255.0).abs() / 510f64.sqrt();
                (chi, gaussian_quality(z))
            }
            MetricKind::BitFrequency => {
                let z = stats::monobit_z(s.payload);
                (z, gaussian_quality(z))
            }
            MetricKind::Runs => {
                let z = stats::runs_z(s.payload);
                (z, gaussian_quality(z))
            }
            MetricKind::SerialCorrelation => match stats::serial_correlation(s.payload) {
                Some(r) => (r, (1.0 - r.abs()) * MAX_QUALITY),
                None => (1.0, 0.0),
            },
            MetricKind::InputCorrelation => {
                if s.payload.len() < 2 {
                    return (1.0, 0.0);
                }
                match stats::pearson(s.original, s.payload) {
                    Some(r) => (r, (1.0 - r.abs()) * MAX_QUALITY),
                    // A constant original cannot correlate; a constant payload leaks everything.
                    None if stats::shannon_entropy(s.payload) > 0.0 => (0.0, MAX_QUALITY),
                    None => (1.0, 0.0),
                }
            }
            MetricKind::Periodicity => {
                let ratio = stats::repeated_window_ratio(s.payload);
                (ratio, (1.0 - ratio) * MAX_QUALITY)
            }
        }
    }
}

fn diffusion(payload: &[u8], perturbed: &[u8]) -> (f64, f64) {
    if payload.is_empty() || perturbed.is_empty() {
        return (0.0, 0.0);
    }
    let ratio = stats::bit_difference_ratio(payload, perturbed);
    let q = (1.0 - 2.0 * (ratio - 0.5).abs()) * MAX_QUALITY;
    (ratio, q.max(0.0))
}

#[inline(always)]
fn gaussian_quality(z: f64) -> f64 {
    if !z.is_finite() {
        return 0.0;
    }
    MAX_QUALITY * (-z * z / 8.0).exp()
}

pub type EvaluateFn = dyn Fn(&SampleSet<'_>) -> MetricOutcome + Send + Sync;

#[derive(Clone)]
pub enum Evaluator {
    Builtin(MetricKind),
    Custom(Arc<EvaluateFn>),
}

impl fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluator::Builtin(kind) => write!(f, "Builtin({})", kind),
            Evaluator::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub weight: f64,
    pub baseline: f64,
    pub threshold: f64,
    evaluator: Evaluator,
}

impl Metric {
    pub fn builtin(kind: MetricKind) -> Self {
        Self {
            name: kind.to_string(),
            weight: kind.default_weight(),
            baseline: kind.baseline(),
            threshold: kind.threshold(),
            evaluator: Evaluator::Builtin(kind),
        }
    }

    pub fn custom<F>(name: &str, weight: f64, baseline: f64, threshold: f64, evaluate: F) -> Self
    where
        F: Fn(&SampleSet<'_>) -> MetricOutcome + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            weight,
            baseline,
            threshold,
            evaluator: Evaluator::Custom(Arc::new(evaluate)),
        }
    }

    /// Builtins pass when quality reaches the threshold; custom evaluators decide themselves.
    pub fn evaluate(&self, samples: &SampleSet<'_>) -> MetricOutcome {
        match &self.evaluator {
            Evaluator::Builtin(kind) => {
                let (raw, quality) = kind.measure(samples);
                MetricOutcome {
                    score: quality,
                    passed: quality >= self.threshold,
                    notes: Some(format!("raw={:.4} ideal={:.4}", raw, self.baseline)),
                }
            }
            Evaluator::Custom(f) => f(samples),
        }
    }
}

/// Ordered catalog of metrics. Iteration order is registration order.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: Vec<Metric>,
}

impl MetricRegistry {
    pub fn with_defaults() -> Self {
        Self {
            metrics: MetricKind::iter().map(Metric::builtin).collect(),
        }
    }

    /// Builds a registry from arbitrary metrics; names must be unique.
    /// Weights are normalized to sum 1.0.
    pub fn from_metrics(metrics: Vec<Metric>) -> CfResult<Self> {
        let mut seen = HashSet::new();
        for m in &metrics {
            if !seen.insert(m.name.as_str()) {
                return Err(CipherForgeError::Validation(format!(
                    "Duplicate metric name '{}'",
                    m.name
                )));
            }
        }
        let mut registry = Self { metrics };
        let mut config = registry.current_config();
        config.normalize()?;
        registry.apply(&config)?;
        Ok(registry)
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn current_config(&self) -> WeightConfig {
        WeightConfig::from_pairs(self.metrics.iter().map(|m| (m.name.clone(), m.weight)))
    }

    pub fn thresholds(&self) -> BTreeMap<String, f64> {
        self.metrics
            .iter()
            .map(|m| (m.name.clone(), m.threshold))
            .collect()
    }

    /// Replaces every weight. The config must name exactly the registered metrics.
    pub fn apply(&mut self, config: &WeightConfig) -> CfResult<()> {
        if config.len() != self.metrics.len() {
            return Err(CipherForgeError::InvariantViolation(format!(
                "Weight config has {} entries, registry has {} metrics",
                config.len(),
                self.metrics.len()
            )));
        }
        let mut next = Vec::with_capacity(self.metrics.len());
        for m in &self.metrics {
            let w = config.get(&m.name).ok_or_else(|| {
                CipherForgeError::InvariantViolation(format!(
                    "Weight config is missing metric '{}'",
                    m.name
                ))
            })?;
            next.push(w);
        }
        for (m, w) in self.metrics.iter_mut().zip(next) {
            m.weight = w;
        }
        Ok(())
    }
}
