use crate::consts::WEIGHT_SUM_EPSILON;
use crate::error::{CfResult, CipherForgeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metric name -> weight. Kept normalized to sum 1.0 after every adjustment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightConfig {
    weights: BTreeMap<String, f64>,
}

impl WeightConfig {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            weights: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.weights.iter()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_EPSILON
    }

    pub fn min_weight(&self) -> f64 {
        self.weights.values().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn normalize(&mut self) -> CfResult<()> {
        let sum = self.sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(CipherForgeError::Validation(format!(
                "Cannot normalize weights summing to {}",
                sum
            )));
        }
        for w in self.weights.values_mut() {
            *w /= sum;
        }
        Ok(())
    }

    /// Copy with one metric's weight shifted by `delta`, renormalized.
    pub fn adjusted(&self, name: &str, delta: f64) -> CfResult<WeightConfig> {
        let mut next = self.clone();
        let w = next.weights.get_mut(name).ok_or_else(|| {
            CipherForgeError::Validation(format!("Unknown metric '{}' in weight config", name))
        })?;
        *w += delta;
        if *w < 0.0 {
            return Err(CipherForgeError::Validation(format!(
                "Weight for '{}' would become negative",
                name
            )));
        }
        next.normalize()?;
        Ok(next)
    }

    /// Stable identity of the vector, used to blacklist rejected variations.
    pub fn signature(&self) -> String {
        self.weights
            .iter()
            .map(|(k, v)| format!("{}={:.6}", k, v))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Entries sorted by weight, heaviest first; ties by name.
    pub fn sorted_desc(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> =
            self.weights.iter().map(|(k, &v)| (k.clone(), v)).collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries
    }
}

/// `higher` must keep a strictly larger weight than `lower` for a whole tuning session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRule {
    pub higher: String,
    pub lower: String,
}

impl RankingRule {
    /// One rule per ordered pair with strictly different baseline weights.
    pub fn derive_all(baseline: &WeightConfig) -> Vec<RankingRule> {
        let mut rules = Vec::new();
        for (a, &wa) in baseline.iter() {
            for (b, &wb) in baseline.iter() {
                if wa > wb {
                    rules.push(RankingRule {
                        higher: a.clone(),
                        lower: b.clone(),
                    });
                }
            }
        }
        rules
    }

    /// Errors when either metric is missing: the session has lost sync with the registry.
    pub fn holds(&self, config: &WeightConfig) -> CfResult<bool> {
        let high = config.get(&self.higher).ok_or_else(|| missing(&self.higher))?;
        let low = config.get(&self.lower).ok_or_else(|| missing(&self.lower))?;
        Ok(high > low)
    }

    pub fn all_hold(rules: &[RankingRule], config: &WeightConfig) -> CfResult<bool> {
        for rule in rules {
            if !rule.holds(config)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn missing(name: &str) -> CipherForgeError {
    CipherForgeError::InvariantViolation(format!(
        "Ranking rule references metric '{}' absent from the weight vector",
        name
    ))
}
