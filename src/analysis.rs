use crate::metrics::{MetricRegistry, SampleSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub score: f64,
    pub passed: bool,
    pub notes: Option<String>,
}

/// Runs every registered metric once, in registry order.
pub fn run_analysis(
    registry: &MetricRegistry,
    payload: &[u8],
    avalanche: &[u8],
    key_dependency: &[u8],
    original: &[u8],
) -> Vec<AnalysisResult> {
    let samples = SampleSet {
        payload,
        avalanche,
        key_dependency,
        original,
    };

    registry
        .metrics()
        .iter()
        .map(|metric| {
            let outcome = metric.evaluate(&samples);
            AnalysisResult {
                name: metric.name.clone(),
                score: outcome.score,
                passed: outcome.passed,
                notes: outcome.notes,
            }
        })
        .collect()
}

pub fn pass_count(results: &[AnalysisResult]) -> usize {
    results.iter().filter(|r| r.passed).count()
}

/// Per-metric mean score across several analysis runs.
pub fn metric_averages<'a, I>(runs: I) -> BTreeMap<String, f64>
where
    I: IntoIterator<Item = &'a [AnalysisResult]>,
{
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for run in runs {
        for r in run {
            let entry = sums.entry(r.name.clone()).or_insert((0.0, 0));
            entry.0 += r.score;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(name, (sum, n))| (name, sum / n as f64))
        .collect()
}
