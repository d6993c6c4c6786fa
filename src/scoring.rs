use crate::analysis::{pass_count, AnalysisResult};
use crate::consts::{MAX_QUALITY, PRACTICAL_TIEBREAK_SCALE};
use crate::weights::WeightConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScoringMode {
    /// Weighted sum of metric scores.
    MetricWeighted,
    /// Share of passing metrics, weighted sum only breaks ties.
    PracticalPassRatio,
}

/// Sum of `score * weight`. Results without a weight contribute nothing.
pub fn weighted_sum(results: &[AnalysisResult], weights: &WeightConfig) -> f64 {
    results
        .iter()
        .map(|r| r.score * weights.get(&r.name).unwrap_or(0.0))
        .sum()
}

/// Reduces one analysis run to a scalar. Pure: no side effects, no hidden state.
///
/// `PracticalPassRatio` yields `100 * passed / total` plus a tie-break term strictly
/// below 1.0, so one extra passing metric always outranks any weighted-sum gain
/// for catalogs of up to 100 metrics.
pub fn aggregate_score(
    results: &[AnalysisResult],
    weights: &WeightConfig,
    mode: ScoringMode,
) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let weighted = weighted_sum(results, weights);
    match mode {
        ScoringMode::MetricWeighted => weighted,
        ScoringMode::PracticalPassRatio => {
            let ratio = pass_count(results) as f64 / results.len() as f64;
            let tiebreak = weighted.clamp(0.0, MAX_QUALITY) * PRACTICAL_TIEBREAK_SCALE;
            ratio * MAX_QUALITY + tiebreak
        }
    }
}
