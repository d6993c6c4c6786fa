use crate::analysis::metric_averages;
use crate::config::Config;
use crate::error::{CfResult, CipherForgeError, OperationStatus};
use crate::report::ReportSink;
use crate::search::{mini_search, SearchOutcome};
use crate::sequence::CandidateSequence;
use crate::session::Session;
use crate::weights::{RankingRule, WeightConfig};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

#[derive(Debug, Clone, TypedBuilder)]
pub struct TunerOptions {
    #[builder(default = vec![0.01, 0.02, 0.05])]
    pub step_magnitudes: Vec<f64>,
    #[builder(default = crate::consts::DEFAULT_WEIGHT_FLOOR)]
    pub weight_floor: f64,
    /// Consecutive rejected variations before the tuner stops.
    #[builder(default = crate::consts::DEFAULT_TUNING_PATIENCE)]
    pub patience: usize,
    /// Largest relative drop of any metric average that still counts as stable.
    #[builder(default = crate::consts::DEFAULT_STABILITY_TOLERANCE)]
    pub stability_tolerance: f64,
    #[builder(default = crate::consts::MINI_SEARCH_MAX_LEN)]
    pub max_sequence_len: usize,
}

impl TunerOptions {
    pub fn from_config(cfg: &Config) -> CfResult<Self> {
        Ok(Self {
            step_magnitudes: cfg.tuning.get_step_magnitudes()?,
            weight_floor: cfg.tuning.weight_floor,
            patience: cfg.tuning.tuning_patience,
            stability_tolerance: cfg.tuning.stability_tolerance,
            max_sequence_len: cfg.search.max_sequence_len,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightVariation {
    pub metric: String,
    pub delta: f64,
    pub config: WeightConfig,
}

/// One raised and one lowered vector per metric and step size, renormalized.
///
/// Variations that would go negative, fall under the floor or break a ranking
/// rule are dropped here and never reach evaluation. Duplicates are collapsed.
pub fn generate_variations(
    current: &WeightConfig,
    rules: &[RankingRule],
    options: &TunerOptions,
) -> CfResult<Vec<WeightVariation>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for (metric, _) in current.iter() {
        for &step in &options.step_magnitudes {
            for delta in [step, -step] {
                let config = match current.adjusted(metric, delta) {
                    Ok(c) => c,
                    Err(_) => continue,
                };
                if config.min_weight() < options.weight_floor {
                    continue;
                }
                if !RankingRule::all_hold(rules, &config)? {
                    continue;
                }
                if seen.insert(config.signature()) {
                    out.push(WeightVariation {
                        metric: metric.clone(),
                        delta,
                        config,
                    });
                }
            }
        }
    }
    Ok(out)
}

/// A candidate run is stable when no metric that was at or above its threshold
/// fell below it, and no metric average dropped by more than `tolerance` of its
/// previous value.
pub fn check_stability(
    previous: &BTreeMap<String, f64>,
    current: &BTreeMap<String, f64>,
    thresholds: &BTreeMap<String, f64>,
    tolerance: f64,
) -> Result<(), String> {
    for (name, &before) in previous {
        let Some(&after) = current.get(name) else {
            return Err(format!("metric '{}' missing from new run", name));
        };
        if let Some(&threshold) = thresholds.get(name) {
            if before >= threshold && after < threshold {
                return Err(format!(
                    "{} fell below threshold ({:.3} -> {:.3}, threshold {:.3})",
                    name, before, after, threshold
                ));
            }
        }
        if before > 0.0 && after < before * (1.0 - tolerance) {
            return Err(format!(
                "{} dropped more than {:.0}% ({:.3} -> {:.3})",
                name,
                tolerance * 100.0,
                before,
                after
            ));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TuningOutcome {
    pub best_weights: WeightConfig,
    pub best_score: Option<f64>,
    pub best_sequence: Option<CandidateSequence>,
    pub baseline_score: Option<f64>,
    /// Running best after the start and after every acceptance. Non-decreasing.
    pub score_history: Vec<f64>,
    pub accepted_configs: Vec<WeightConfig>,
    /// Signature of every variation evaluated, in order. Never repeats.
    pub tried_signatures: Vec<String>,
    /// Why each rejected variation lost, as `metric+delta: reason`.
    pub rejections: Vec<String>,
    pub accepted: usize,
    pub tested: usize,
    pub blacklisted: usize,
    pub message: String,
}

impl TuningOutcome {
    pub fn status(&self) -> OperationStatus {
        match self.best_score {
            Some(_) => OperationStatus::ok(self.message.clone()),
            None => OperationStatus::failed(self.message.clone()),
        }
    }
}

fn run_averages(run: &SearchOutcome) -> BTreeMap<String, f64> {
    metric_averages(run.ranked.iter().map(|c| c.results.as_slice()))
}

pub struct WeightTuner {
    options: TunerOptions,
}

impl WeightTuner {
    pub fn new(options: TunerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TunerOptions {
        &self.options
    }

    /// Hill-climbs the registry's weight vector. On return the registry holds the
    /// best weights found, which may be the ones it started with.
    pub fn run(
        &self,
        session: &mut Session,
        transform_pool: &[u8],
        sink: &mut dyn ReportSink,
    ) -> CfResult<TuningOutcome> {
        let opts = &self.options;
        let mut scope = session.scoped();

        let baseline = scope.registry.current_config();
        let rules = RankingRule::derive_all(&baseline);
        let thresholds = scope.registry.thresholds();
        info!(
            "Weight tuner: {} metrics, {} ranking rules, pool {:?}",
            baseline.len(),
            rules.len(),
            transform_pool
        );

        let mut outcome = TuningOutcome {
            best_weights: baseline.clone(),
            ..Default::default()
        };

        scope.pool.initialize();
        let start = mini_search(&mut scope, transform_pool, opts.max_sequence_len, None);
        let Some(start_best) = start.best.clone() else {
            outcome.message = format!("Weight tuning aborted: {}", start.message);
            warn!("{}", outcome.message);
            sink.section("Weight Tuning", vec![outcome.message.clone()]);
            return Ok(outcome);
        };

        let mut best_score = start_best.score;
        let mut best_sequence = start_best.sequence;
        let mut best_averages = run_averages(&start);
        outcome.baseline_score = Some(best_score);
        outcome.score_history.push(best_score);
        info!("Weight tuner: starting score {:.4}", best_score);

        // Rejected signatures are blacklisted; accepted ones are never re-run either.
        let mut tried: HashSet<String> = HashSet::new();
        tried.insert(baseline.signature());
        let mut stalled = 0usize;

        'tuning: loop {
            let current = outcome.best_weights.clone();
            if !RankingRule::all_hold(&rules, &current)? {
                return Err(CipherForgeError::InvariantViolation(
                    "Accepted weight vector violates a ranking rule".to_string(),
                ));
            }

            let variations: Vec<WeightVariation> = generate_variations(&current, &rules, opts)?
                .into_iter()
                .filter(|v| !tried.contains(&v.config.signature()))
                .collect();
            if variations.is_empty() {
                debug!("Weight tuner: no untested variations left");
                break;
            }

            for variation in variations {
                let signature = variation.config.signature();
                tried.insert(signature.clone());
                outcome.tried_signatures.push(signature);
                outcome.tested += 1;
                scope.registry.apply(&variation.config)?;
                scope.pool.initialize();
                let run = mini_search(
                    &mut scope,
                    transform_pool,
                    opts.max_sequence_len,
                    Some(&best_sequence),
                );

                let verdict = match &run.best {
                    None => Err(run.message.clone()),
                    Some(b) if b.score <= best_score => Err(format!(
                        "score {:.4} does not beat {:.4}",
                        b.score, best_score
                    )),
                    Some(b) => {
                        let averages = run_averages(&run);
                        check_stability(
                            &best_averages,
                            &averages,
                            &thresholds,
                            opts.stability_tolerance,
                        )
                        .map(|_| (b.clone(), averages))
                    }
                };

                match verdict {
                    Ok((winner, averages)) => {
                        info!(
                            "Weight tuner: accepted {}{:+.3} -> {:.4}",
                            variation.metric, variation.delta, winner.score
                        );
                        best_score = winner.score;
                        best_sequence = winner.sequence;
                        best_averages = averages;
                        outcome.best_weights = variation.config.clone();
                        outcome.accepted_configs.push(variation.config.clone());
                        outcome.score_history.push(best_score);
                        outcome.accepted += 1;
                        scope.set_restore_weights(variation.config);
                        stalled = 0;
                        continue 'tuning;
                    }
                    Err(reason) => {
                        let note =
                            format!("{}{:+.3}: {}", variation.metric, variation.delta, reason);
                        debug!("Weight tuner: rejected {}", note);
                        outcome.rejections.push(note);
                        outcome.blacklisted += 1;
                        stalled += 1;
                        if stalled >= opts.patience.max(1) {
                            break 'tuning;
                        }
                    }
                }
            }
            break;
        }

        scope.registry.apply(&outcome.best_weights)?;
        scope.pool.initialize();

        outcome.best_score = Some(best_score);
        outcome.best_sequence = Some(best_sequence);
        outcome.message = format!(
            "Weight tuning: {} accepted of {} tested, best {:.4} (start {:.4})",
            outcome.accepted,
            outcome.tested,
            best_score,
            outcome.baseline_score.unwrap_or(best_score)
        );

        let mut lines = vec![outcome.message.clone()];
        if let Some(seq) = &outcome.best_sequence {
            lines.push(format!("Best sequence: {}", seq.describe(scope.engine().registry())));
        }
        lines.extend(
            outcome
                .best_weights
                .sorted_desc()
                .into_iter()
                .map(|(name, w)| format!("{:<20} {:.4}", name, w)),
        );
        sink.section("Weight Tuning", lines);
        info!("{}", outcome.message);
        Ok(outcome)
    }
}
