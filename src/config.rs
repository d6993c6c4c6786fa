use crate::consts::{
    DEFAULT_PASSWORD, DEFAULT_STABILITY_TOLERANCE, DEFAULT_TUNING_PATIENCE, DEFAULT_WEIGHT_FLOOR,
    MINI_SEARCH_MAX_LEN,
};
use crate::error::{CfResult, CipherForgeError};
use crate::scoring::ScoringMode;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub search: SearchParams,
    #[command(flatten)]
    pub tuning: TuningParams,
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[arg(long, default_value_t = 1)]
    pub global_rounds: u32,
    #[arg(long, default_value_t = 1)]
    pub rounds_per_step: u8,
    #[arg(long, default_value_t = MINI_SEARCH_MAX_LEN)]
    pub max_sequence_len: usize,
    #[arg(long, default_value_t = 9)]
    pub max_global_rounds: u32,
    #[arg(long, default_value_t = 4)]
    pub max_step_rounds: u8,

    // Contender pool
    #[arg(long, default_value_t = 20)]
    pub desired_contenders: usize,
    #[arg(long, default_value_t = 6)]
    pub pass_count_threshold: usize,

    #[arg(long, value_enum, default_value_t = ScoringMode::PracticalPassRatio)]
    pub scoring_mode: ScoringMode,

    #[arg(long, default_value = DEFAULT_PASSWORD)]
    pub password: String,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            global_rounds: 1,
            rounds_per_step: 1,
            max_sequence_len: MINI_SEARCH_MAX_LEN,
            max_global_rounds: 9,
            max_step_rounds: 4,
            desired_contenders: 20,
            pass_count_threshold: 6,
            scoring_mode: ScoringMode::PracticalPassRatio,
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningParams {
    #[arg(long, default_value_t = DEFAULT_TUNING_PATIENCE)]
    pub tuning_patience: usize,
    #[arg(long, default_value_t = DEFAULT_WEIGHT_FLOOR)]
    pub weight_floor: f64,
    #[arg(long, default_value = "0.01,0.02,0.05")]
    pub step_magnitudes: String,
    #[arg(long, default_value_t = DEFAULT_STABILITY_TOLERANCE)]
    pub stability_tolerance: f64,
    /// Distinct sequences taken from the top of the seed log.
    #[arg(long, default_value_t = 10)]
    pub seed_top_n: usize,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            tuning_patience: DEFAULT_TUNING_PATIENCE,
            weight_floor: DEFAULT_WEIGHT_FLOOR,
            step_magnitudes: "0.01,0.02,0.05".to_string(),
            stability_tolerance: DEFAULT_STABILITY_TOLERANCE,
            seed_top_n: 10,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CfResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CfResult<()> {
        if self.search.global_rounds == 0 {
            return Err(CipherForgeError::Config(
                "global_rounds must be at least 1".to_string(),
            ));
        }
        if self.search.rounds_per_step == 0 {
            return Err(CipherForgeError::Config(
                "rounds_per_step must be at least 1".to_string(),
            ));
        }
        if self.search.max_sequence_len == 0 {
            return Err(CipherForgeError::Config(
                "max_sequence_len must be at least 1".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.tuning.weight_floor) {
            return Err(CipherForgeError::Config(format!(
                "weight_floor {} must lie in [0, 1)",
                self.tuning.weight_floor
            )));
        }
        self.tuning.get_step_magnitudes()?;
        Ok(())
    }

    /// Copies every value the user typed on the command line over `self`.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($section:ident, $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$section.$field = cli.$section.$field.clone();
                }
            };
        }

        update_if_present!(search, global_rounds);
        update_if_present!(search, rounds_per_step);
        update_if_present!(search, max_sequence_len);
        update_if_present!(search, max_global_rounds);
        update_if_present!(search, max_step_rounds);
        update_if_present!(search, desired_contenders);
        update_if_present!(search, pass_count_threshold);
        update_if_present!(search, scoring_mode);
        update_if_present!(search, password);

        update_if_present!(tuning, tuning_patience);
        update_if_present!(tuning, weight_floor);
        update_if_present!(tuning, step_magnitudes);
        update_if_present!(tuning, stability_tolerance);
        update_if_present!(tuning, seed_top_n);
    }
}

impl TuningParams {
    pub fn get_step_magnitudes(&self) -> CfResult<Vec<f64>> {
        let mut steps = Vec::new();
        for part in self.step_magnitudes.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let value: f64 = part.parse().map_err(|_| {
                CipherForgeError::Config(format!("Invalid number '{}' in step_magnitudes", part))
            })?;
            if !(value > 0.0 && value < 1.0) {
                return Err(CipherForgeError::Config(format!(
                    "Step magnitude {} must lie in (0, 1)",
                    value
                )));
            }
            steps.push(value);
        }
        if steps.is_empty() {
            return Err(CipherForgeError::Config(
                "step_magnitudes requires at least one value".to_string(),
            ));
        }
        Ok(steps)
    }
}
