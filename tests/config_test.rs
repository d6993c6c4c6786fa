use cipherforge::config::Config;
use cipherforge::error::CipherForgeError;
use cipherforge::scoring::ScoringMode;
use clap::{CommandFactory, FromArgMatches, Parser};
use rstest::rstest;
use std::io::Write;

#[derive(Parser, Debug)]
struct TestCli {
    #[command(flatten)]
    config: Config,
}

#[test]
fn test_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.search.global_rounds, 1);
    assert_eq!(cfg.search.max_sequence_len, 4);
    assert_eq!(cfg.search.max_global_rounds, 9);
    assert_eq!(cfg.search.desired_contenders, 20);
    assert_eq!(cfg.search.scoring_mode, ScoringMode::PracticalPassRatio);
    assert_eq!(cfg.tuning.tuning_patience, 5);
    assert_eq!(cfg.tuning.get_step_magnitudes().unwrap(), vec![0.01, 0.02, 0.05]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_clap_defaults_match_serde_defaults() {
    let matches = TestCli::command().get_matches_from(["test"]);
    let cli = TestCli::from_arg_matches(&matches).unwrap();
    let d = Config::default();
    assert_eq!(cli.config.search.password, d.search.password);
    assert_eq!(cli.config.search.pass_count_threshold, d.search.pass_count_threshold);
    assert_eq!(cli.config.tuning.step_magnitudes, d.tuning.step_magnitudes);
    assert_eq!(cli.config.tuning.weight_floor, d.tuning.weight_floor);
}

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(
        f,
        r#"{{ "search": {{ "max_global_rounds": 5, "scoring_mode": "metric-weighted" }} }}"#
    )
    .unwrap();
    drop(f);

    let cfg = Config::load_from_file(&path).unwrap();
    assert_eq!(cfg.search.max_global_rounds, 5);
    assert_eq!(cfg.search.scoring_mode, ScoringMode::MetricWeighted);
    assert_eq!(cfg.search.global_rounds, 1);
    assert_eq!(cfg.tuning.seed_top_n, 10);
}

#[test]
fn test_cli_flags_override_file_values() {
    let matches = TestCli::command().get_matches_from([
        "test",
        "--global-rounds",
        "3",
        "--tuning-patience",
        "9",
    ]);
    let cli = TestCli::from_arg_matches(&matches).unwrap();

    let mut file = Config::default();
    file.search.global_rounds = 2;
    file.search.max_global_rounds = 7;
    file.tuning.tuning_patience = 1;
    file.merge_from_cli(&cli.config, &matches);

    assert_eq!(file.search.global_rounds, 3);
    assert_eq!(file.tuning.tuning_patience, 9);
    // Not typed on the command line, so the file value survives.
    assert_eq!(file.search.max_global_rounds, 7);
}

#[rstest]
#[case("0.01,0.02", true)]
#[case(" 0.5 ", true)]
#[case("", false)]
#[case("0.0", false)]
#[case("1.5", false)]
#[case("abc", false)]
fn test_step_magnitudes(#[case] raw: &str, #[case] ok: bool) {
    let mut cfg = Config::default();
    cfg.tuning.step_magnitudes = raw.to_string();
    assert_eq!(cfg.tuning.get_step_magnitudes().is_ok(), ok);
}

#[rstest]
#[case::zero_global(|c: &mut Config| c.search.global_rounds = 0)]
#[case::zero_step(|c: &mut Config| c.search.rounds_per_step = 0)]
#[case::zero_len(|c: &mut Config| c.search.max_sequence_len = 0)]
#[case::floor_too_high(|c: &mut Config| c.tuning.weight_floor = 1.0)]
fn test_invalid_configs(#[case] mutate: fn(&mut Config)) {
    let mut cfg = Config::default();
    mutate(&mut cfg);
    assert!(matches!(cfg.validate(), Err(CipherForgeError::Config(_))));
}

#[test]
fn test_malformed_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        Config::load_from_file(&path),
        Err(CipherForgeError::Json(_))
    ));
}
