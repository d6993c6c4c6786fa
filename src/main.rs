use cipherforge::config::Config;
use cipherforge::consts::DEFAULT_SAMPLE_INPUT;
use cipherforge::session::{Session, SessionBuildParams};
use cipherforge::transform::builtin::ReferenceEngine;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Plaintext sample to encrypt; a built-in text is used when absent.
    #[arg(global = true, short, long)]
    input: Option<PathBuf>,

    /// JSON settings file. Flags typed on the command line win over it.
    #[arg(global = true, long = "config")]
    config_file: Option<PathBuf>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Search(cmd::search::SearchArgs),
    BestFit(cmd::best_fit::BestFitArgs),
    Rounds(cmd::rounds::RoundsArgs),
    StepRounds(cmd::step_rounds::StepRoundsArgs),
    Tune(cmd::tune::TuneArgs),
    Bench(cmd::bench::BenchArgs),
    Metrics(cmd::metrics::MetricsArgs),
}

impl Commands {
    fn config(&self) -> &Config {
        match self {
            Commands::Search(a) => &a.config,
            Commands::BestFit(a) => &a.config,
            Commands::Rounds(a) => &a.config,
            Commands::StepRounds(a) => &a.config,
            Commands::Tune(a) => &a.config,
            Commands::Bench(a) => &a.config,
            Commands::Metrics(a) => &a.config,
        }
    }
}

fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();
    } else {
        tracing_subscriber::fmt::init();
    }
}

fn build_session(cli: &Cli, config: Config) -> Session {
    let input = match &cli.input {
        Some(path) => {
            info!("📂 Loading input: {}", path.display());
            fs::read(path).unwrap_or_else(|e| {
                error!("❌ Could not read input '{}': {}", path.display(), e);
                process::exit(1);
            })
        }
        None => {
            warn!("⚠️  No input file given. Using the built-in sample.");
            DEFAULT_SAMPLE_INPUT.to_vec()
        }
    };

    SessionBuildParams::builder()
        .engine(Arc::new(ReferenceEngine::new()))
        .config(config)
        .input(input)
        .build()
        .build_session()
        .unwrap_or_else(|e| {
            error!("❌ FATAL ERROR INITIALIZING SESSION: {}", e);
            process::exit(1);
        })
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    init_tracing(cli.debug);
    info!("🚀 Initializing CipherForge...");

    // Subcommand flags live in the subcommand's matches, not the root.
    let Some((_, sub_matches)) = matches.subcommand() else {
        error!("No subcommand given");
        process::exit(2);
    };

    let cli_config = cli.command.config().clone();
    let config = match &cli.config_file {
        Some(path) => {
            info!("⚖️  Loading settings from: {}", path.display());
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("❌ {}", e);
                process::exit(1);
            });
            file_config.merge_from_cli(&cli_config, sub_matches);
            file_config
        }
        None => cli_config,
    };

    let session = build_session(&cli, config.clone());

    let status = match &cli.command {
        Commands::Search(args) => cmd::search::run(args, &config, session),
        Commands::BestFit(args) => cmd::best_fit::run(args, session),
        Commands::Rounds(args) => cmd::rounds::run(args, &config, session),
        Commands::StepRounds(args) => cmd::step_rounds::run(args, &config, session),
        Commands::Tune(args) => cmd::tune::run(args, &config, session),
        Commands::Bench(args) => cmd::bench::run(args, &session),
        Commands::Metrics(_) => cmd::metrics::run(&session),
    };

    match status {
        Ok(s) if s.success => info!("✅ {}", s.message),
        Ok(s) => {
            warn!("⚠️  {}", s.message);
            process::exit(1);
        }
        Err(e) => {
            error!("❌ {}", e);
            process::exit(1);
        }
    }
}
