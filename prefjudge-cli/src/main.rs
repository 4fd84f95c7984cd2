mod config;
mod output;
mod parse;
mod simulate;
mod state;

use clap::Parser;
use prefjudge_core::constants::{DEFAULT_DEPTH, DEFAULT_FIRST_STAGE, DEFAULT_PAIRINGS};
use prefjudge_core::{TopicJudge, TopicParams};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use crate::config::PrefjudgeConfig;
use crate::state::JudgingState;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "prefjudge", version, about = "Manage top-k preference judging")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (default: ~/.config/prefjudge/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// RNG seed for request generation and simulation
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Load an initial qrels file and create the judging state
    Initialize(InitializeArgs),
    /// Add judgments
    Add(AddArgs),
    /// Print outstanding judgment requests
    Requests(StateArgs),
    /// Produce preferences in qrels format
    Prefs(StateArgs),
    /// Dump original qrels
    Qrels(StateArgs),
    /// Dump initial candidate pool as qrels
    Candidates(StateArgs),
    /// Dump current candidate pool as qrels
    Pool(StateArgs),
    /// Dump log of judged pairs
    Log(StateArgs),
    /// Summarize judging progress per topic
    Status(StateArgs),
    /// Simulate judging with recorded or random preferences
    Simulate(SimulateArgs),
    /// Create a default config file at ~/.config/prefjudge/config.toml
    InitConfig,
}

#[derive(clap::Args)]
struct StateArgs {
    /// Judging state file
    state: PathBuf,
}

#[derive(clap::Args)]
struct DepthArgs {
    /// Depth of top documents required
    #[arg(long)]
    k: Option<usize>,

    /// First stage pairings per document
    #[arg(long)]
    p: Option<usize>,

    /// First stage pooling threshold
    #[arg(long)]
    f: Option<usize>,
}

#[derive(clap::Args)]
struct InitializeArgs {
    /// Judging state file to create
    state: PathBuf,

    /// TREC-style qrels
    qrels: PathBuf,

    #[command(flatten)]
    depth: DepthArgs,
}

#[derive(clap::Args)]
struct AddArgs {
    /// Judging state file
    state: PathBuf,

    /// Preference judgments, one `topic a b [winner]` per line
    judgments: PathBuf,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// TREC-style qrels
    qrels: PathBuf,

    /// Recorded preferences used to answer requests
    prefs: PathBuf,

    #[command(flatten)]
    depth: DepthArgs,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}

fn read_input(path: &Path) -> String {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| bail(format!("Failed to read {}: {e}", path.display())))
}

fn load_state(path: &Path) -> JudgingState {
    JudgingState::load(path).unwrap_or_else(|e| bail(e))
}

fn save_state(state: &JudgingState, path: &Path) {
    state.save(path).unwrap_or_else(|e| bail(e));
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Resolve k/p/f: CLI flag > config file > built-in default, then clamp.
fn resolve_params(args: &DepthArgs, cfg: &PrefjudgeConfig) -> TopicParams {
    let k = args.k.or(cfg.k).unwrap_or(DEFAULT_DEPTH);
    let p = args.p.or(cfg.p).unwrap_or(DEFAULT_PAIRINGS);
    let f = args.f.or(cfg.f).unwrap_or(DEFAULT_FIRST_STAGE);
    TopicParams::new(k, p, f)
}

/// A closed stdout ends a listing quietly; any other write error is fatal.
fn finish_output(result: io::Result<()>) {
    if let Err(e) = result {
        if e.kind() != io::ErrorKind::BrokenPipe {
            bail(format!("Failed to write output: {e}"));
        }
    }
}

/// Run a writer over every topic.
fn dump_each(
    state: &JudgingState,
    mut f: impl FnMut(&mut io::StdoutLock<'static>, &TopicJudge) -> io::Result<()>,
) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = state
        .topics
        .values()
        .try_for_each(|judge| f(&mut out, judge))
        .and_then(|_| out.flush());
    finish_output(result);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .or_else(config::config_path)
        .unwrap_or_else(|| bail("HOME is not set; pass --config"));

    if let Commands::InitConfig = cli.command {
        config::create_default_config(&config_path).unwrap_or_else(|e| bail(e));
        println!("Created config at {}", config_path.display());
        println!("Edit it to set your default k, p, f, and seed.");
        return;
    }

    let cfg = config::load_config(&config_path).unwrap_or_else(|e| bail(e));
    let mut rng = make_rng(cli.seed.or(cfg.seed));

    match cli.command {
        Commands::Initialize(args) => {
            let params = resolve_params(&args.depth, &cfg);
            let qrels = parse::load_qrels(&read_input(&args.qrels), &args.qrels.display().to_string());
            let mut state = JudgingState::default();
            for (topic, grades) in qrels {
                let judge = TopicJudge::new(topic.clone(), grades, params);
                info!(%topic, candidates = judge.candidates().len(), "initialized topic");
                state.topics.insert(topic, judge);
            }
            save_state(&state, &args.state);
        }
        Commands::Add(args) => {
            let judgments =
                parse::load_judgments(&read_input(&args.judgments), &args.judgments.display().to_string());
            let mut state = load_state(&args.state);
            for (topic, batch) in judgments {
                match state.topics.get_mut(&topic) {
                    Some(judge) => {
                        let outcome = judge.add(batch, &mut rng);
                        info!(
                            %topic,
                            accepted = outcome.accepted,
                            rejected = outcome.rejected.len(),
                            outstanding = judge.outstanding().len(),
                            "added judgments"
                        );
                    }
                    None => warn!(%topic, "unknown topic"),
                }
            }
            save_state(&state, &args.state);
        }
        Commands::Requests(args) => {
            let mut state = load_state(&args.state);
            let mut out = io::stdout().lock();
            let result = output::write_all_requests(&mut out, state.topics.values_mut(), &mut rng);
            drop(out);
            save_state(&state, &args.state);
            finish_output(result);
        }
        Commands::Prefs(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_prefs(out, judge))
        }
        Commands::Qrels(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_qrels(out, judge))
        }
        Commands::Candidates(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_candidates(out, judge))
        }
        Commands::Pool(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_pool(out, judge))
        }
        Commands::Log(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_log(out, judge))
        }
        Commands::Status(args) => {
            dump_each(&load_state(&args.state), |out, judge| output::write_status(out, judge))
        }
        Commands::Simulate(args) => {
            let params = resolve_params(&args.depth, &cfg);
            let qrels = parse::load_qrels(&read_input(&args.qrels), &args.qrels.display().to_string());
            let votes = parse::load_votes(&read_input(&args.prefs), &args.prefs.display().to_string());

            let mut total = 0;
            let mut sims = JudgingState::default();
            for (topic, grades) in qrels {
                let judge = simulate::simulate_topic(&topic, grades, votes.get(&topic), params, &mut rng);
                total += judge.log().len();
                sims.topics.insert(topic, judge);
            }
            dump_each(&sims, |out, judge| output::write_log(out, judge));
            info!(total, "simulated judgments");
        }
        Commands::InitConfig => unreachable!("handled before config load"),
    }
}
