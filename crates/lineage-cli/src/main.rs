//! `lineage` command line tool
//!
//! Loads an execution snapshot, runs the removal planner once and prints the
//! actionable plan. Nothing is removed.

mod output;

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use lineage_discovery::{DiscoveryMode, BUILTIN_STRATEGIES};
use lineage_planner::{IterativeRemovalPlanner, PlannerConfig, SnapshotRepository};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("lineage")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan removal of orphaned plugin executions from workflow history")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("plan")
                .about("Compute the removal plan for a snapshot")
                .arg(
                    Arg::new("snapshot")
                        .long("snapshot")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON execution snapshot"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML planner configuration"),
                )
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .value_parser(DiscoveryMode::ALL.map(DiscoveryMode::as_str))
                        .help("Override the configured discovery mode"),
                )
                .arg(
                    Arg::new("parallel")
                        .long("parallel")
                        .action(ArgAction::SetTrue)
                        .help("Process datasets of one iteration in parallel"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(Command::new("strategies").about("List built-in identification strategies"))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn planner_config(args: &ArgMatches) -> anyhow::Result<PlannerConfig> {
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(mode) = args.get_one::<String>("mode") {
        config.mode = DiscoveryMode::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == mode)
            .with_context(|| format!("unknown discovery mode {mode}"))?;
    }
    if args.get_flag("parallel") {
        config.parallel = true;
    }
    Ok(config)
}

async fn run_plan(args: &ArgMatches) -> anyhow::Result<()> {
    let config = planner_config(args)?;
    tracing::debug!(?config, "planner configuration");
    let snapshot_path = args
        .get_one::<PathBuf>("snapshot")
        .context("--snapshot is required")?;
    let repository = SnapshotRepository::load(snapshot_path)
        .await
        .with_context(|| format!("loading snapshot {}", snapshot_path.display()))?;

    let planner = IterativeRemovalPlanner::from_config(&config);
    let report = planner.plan_report(&repository).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.get_flag("json") {
        serde_json::to_writer_pretty(&mut out, &report)?;
        std::io::Write::write_all(&mut out, b"\n")?;
    } else {
        output::write_text(&mut out, &config, &report)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("plan", args)) => run_plan(args).await,
        Some(("strategies", _)) => {
            let stdout = std::io::stdout();
            output::write_strategies(&mut stdout.lock(), &BUILTIN_STRATEGIES)?;
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}
