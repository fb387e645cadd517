//! Information Flow Simulation
//!
//! Runs one seeded scenario and prints a summary of how belief and trust
//! moved.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use infoflow_core::{InfoFlowModel, ScenarioConfig, SimError};
use infoflow_events::SourceType;

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "infoflow")]
#[command(about = "Agent-based simulation of information flow and trust")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of steps to simulate
    #[arg(long, default_value_t = 100)]
    steps: u64,

    /// Scenario file (TOML, or JSON by extension); defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write per-step metrics as JSON lines
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Write per-citizen snapshots as JSON lines (enables agent tracking)
    #[arg(long)]
    snapshots_out: Option<PathBuf>,

    /// Print the default scenario as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let args = Args::parse();

    if args.print_default_config {
        return match ScenarioConfig::default().to_toml() {
            Ok(text) => {
                print!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Could not render default scenario: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let mut config = match &args.config {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading scenario");
            ScenarioConfig::from_file(path)?
        }
        None => ScenarioConfig::default(),
    };
    if args.snapshots_out.is_some() {
        config.track_agents = true;
    }

    let mut model = InfoFlowModel::create(&config, args.seed)?;
    model.run(args.steps)?;

    let summary = model.summary();
    tracing::info!(
        seed = summary.seed,
        steps = summary.steps,
        citizens = summary.num_citizens,
        media = summary.num_media,
        "Summary"
    );
    tracing::info!(
        initial = summary.initial.avg_belief,
        last = summary.last.avg_belief,
        shift = summary.belief_shift(),
        polarization = summary.last.polarization,
        clusters = summary.last.opinion_clusters,
        "Belief"
    );
    for source in SourceType::ALL {
        tracing::info!(
            source = %source,
            initial = summary.initial.trust_in(source),
            last = summary.last.trust_in(source),
            shift = summary.trust_shift(source),
            "Trust"
        );
    }
    if let Some(alignment) = summary.last.truth_alignment {
        tracing::info!(alignment, "Truth alignment");
    }

    if let Some(path) = &args.metrics_out {
        model.write_metrics(path)?;
        tracing::info!(path = %path.display(), records = model.metrics().len(), "Wrote metrics");
    }
    if let Some(path) = &args.snapshots_out {
        model.write_snapshots(path)?;
        tracing::info!(
            path = %path.display(),
            records = model.citizen_snapshots().len(),
            "Wrote citizen snapshots"
        );
    }

    Ok(())
}
