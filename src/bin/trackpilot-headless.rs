use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trackpilot::config::{self, SimConfig};
use trackpilot::evaluator::PopulationEvaluator;
use trackpilot::evolution::Population;
use trackpilot::reporting::GenerationSummary;
use trackpilot::save_load::{self, Checkpoint};
use trackpilot::stats::FitnessHistory;
use trackpilot::track;

/// Evolve car policies without a window, as fast as the CPU allows.
#[derive(Parser, Debug)]
#[command(name = "trackpilot-headless")]
struct Cli {
    /// Track image; black pixels are walls. A noise ring is generated when omitted.
    #[arg(long)]
    track: Option<PathBuf>,
    /// JSON file overriding simulation constants.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seeds both the population and the generated track.
    #[arg(long, default_value_t = 42)]
    seed: u64,
    #[arg(long, default_value_t = config::POPULATION_SIZE)]
    population: usize,
    #[arg(long, default_value_t = 50)]
    generations: u32,
    /// Override the per-generation tick budget.
    #[arg(long)]
    ticks: Option<u32>,
    /// Write a checkpoint here after every generation.
    #[arg(long)]
    checkpoint: Option<PathBuf>,
    /// Continue from an earlier checkpoint.
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Append one JSON summary line per generation.
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut sim_config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(ticks) = cli.ticks {
        sim_config.tick_budget = ticks;
    }
    let (mask, _image) = track::load_or_generate(cli.track.as_deref(), cli.seed, &mut sim_config)
        .context("failed to prepare track")?;

    let (mut population, generation) = match &cli.resume {
        Some(path) => {
            let checkpoint = save_load::load_from_file(path)
                .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
            info!(generation = checkpoint.generation, path = %path.display(), "resuming");
            (checkpoint.population, checkpoint.generation)
        }
        None => (Population::random(cli.population, cli.seed), 0),
    };

    let mut evaluator = PopulationEvaluator::with_generation(sim_config, generation)
        .context("invalid simulation config")?;
    let mut history = FitnessHistory::new(cli.generations as usize);

    for _ in 0..cli.generations {
        let nets = population.networks();
        let report = evaluator
            .run_generation(&mask, Population::policies(&nets))
            .context("track does not fit the simulation config")?;
        history.record(&report);

        let summary = GenerationSummary::from_report(&report);
        info!(
            generation = summary.generation,
            ticks = summary.ticks,
            finish = ?summary.finish,
            survivors = summary.survivors,
            best = summary.fitness.max,
            mean = summary.fitness.mean,
            "generation complete"
        );
        if let Some(path) = &cli.summary {
            save_load::append_summary(&summary, path)
                .with_context(|| format!("failed to write summary {}", path.display()))?;
        }

        population.evolve(&report);
        if let Some(path) = &cli.checkpoint {
            let checkpoint = Checkpoint::new(evaluator.generation(), population.clone());
            save_load::save_to_file(&checkpoint, path)
                .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        }
    }

    info!(
        generations = history.best.len(),
        best_ever = history.best.max().unwrap_or(0.0),
        "run finished"
    );
    Ok(())
}
