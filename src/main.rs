use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use macroquad::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trackpilot::config::{self, SimConfig};
use trackpilot::evaluator::{FinishReason, PopulationEvaluator};
use trackpilot::evolution::Population;
use trackpilot::save_load;
use trackpilot::stats::FitnessHistory;
use trackpilot::track;

mod renderer;

/// Watch a population of radar-guided cars evolve, one generation at a time.
#[derive(Parser, Debug)]
#[command(name = "trackpilot")]
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
    /// Ticks simulated per rendered frame.
    #[arg(long, default_value_t = 1)]
    fast: u32,
    /// Continue from a checkpoint written by the headless runner.
    #[arg(long)]
    resume: Option<PathBuf>,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "TrackPilot".to_string(),
        window_width: 1280,
        window_height: 720,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut sim_config = match &cli.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimConfig::default(),
    };
    let (mask, image) = track::load_or_generate(cli.track.as_deref(), cli.seed, &mut sim_config)
        .context("failed to prepare track")?;
    let texture = Texture2D::from_image(&image);

    let (mut population, generation) = match &cli.resume {
        Some(path) => {
            let checkpoint = save_load::load_from_file(path)
                .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
            (checkpoint.population, checkpoint.generation)
        }
        None => (Population::random(cli.population, cli.seed), 0),
    };

    let mut evaluator = PopulationEvaluator::with_generation(sim_config, generation)
        .context("invalid simulation config")?;
    let mut history = FitnessHistory::new(200);
    let ticks_per_frame = cli.fast.max(1);

    loop {
        let nets = population.networks();
        let report = {
            let mut run = evaluator
                .begin(&mask, Population::policies(&nets))
                .context("track does not fit the simulation config")?;
            loop {
                if is_key_pressed(KeyCode::Escape) {
                    run.abort();
                }
                for _ in 0..ticks_per_frame {
                    if run.step().is_some() {
                        break;
                    }
                }

                renderer::draw(&run.frame(), &texture, &history);
                next_frame().await;

                if run.is_finished() {
                    break run.finish();
                }
            }
        };

        history.record(&report);
        info!(
            generation = report.generation,
            ticks = report.ticks,
            best = report.best().map(|(_, f)| f).unwrap_or(0.0),
            "generation complete"
        );

        if report.finish == FinishReason::Aborted {
            return Ok(());
        }
        population.evolve(&report);
    }
}
